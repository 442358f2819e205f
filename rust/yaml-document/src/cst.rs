// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Concrete syntax tree.
//!
//! The CST keeps every source byte, so [`source`] of all top-level tokens
//! concatenated reproduces the parsed text exactly.

use crate::lexer::TokenKind;

/// A leaf token with the indentation of the line it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceToken {
    pub kind: TokenKind,
    pub offset: usize,
    pub indent: usize,
    pub source: String,
}

impl SourceToken {
    #[must_use]
    pub fn new(kind: TokenKind, offset: usize, indent: usize, source: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            indent,
            source: source.into(),
        }
    }

    #[must_use]
    pub const fn end_offset(&self) -> usize {
        self.offset + self.source.len()
    }
}

/// A parse error placed inline in the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorToken {
    pub offset: usize,
    pub source: String,
    pub message: String,
}

/// Plain, quoted or alias scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowScalar {
    /// One of `Scalar`, `SingleQuotedScalar`, `DoubleQuotedScalar`, `Alias`.
    pub kind: TokenKind,
    pub offset: usize,
    pub indent: usize,
    pub source: String,
    /// Trailing spaces, comments and line breaks that belong to the scalar.
    pub end: Vec<SourceToken>,
}

/// Block scalar with its header properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockScalar {
    pub offset: usize,
    pub indent: usize,
    /// Header indicator and everything up to and including its line break.
    pub props: Vec<SourceToken>,
    pub source: String,
}

/// An entry of a collection: a map pair or a sequence item.
///
/// `start` holds leading properties and indicators, `sep` everything between
/// key and value, including the `:` indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CstItem {
    pub start: Vec<SourceToken>,
    pub explicit_key: bool,
    pub key: Option<Box<CstToken>>,
    pub sep: Option<Vec<SourceToken>>,
    pub value: Option<Box<CstToken>>,
}

impl CstItem {
    #[must_use]
    pub fn with_start(start: Vec<SourceToken>) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMap {
    pub offset: usize,
    pub indent: usize,
    pub items: Vec<CstItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSeq {
    pub offset: usize,
    pub indent: usize,
    pub items: Vec<CstItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowCollection {
    pub offset: usize,
    pub indent: usize,
    /// The opening `{` or `[`.
    pub start: SourceToken,
    pub items: Vec<CstItem>,
    /// The closing bracket and anything trailing it on the same line.
    pub end: Vec<SourceToken>,
}

impl FlowCollection {
    #[must_use]
    pub fn is_map(&self) -> bool {
        self.start.kind == TokenKind::FlowMapStart
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstDocument {
    pub offset: usize,
    /// `---`, directives-end properties and comments before the content.
    pub start: Vec<SourceToken>,
    pub value: Option<Box<CstToken>>,
    /// Tokens after the content, e.g. trailing comments.
    pub end: Vec<SourceToken>,
}

/// `...` with trailing tokens on its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEnd {
    pub offset: usize,
    pub source: String,
    pub end: Vec<SourceToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CstToken {
    Directive(SourceToken),
    /// Stream-level byte order mark, space, comment or line break.
    Source(SourceToken),
    Error(ErrorToken),
    Document(CstDocument),
    DocEnd(DocumentEnd),
    Scalar(FlowScalar),
    BlockScalar(BlockScalar),
    BlockMap(BlockMap),
    BlockSeq(BlockSeq),
    FlowCollection(FlowCollection),
}

impl CstToken {
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Directive(t) | Self::Source(t) => t.offset,
            Self::Error(e) => e.offset,
            Self::Document(d) => d.offset,
            Self::DocEnd(d) => d.offset,
            Self::Scalar(s) => s.offset,
            Self::BlockScalar(s) => s.offset,
            Self::BlockMap(m) => m.offset,
            Self::BlockSeq(s) => s.offset,
            Self::FlowCollection(c) => c.offset,
        }
    }

    /// Offset just past the last source byte of this token.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.offset() + source(self).len()
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::BlockMap(_) | Self::BlockSeq(_) | Self::FlowCollection(_)
        )
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::BlockScalar(_))
    }

    /// Indentation of nodes that carry one.
    #[must_use]
    pub const fn indent(&self) -> Option<usize> {
        match self {
            Self::Scalar(s) => Some(s.indent),
            Self::BlockScalar(s) => Some(s.indent),
            Self::BlockMap(m) => Some(m.indent),
            Self::BlockSeq(s) => Some(s.indent),
            Self::FlowCollection(c) => Some(c.indent),
            _ => None,
        }
    }
}

/// Pending output while walking a token tree.
enum Part<'a> {
    Token(&'a CstToken),
    Item(&'a CstItem),
    Tokens(&'a [SourceToken]),
    Text(&'a str),
}

fn push_token(out: &mut String, token: &CstToken) {
    // explicit stack, as nesting depth is bounded only by the input
    let mut stack = vec![Part::Token(token)];
    while let Some(part) = stack.pop() {
        match part {
            Part::Text(text) => out.push_str(text),
            Part::Tokens(tokens) => tokens.iter().for_each(|t| out.push_str(&t.source)),
            Part::Item(item) => {
                if let Some(value) = &item.value {
                    stack.push(Part::Token(value));
                }
                if let Some(sep) = &item.sep {
                    stack.push(Part::Tokens(sep));
                }
                if let Some(key) = &item.key {
                    stack.push(Part::Token(key));
                }
                stack.push(Part::Tokens(&item.start));
            }
            Part::Token(token) => match token {
                CstToken::Directive(t) | CstToken::Source(t) => out.push_str(&t.source),
                CstToken::Error(e) => out.push_str(&e.source),
                CstToken::Document(doc) => {
                    stack.push(Part::Tokens(&doc.end));
                    if let Some(value) = &doc.value {
                        stack.push(Part::Token(value));
                    }
                    stack.push(Part::Tokens(&doc.start));
                }
                CstToken::DocEnd(end) => {
                    out.push_str(&end.source);
                    stack.push(Part::Tokens(&end.end));
                }
                CstToken::Scalar(s) => {
                    out.push_str(&s.source);
                    stack.push(Part::Tokens(&s.end));
                }
                CstToken::BlockScalar(s) => {
                    stack.push(Part::Text(&s.source));
                    stack.push(Part::Tokens(&s.props));
                }
                CstToken::BlockMap(BlockMap { items, .. }) | CstToken::BlockSeq(BlockSeq { items, .. }) => {
                    stack.extend(items.iter().rev().map(Part::Item));
                }
                CstToken::FlowCollection(fc) => {
                    out.push_str(&fc.start.source);
                    stack.push(Part::Tokens(&fc.end));
                    stack.extend(fc.items.iter().rev().map(Part::Item));
                }
            },
        }
    }
}

/// Reconstruct the source text of a token and all of its children.
#[must_use]
pub fn source(token: &CstToken) -> String {
    let mut out = String::new();
    push_token(&mut out, token);
    out
}

impl std::fmt::Display for CstToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&source(self))
    }
}

/// Whether any token in `tokens` has the given kind.
#[must_use]
pub fn includes_kind(tokens: &[SourceToken], kind: TokenKind) -> bool {
    tokens.iter().any(|t| t.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, offset: usize, source: &str) -> SourceToken {
        SourceToken::new(kind, offset, 0, source)
    }

    #[test]
    fn test_source_of_block_map() {
        let map = CstToken::BlockMap(BlockMap {
            offset: 0,
            indent: 0,
            items: vec![CstItem {
                start: vec![],
                explicit_key: false,
                key: Some(Box::new(CstToken::Scalar(FlowScalar {
                    kind: TokenKind::Scalar,
                    offset: 0,
                    indent: 0,
                    source: "a".into(),
                    end: vec![],
                }))),
                sep: Some(vec![
                    tok(TokenKind::MapValueInd, 1, ":"),
                    tok(TokenKind::Space, 2, " "),
                ]),
                value: Some(Box::new(CstToken::Scalar(FlowScalar {
                    kind: TokenKind::Scalar,
                    offset: 3,
                    indent: 0,
                    source: "b".into(),
                    end: vec![tok(TokenKind::Newline, 4, "\n")],
                }))),
            }],
        });
        assert_eq!(source(&map), "a: b\n");
        assert_eq!(map.end_offset(), 5);
        assert!(map.is_collection());
        assert!(!map.is_scalar());
    }

    #[test]
    fn test_source_of_deep_nesting() {
        let depth = 20_000;
        let mut token = CstToken::Scalar(FlowScalar {
            kind: TokenKind::Scalar,
            offset: depth,
            indent: 0,
            source: "x".into(),
            end: vec![],
        });
        for level in (0..depth).rev() {
            token = CstToken::FlowCollection(FlowCollection {
                offset: level,
                indent: 0,
                start: tok(TokenKind::FlowSeqStart, level, "["),
                items: vec![CstItem {
                    value: Some(Box::new(token)),
                    ..CstItem::default()
                }],
                end: vec![tok(TokenKind::FlowSeqEnd, 2 * depth - level, "]")],
            });
        }
        let expected = format!("{}x{}", "[".repeat(depth), "]".repeat(depth));
        assert_eq!(source(&token), expected);
        // the recursive drop of a tree this deep would overflow the test thread
        std::mem::forget(token);
    }

    #[test]
    fn test_includes_kind() {
        let tokens = [tok(TokenKind::Space, 0, " "), tok(TokenKind::Comment, 1, "# c")];
        assert!(includes_kind(&tokens, TokenKind::Comment));
        assert!(!includes_kind(&tokens, TokenKind::Anchor));
    }
}
