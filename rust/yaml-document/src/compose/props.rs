// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Node properties and trailing tokens.

use super::Diagnostics;
use crate::cst::{CstToken, SourceToken};
use crate::error::ErrorCode;
use crate::lexer::TokenKind;
use crate::span::span;

/// Whatever follows a run of property tokens.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Next<'t> {
    Node(&'t CstToken),
    Token(&'t SourceToken),
}

impl<'t> Next<'t> {
    pub fn from_node(node: Option<&'t CstToken>) -> Option<Self> {
        node.map(Self::Node)
    }

    /// The key if present, else the first separator token.
    pub fn key_or_sep(key: Option<&'t CstToken>, sep: Option<&'t [SourceToken]>) -> Option<Self> {
        key.map(Self::Node)
            .or_else(|| sep.and_then(<[SourceToken]>::first).map(Self::Token))
    }

    fn offset(self) -> usize {
        match self {
            Self::Node(node) => node.offset(),
            Self::Token(token) => token.offset,
        }
    }

    fn separates(self) -> bool {
        match self {
            Self::Token(token) => matches!(
                token.kind,
                TokenKind::Space | TokenKind::Newline | TokenKind::Comma
            ),
            Self::Node(CstToken::Scalar(scalar)) => {
                scalar.kind == TokenKind::Scalar && scalar.source.is_empty()
            }
            Self::Node(_) => false,
        }
    }

    fn is_block_collection(self) -> bool {
        matches!(self, Self::Node(CstToken::BlockMap(_) | CstToken::BlockSeq(_)))
    }

    fn is_flow_collection(self) -> bool {
        matches!(self, Self::Node(CstToken::FlowCollection(_)))
    }
}

pub(crate) struct PropsContext<'t> {
    /// Name of the enclosing flow collection, for messages.
    pub flow: Option<&'static str>,
    pub indicator: TokenKind,
    pub next: Option<Next<'t>>,
    pub offset: usize,
    pub parent_indent: usize,
    pub start_on_newline: bool,
}

/// Anchor, tag, comments and indicator found before a node.
#[derive(Debug, Clone, Default)]
pub(crate) struct Props<'t> {
    pub comma: Option<&'t SourceToken>,
    pub found: Option<&'t SourceToken>,
    pub space_before: bool,
    pub comment: String,
    pub has_newline: bool,
    pub anchor: Option<&'t SourceToken>,
    pub tag: Option<&'t SourceToken>,
    pub newline_after_prop: Option<&'t SourceToken>,
    pub end: usize,
    pub start: usize,
}

fn token_span(token: &SourceToken) -> crate::span::Span {
    span(token.offset, token.end_offset())
}

const COMMENT_SPACE_MSG: &str =
    "Comments must be separated from other tokens by white space characters";
const PROP_SPACE_MSG: &str = "Tags and anchors must be separated from the next token by white space";

#[allow(clippy::too_many_lines, reason = "one arm per property token kind")]
pub(crate) fn resolve_props<'t>(
    tokens: &'t [SourceToken],
    ctx: &PropsContext<'t>,
    diag: &mut Diagnostics,
) -> Props<'t> {
    let mut props = Props::default();
    let mut at_newline = ctx.start_on_newline;
    let mut has_space = ctx.start_on_newline;
    let mut comment_sep = String::new();
    let mut req_space = false;
    let mut tab: Option<&SourceToken> = None;
    let mut start = None;

    for token in tokens {
        if req_space {
            if !matches!(
                token.kind,
                TokenKind::Space | TokenKind::Newline | TokenKind::Comma
            ) {
                diag.error(
                    span(token.offset, token.offset + 1),
                    ErrorCode::MissingChar,
                    PROP_SPACE_MSG,
                );
            }
            req_space = false;
        }
        if let Some(tab_token) = tab.take()
            && at_newline
            && !matches!(token.kind, TokenKind::Comment | TokenKind::Newline)
        {
            diag.error(
                token_span(tab_token),
                ErrorCode::TabAsIndent,
                "Tabs are not allowed as indentation",
            );
        }
        match token.kind {
            TokenKind::Space => {
                // document-level flow collections may be preceded by tabs
                let doc_flow = ctx.indicator == TokenKind::DocStart
                    && ctx.next.is_some_and(Next::is_flow_collection);
                if ctx.flow.is_none() && !doc_flow && token.source.contains('\t') {
                    tab = Some(token);
                }
                has_space = true;
            }
            TokenKind::Comment => {
                if !has_space {
                    diag.error(token_span(token), ErrorCode::MissingChar, COMMENT_SPACE_MSG);
                }
                let body = token.source.get(1..).filter(|b| !b.is_empty()).unwrap_or(" ");
                if !props.comment.is_empty() {
                    props.comment.push_str(&comment_sep);
                }
                props.comment.push_str(body);
                comment_sep.clear();
                at_newline = false;
            }
            TokenKind::Newline => {
                if at_newline {
                    if !props.comment.is_empty() {
                        props.comment.push_str(&token.source);
                    } else if props.found.is_none() || ctx.indicator != TokenKind::SeqItemInd {
                        props.space_before = true;
                    }
                } else {
                    comment_sep.push_str(&token.source);
                }
                at_newline = true;
                props.has_newline = true;
                if props.anchor.is_some() || props.tag.is_some() {
                    props.newline_after_prop = Some(token);
                }
                has_space = true;
            }
            TokenKind::Anchor => {
                if props.anchor.is_some() {
                    diag.error(
                        token_span(token),
                        ErrorCode::MultipleAnchors,
                        "A node can have at most one anchor",
                    );
                }
                if token.source.ends_with(':') {
                    let at = token.end_offset() - 1;
                    diag.warning(
                        span(at, at + 1),
                        ErrorCode::BadAlias,
                        "Anchor ending in : is ambiguous",
                    );
                }
                props.anchor = Some(token);
                start.get_or_insert(token.offset);
                at_newline = false;
                has_space = false;
                req_space = true;
            }
            TokenKind::Tag => {
                if props.tag.is_some() {
                    diag.error(
                        token_span(token),
                        ErrorCode::MultipleTags,
                        "A node can have at most one tag",
                    );
                }
                props.tag = Some(token);
                start.get_or_insert(token.offset);
                at_newline = false;
                has_space = false;
                req_space = true;
            }
            kind if kind == ctx.indicator => {
                if props.anchor.is_some() || props.tag.is_some() {
                    diag.error(
                        token_span(token),
                        ErrorCode::BadPropOrder,
                        format!("Anchors and tags must be after the {} indicator", token.source),
                    );
                }
                if props.found.is_some() {
                    diag.error(
                        token_span(token),
                        ErrorCode::UnexpectedToken,
                        format!(
                            "Unexpected {} in {}",
                            token.source,
                            ctx.flow.unwrap_or("collection")
                        ),
                    );
                }
                props.found = Some(token);
                at_newline = matches!(
                    ctx.indicator,
                    TokenKind::SeqItemInd | TokenKind::ExplicitKeyInd
                );
                has_space = false;
            }
            TokenKind::Comma if ctx.flow.is_some() => {
                if props.comma.is_some() {
                    diag.error(
                        token_span(token),
                        ErrorCode::UnexpectedToken,
                        format!("Unexpected , in {}", ctx.flow.unwrap_or_default()),
                    );
                }
                props.comma = Some(token);
                at_newline = false;
                has_space = false;
            }
            kind => {
                diag.error(
                    token_span(token),
                    ErrorCode::UnexpectedToken,
                    format!("Unexpected {kind} token"),
                );
                at_newline = false;
                has_space = false;
            }
        }
    }

    props.end = tokens.last().map_or(ctx.offset, SourceToken::end_offset);
    if req_space && let Some(next) = ctx.next && !next.separates() {
        let at = next.offset();
        diag.error(span(at, at + 1), ErrorCode::MissingChar, PROP_SPACE_MSG);
    }
    if let Some(tab) = tab
        && ((at_newline && tab.indent <= ctx.parent_indent)
            || ctx.next.is_some_and(Next::is_block_collection))
    {
        diag.error(
            token_span(tab),
            ErrorCode::TabAsIndent,
            "Tabs are not allowed as indentation",
        );
    }
    props.start = start.unwrap_or(props.end);
    props
}

/// Collect the comment trailing a node and return it with the offset past
/// the last token.
pub(crate) fn resolve_end(
    end: &[SourceToken],
    mut offset: usize,
    req_space: bool,
    diag: &mut Diagnostics,
) -> (String, usize) {
    let mut comment = String::new();
    let mut has_space = false;
    let mut sep = String::new();
    for token in end {
        match token.kind {
            TokenKind::Space => has_space = true,
            TokenKind::Comment => {
                if req_space && !has_space {
                    diag.error(token_span(token), ErrorCode::MissingChar, COMMENT_SPACE_MSG);
                }
                let body = token.source.get(1..).filter(|b| !b.is_empty()).unwrap_or(" ");
                if !comment.is_empty() {
                    comment.push_str(&sep);
                }
                comment.push_str(body);
                sep.clear();
            }
            TokenKind::Newline => {
                if !comment.is_empty() {
                    sep.push_str(&token.source);
                }
                has_space = true;
            }
            kind => diag.error(
                token_span(token),
                ErrorCode::UnexpectedToken,
                format!("Unexpected {kind} at node end"),
            ),
        }
        offset += token.source.len();
    }
    (comment, offset)
}

/// Whether an implicit key spans more than one line.
pub(crate) fn contains_newline(key: Option<&CstToken>) -> bool {
    let has_newline = |tokens: &[SourceToken]| tokens.iter().any(|t| t.kind == TokenKind::Newline);
    let mut pending: Vec<&CstToken> = key.into_iter().collect();
    while let Some(token) = pending.pop() {
        match token {
            CstToken::Scalar(scalar) => {
                if scalar.source.contains('\n') || has_newline(&scalar.end) {
                    return true;
                }
            }
            CstToken::FlowCollection(fc) => {
                for item in &fc.items {
                    if has_newline(&item.start) || item.sep.as_deref().is_some_and(has_newline) {
                        return true;
                    }
                    pending.extend(item.key.as_deref());
                    pending.extend(item.value.as_deref());
                }
            }
            _ => return true,
        }
    }
    false
}

/// Place an empty scalar after the last significant token in `before`,
/// skipping any trailing spaces.
pub(crate) fn empty_scalar_position(mut offset: usize, before: &[SourceToken]) -> usize {
    for i in (0..before.len()).rev() {
        match before[i].kind {
            TokenKind::Space | TokenKind::Comment | TokenKind::Newline => {
                offset = offset.saturating_sub(before[i].source.len());
            }
            _ => {
                for token in before[i + 1..]
                    .iter()
                    .take_while(|t| t.kind == TokenKind::Space)
                {
                    offset += token.source.len();
                }
                break;
            }
        }
    }
    offset
}
