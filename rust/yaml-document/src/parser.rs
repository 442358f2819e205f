// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Push-down parser producing [`CstToken`]s.
//!
//! Nodes under construction live on an explicit stack. Each lexical token is
//! dispatched to the handler for the node on top of the stack, which either
//! absorbs it, pushes a new child, or pops itself into its parent and
//! re-dispatches the token there. Only completed top-level tokens (documents,
//! directives, stream-level comments) are emitted.

use std::collections::VecDeque;

use crate::cst::{
    BlockMap, BlockScalar, BlockSeq, CstDocument, CstItem, CstToken, DocumentEnd, ErrorToken,
    FlowCollection, FlowScalar, SourceToken, includes_kind,
};
use crate::lexer::{Lexer, OwnedToken, TokenKind, Tokens, tokenize};
use crate::span::LineCounter;

/// Index of the first token that is not space, comment or line break.
fn find_non_empty_index(list: &[SourceToken]) -> Option<usize> {
    list.iter().position(|t| {
        !matches!(
            t.kind,
            TokenKind::Space | TokenKind::Comment | TokenKind::Newline
        )
    })
}

fn is_flow_token(token: Option<&CstToken>) -> bool {
    matches!(
        token,
        Some(CstToken::Scalar(_) | CstToken::FlowCollection(_))
    )
}

/// Property tokens preceding the current position in `parent`.
fn get_prev_props(parent: &mut CstToken) -> Option<&mut Vec<SourceToken>> {
    match parent {
        CstToken::Document(doc) => Some(&mut doc.start),
        CstToken::BlockMap(map) => map.items.last_mut().map(|it| match &mut it.sep {
            Some(sep) => sep,
            None => &mut it.start,
        }),
        CstToken::BlockSeq(seq) => seq.items.last_mut().map(|it| &mut it.start),
        _ => None,
    }
}

/// Split off the trailing run of `prev` that belongs to a new implicit key:
/// everything after the last indicator or line break, minus leading spaces.
fn get_first_key_start_props(prev: &mut Vec<SourceToken>) -> Vec<SourceToken> {
    let mut i = prev
        .iter()
        .rposition(|t| {
            matches!(
                t.kind,
                TokenKind::DocStart
                    | TokenKind::ExplicitKeyInd
                    | TokenKind::MapValueInd
                    | TokenKind::SeqItemInd
                    | TokenKind::Newline
            )
        })
        .map_or(0, |p| p + 1);
    while prev.get(i).is_some_and(|t| t.kind == TokenKind::Space) {
        i += 1;
    }
    prev.split_off(i.min(prev.len()))
}

/// In a flow sequence, `[ a b ]`-style items parsed as keys without a `:`
/// are turned back into plain values.
fn fix_flow_seq_items(fc: &mut FlowCollection) {
    if fc.start.kind != TokenKind::FlowSeqStart {
        return;
    }
    for it in &mut fc.items {
        let convert = it.value.is_none()
            && !includes_kind(&it.start, TokenKind::ExplicitKeyInd)
            && it
                .sep
                .as_ref()
                .is_some_and(|sep| !includes_kind(sep, TokenKind::MapValueInd));
        if !convert {
            continue;
        }
        let sep = it.sep.take().unwrap_or_default();
        it.value = it.key.take();
        match it.value.as_deref_mut() {
            Some(CstToken::Scalar(fs)) => fs.end.extend(sep),
            Some(CstToken::FlowCollection(inner)) => inner.end.extend(sep),
            _ => it.start.extend(sep),
        }
    }
}

/// The trailing token list of nodes that have one.
fn end_tokens_mut(token: &mut CstToken) -> Option<&mut Vec<SourceToken>> {
    match token {
        CstToken::Document(doc) => Some(&mut doc.end),
        CstToken::DocEnd(end) => Some(&mut end.end),
        CstToken::Scalar(fs) => Some(&mut fs.end),
        CstToken::FlowCollection(fc) => Some(&mut fc.end),
        _ => None,
    }
}

/// The trailing token list of `value` when it ends with a comment.
fn comment_end(value: Option<&mut CstToken>) -> Option<&mut Vec<SourceToken>> {
    value
        .and_then(end_tokens_mut)
        .filter(|end| end.last().is_some_and(|t| t.kind == TokenKind::Comment))
}

/// Remove a trailing item of a block collection that holds only blank lines
/// and comments at or left of the collection, returning its start tokens.
fn take_trailing_start(token: &mut CstToken) -> Option<Vec<SourceToken>> {
    let (items, indent) = match token {
        CstToken::BlockMap(map) => (&mut map.items, map.indent),
        CstToken::BlockSeq(seq) => (&mut seq.items, seq.indent),
        _ => return None,
    };
    let last = items.last()?;
    let movable = last.sep.is_none()
        && last.value.is_none()
        && last.key.is_none()
        && !last.start.is_empty()
        && find_non_empty_index(&last.start).is_none()
        && (indent == 0
            || last
                .start
                .iter()
                .all(|st| st.kind != TokenKind::Comment || st.indent < indent));
    if movable {
        items.pop().map(|it| it.start)
    } else {
        None
    }
}

/// CST parser state.
#[derive(Debug, Clone)]
pub struct Parser {
    stack: Vec<CstToken>,
    lexer: Lexer,
    kind: TokenKind,
    source: String,
    at_new_line: bool,
    on_key_line: bool,
    indent: usize,
    offset: usize,
    /// Offsets of every line start seen so far.
    pub line_counter: LineCounter,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            lexer: Lexer::new(),
            kind: TokenKind::DocMode,
            source: String::new(),
            at_new_line: true,
            on_key_line: false,
            indent: 0,
            offset: 0,
            line_counter: LineCounter::new(),
        }
    }

    /// Current stream offset.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Parse `src`, lazily yielding completed top-level tokens.
    ///
    /// With `incomplete` set, the input may continue in a later call and
    /// nodes that are still open stay on the stack.
    pub fn parse<'a>(&'a mut self, src: &'a str, incomplete: bool) -> CstTokens<'a> {
        let tokens = if !incomplete && self.offset == 0 && self.lexer.is_fresh() {
            TokenSource::Borrowed(tokenize(src))
        } else {
            TokenSource::Owned(self.lexer.lex(src, incomplete).into_iter())
        };
        log::debug!("parsing {} bytes at offset {}", src.len(), self.offset);
        CstTokens {
            parser: self,
            tokens,
            queue: VecDeque::new(),
            finish: !incomplete,
            done: false,
        }
    }

    /// Feed one lexical token.
    pub fn next(&mut self, kind: TokenKind, source: &str, out: &mut VecDeque<CstToken>) {
        source.clone_into(&mut self.source);
        self.kind = kind;
        let len = source.len();
        match kind {
            TokenKind::Scalar | TokenKind::BlockScalar => {
                self.at_new_line = false;
                self.step(out);
                self.offset += len;
            }
            TokenKind::Error => {
                let error = CstToken::Error(ErrorToken {
                    offset: self.offset,
                    source: source.to_owned(),
                    message: format!("Not a YAML token: {source}"),
                });
                self.pop_token(error, out);
                self.offset += len;
            }
            _ => {
                self.step(out);
                match kind {
                    TokenKind::Newline => {
                        self.at_new_line = true;
                        self.indent = 0;
                        self.line_counter.add_newline(self.offset + len);
                    }
                    TokenKind::Space => {
                        if self.at_new_line && source.starts_with(' ') {
                            self.indent += len;
                        }
                    }
                    TokenKind::ExplicitKeyInd | TokenKind::MapValueInd | TokenKind::SeqItemInd => {
                        if self.at_new_line {
                            self.indent += len;
                        }
                    }
                    TokenKind::DocMode | TokenKind::FlowErrorEnd => return,
                    _ => self.at_new_line = false,
                }
                self.offset += len;
            }
        }
    }

    /// Flush every open node.
    pub fn end(&mut self, out: &mut VecDeque<CstToken>) {
        while let Some(token) = self.stack.pop() {
            self.pop_token(token, out);
        }
    }

    fn source_token(&self) -> SourceToken {
        SourceToken::new(self.kind, self.offset, self.indent, self.source.clone())
    }

    fn error_token(&self, message: impl Into<String>) -> CstToken {
        CstToken::Error(ErrorToken {
            offset: self.offset,
            source: self.source.clone(),
            message: message.into(),
        })
    }

    fn step(&mut self, out: &mut VecDeque<CstToken>) {
        if self.kind == TokenKind::DocEnd && !matches!(self.stack.last(), Some(CstToken::DocEnd(_)))
        {
            self.end(out);
            self.stack.push(CstToken::DocEnd(DocumentEnd {
                offset: self.offset,
                source: self.source.clone(),
                end: Vec::new(),
            }));
            return;
        }
        let Some(top) = self.stack.pop() else {
            return self.stream(out);
        };
        match top {
            CstToken::Document(doc) => self.document(doc, out),
            CstToken::Scalar(fs) => self.scalar(fs, out),
            CstToken::BlockScalar(bs) => self.block_scalar(bs, out),
            CstToken::BlockMap(map) => self.block_map(map, out),
            CstToken::BlockSeq(seq) => self.block_sequence(seq, out),
            CstToken::FlowCollection(fc) => self.flow_collection(fc, out),
            CstToken::DocEnd(end) => self.document_end(end, out),
            other => self.pop_token(other, out),
        }
    }

    /// Attach a completed `token` to the node on top of the stack, or emit it
    /// when the stack is empty.
    fn pop_token(&mut self, mut token: CstToken, out: &mut VecDeque<CstToken>) {
        let Some(top) = self.stack.last_mut() else {
            log::trace!("emit {} at {}", token_name(&token), token.offset());
            out.push_back(token);
            return;
        };
        log::trace!("pop {} into {}", token_name(&token), token_name(top));
        match &mut token {
            // block scalars use their parent's indent rather than the header's
            CstToken::BlockScalar(bs) => bs.indent = top.indent().unwrap_or(0),
            CstToken::FlowCollection(fc) => {
                if matches!(top, CstToken::Document(_)) {
                    fc.indent = 0;
                }
                fix_flow_seq_items(fc);
            }
            _ => {}
        }
        let mut key_line = None;
        match top {
            CstToken::Document(doc) => {
                let trailing = take_trailing_start(&mut token);
                doc.value = Some(Box::new(token));
                if let Some(start) = trailing {
                    doc.end = start;
                }
            }
            CstToken::BlockScalar(bs) => {
                // should not happen; keep the bytes
                bs.props.push(SourceToken::new(
                    TokenKind::Error,
                    token.offset(),
                    0,
                    crate::cst::source(&token),
                ));
            }
            CstToken::BlockMap(map) => match map.items.last_mut() {
                Some(it) if it.value.is_none() && it.sep.is_some() => {
                    let trailing = take_trailing_start(&mut token);
                    it.value = Some(Box::new(token));
                    if let Some(start) = trailing {
                        map.items.push(CstItem::with_start(start));
                    }
                }
                Some(it) if it.value.is_none() => {
                    it.key = Some(Box::new(token));
                    it.sep = Some(Vec::new());
                    key_line = Some(!it.explicit_key);
                }
                _ => {
                    map.items.push(CstItem {
                        key: Some(Box::new(token)),
                        sep: Some(Vec::new()),
                        ..CstItem::default()
                    });
                    key_line = Some(true);
                }
            },
            CstToken::BlockSeq(seq) => {
                let trailing = take_trailing_start(&mut token);
                match seq.items.last_mut() {
                    Some(it) if it.value.is_none() => it.value = Some(Box::new(token)),
                    _ => seq.items.push(CstItem {
                        value: Some(Box::new(token)),
                        ..CstItem::default()
                    }),
                }
                if let Some(start) = trailing {
                    seq.items.push(CstItem::with_start(start));
                }
            }
            CstToken::FlowCollection(fc) => match fc.items.last_mut() {
                Some(it) if it.value.is_none() && it.sep.is_some() => {
                    it.value = Some(Box::new(token));
                }
                Some(it) if it.value.is_none() => {
                    it.key = Some(Box::new(token));
                    it.sep = Some(Vec::new());
                }
                _ => fc.items.push(CstItem {
                    key: Some(Box::new(token)),
                    sep: Some(Vec::new()),
                    ..CstItem::default()
                }),
            },
            _ => {
                // the parent cannot hold children; close it first
                if let Some(parent) = self.stack.pop() {
                    self.pop_token(parent, out);
                }
                self.pop_token(token, out);
            }
        }
        if let Some(on_key_line) = key_line {
            self.on_key_line = on_key_line;
        }
    }

    fn stream(&mut self, out: &mut VecDeque<CstToken>) {
        match self.kind {
            TokenKind::DirectiveLine => out.push_back(CstToken::Directive(self.source_token())),
            TokenKind::ByteOrderMark
            | TokenKind::Space
            | TokenKind::Comment
            | TokenKind::Newline => out.push_back(CstToken::Source(self.source_token())),
            TokenKind::DocMode | TokenKind::DocStart => {
                let mut doc = CstDocument {
                    offset: self.offset,
                    start: Vec::new(),
                    value: None,
                    end: Vec::new(),
                };
                if self.kind == TokenKind::DocStart {
                    doc.start.push(self.source_token());
                }
                log::trace!("push document at {}", self.offset);
                self.stack.push(CstToken::Document(doc));
            }
            kind => {
                out.push_back(self.error_token(format!("Unexpected {kind} token in YAML stream")));
            }
        }
    }

    fn document(&mut self, mut doc: CstDocument, out: &mut VecDeque<CstToken>) {
        if doc.value.is_some() {
            return self.line_end(CstToken::Document(doc), out);
        }
        match self.kind {
            TokenKind::DocStart => {
                if find_non_empty_index(&doc.start).is_some() {
                    self.pop_token(CstToken::Document(doc), out);
                    self.step(out);
                } else {
                    doc.start.push(self.source_token());
                    self.stack.push(CstToken::Document(doc));
                }
                return;
            }
            TokenKind::Anchor
            | TokenKind::Tag
            | TokenKind::Space
            | TokenKind::Comment
            | TokenKind::Newline => {
                doc.start.push(self.source_token());
                self.stack.push(CstToken::Document(doc));
                return;
            }
            _ => {}
        }
        let value = self.start_block_value(&mut doc.start);
        self.stack.push(CstToken::Document(doc));
        match value {
            Some(bv) => self.push_node(bv),
            None => {
                let kind = self.kind;
                out.push_back(self.error_token(format!("Unexpected {kind} token in YAML document")));
            }
        }
    }

    fn push_node(&mut self, token: CstToken) {
        log::trace!("push {} at {}", token_name(&token), token.offset());
        self.stack.push(token);
    }

    fn scalar(&mut self, mut scalar: FlowScalar, out: &mut VecDeque<CstToken>) {
        if self.kind == TokenKind::MapValueInd {
            let start = self
                .stack
                .last_mut()
                .and_then(get_prev_props)
                .map(get_first_key_start_props)
                .unwrap_or_default();
            let mut sep = std::mem::take(&mut scalar.end);
            sep.push(self.source_token());
            let map = BlockMap {
                offset: scalar.offset,
                indent: scalar.indent,
                items: vec![CstItem {
                    start,
                    key: Some(Box::new(CstToken::Scalar(scalar))),
                    sep: Some(sep),
                    ..CstItem::default()
                }],
            };
            self.on_key_line = true;
            self.push_node(CstToken::BlockMap(map));
        } else {
            self.line_end(CstToken::Scalar(scalar), out);
        }
    }

    fn block_scalar(&mut self, mut scalar: BlockScalar, out: &mut VecDeque<CstToken>) {
        match self.kind {
            TokenKind::Space | TokenKind::Comment | TokenKind::Newline => {
                scalar.props.push(self.source_token());
                self.stack.push(CstToken::BlockScalar(scalar));
            }
            TokenKind::BlockScalar => {
                scalar.source.clone_from(&self.source);
                // the body includes its trailing line break
                self.at_new_line = true;
                self.indent = 0;
                self.record_newlines();
                self.pop_token(CstToken::BlockScalar(scalar), out);
            }
            _ => {
                self.pop_token(CstToken::BlockScalar(scalar), out);
                self.step(out);
            }
        }
    }

    fn record_newlines(&mut self) {
        for (idx, _) in self.source.match_indices('\n') {
            self.line_counter.add_newline(self.offset + idx + 1);
        }
    }

    fn at_indented_comment(&self, start: &[SourceToken], indent: usize) -> bool {
        self.kind == TokenKind::Comment
            && self.indent > indent
            && start
                .iter()
                .all(|st| matches!(st.kind, TokenKind::Newline | TokenKind::Space))
    }

    /// Move an indented comment after an item's value onto that value.
    fn absorb_indented_comment(&self, items: &mut Vec<CstItem>, indent: usize) -> bool {
        let n = items.len();
        let Some(last) = items.last() else {
            return false;
        };
        let prev_has_end = n >= 2
            && matches!(
                items[n - 2].value.as_deref(),
                Some(CstToken::Scalar(_) | CstToken::FlowCollection(_))
            );
        if !prev_has_end || !self.at_indented_comment(&last.start, indent) {
            return false;
        }
        let Some(last) = items.pop() else {
            return false;
        };
        match items
            .last_mut()
            .and_then(|prev| prev.value.as_deref_mut())
            .and_then(end_tokens_mut)
        {
            Some(end) => {
                end.extend(last.start);
                end.push(self.source_token());
                true
            }
            None => {
                items.push(last);
                false
            }
        }
    }

    #[allow(clippy::too_many_lines, reason = "one arm per token kind")]
    fn block_map(&mut self, mut map: BlockMap, out: &mut VecDeque<CstToken>) {
        if map.items.is_empty() {
            map.items.push(CstItem::default());
        }
        let map_indent = map.indent;
        match self.kind {
            TokenKind::Newline => {
                self.on_key_line = false;
                let st = self.source_token();
                if let Some(it) = map.items.last_mut() {
                    if let Some(end) = comment_end(it.value.as_deref_mut()) {
                        end.push(st);
                    } else if it.value.is_some() {
                        map.items.push(CstItem::with_start(vec![st]));
                    } else if let Some(sep) = &mut it.sep {
                        sep.push(st);
                    } else {
                        it.start.push(st);
                    }
                }
                self.stack.push(CstToken::BlockMap(map));
                return;
            }
            TokenKind::Space | TokenKind::Comment => {
                let st = self.source_token();
                let has_value = map.items.last().is_some_and(|it| it.value.is_some());
                if has_value {
                    map.items.push(CstItem::with_start(vec![st]));
                } else if let Some(sep) = map.items.last_mut().and_then(|it| it.sep.as_mut()) {
                    sep.push(st);
                } else if !self.absorb_indented_comment(&mut map.items, map_indent)
                    && let Some(it) = map.items.last_mut()
                {
                    it.start.push(st);
                }
                self.stack.push(CstToken::BlockMap(map));
                return;
            }
            _ => {}
        }

        if self.indent >= map_indent {
            let at_map_indent = !self.on_key_line && self.indent == map_indent;
            let st = self.source_token();
            let last = map.items.len() - 1;
            let it = &mut map.items[last];
            let at_next_item = at_map_indent
                && (it.sep.is_some() || it.explicit_key)
                && self.kind != TokenKind::SeqItemInd;

            // For empty values, blank-line separated tokens at the map's
            // indent belong to the following item
            let mut start = Vec::new();
            if at_next_item
                && it.value.is_none()
                && let Some(sep) = &mut it.sep
            {
                let mut nl = Vec::new();
                for (i, st) in sep.iter().enumerate() {
                    match st.kind {
                        TokenKind::Newline => nl.push(i),
                        TokenKind::Space => {}
                        TokenKind::Comment => {
                            if st.indent > map_indent {
                                nl.clear();
                            }
                        }
                        _ => nl.clear(),
                    }
                }
                if nl.len() >= 2 {
                    start = sep.split_off(nl[1]);
                }
            }

            match self.kind {
                TokenKind::Anchor | TokenKind::Tag => {
                    if at_next_item || it.value.is_some() {
                        start.push(st);
                        map.items.push(CstItem::with_start(start));
                        self.on_key_line = true;
                    } else if let Some(sep) = &mut it.sep {
                        sep.push(st);
                    } else {
                        it.start.push(st);
                    }
                    self.stack.push(CstToken::BlockMap(map));
                    return;
                }

                TokenKind::ExplicitKeyInd => {
                    self.on_key_line = true;
                    if it.sep.is_none() && !it.explicit_key {
                        it.start.push(st);
                        it.explicit_key = true;
                    } else if at_next_item || it.value.is_some() {
                        start.push(st);
                        map.items.push(CstItem {
                            start,
                            explicit_key: true,
                            ..CstItem::default()
                        });
                    } else {
                        let nested = BlockMap {
                            offset: self.offset,
                            indent: self.indent,
                            items: vec![CstItem {
                                start: vec![st],
                                explicit_key: true,
                                ..CstItem::default()
                            }],
                        };
                        self.stack.push(CstToken::BlockMap(map));
                        self.push_node(CstToken::BlockMap(nested));
                        return;
                    }
                    self.stack.push(CstToken::BlockMap(map));
                    return;
                }

                TokenKind::MapValueInd => {
                    self.on_key_line = true;
                    let mut nested = None;
                    if it.explicit_key {
                        if it.sep.is_none() {
                            if includes_kind(&it.start, TokenKind::Newline) {
                                it.key = None;
                                it.sep = Some(vec![st]);
                            } else {
                                let start = get_first_key_start_props(&mut it.start);
                                nested = Some(CstItem {
                                    start,
                                    sep: Some(vec![st]),
                                    ..CstItem::default()
                                });
                            }
                        } else if it.value.is_some() {
                            map.items.push(CstItem {
                                sep: Some(vec![st]),
                                ..CstItem::default()
                            });
                        } else if it
                            .sep
                            .as_ref()
                            .is_some_and(|sep| includes_kind(sep, TokenKind::MapValueInd))
                        {
                            nested = Some(CstItem {
                                start,
                                sep: Some(vec![st]),
                                ..CstItem::default()
                            });
                        } else if is_flow_token(it.key.as_deref())
                            && it
                                .sep
                                .as_ref()
                                .is_some_and(|sep| !includes_kind(sep, TokenKind::Newline))
                        {
                            let start = get_first_key_start_props(&mut it.start);
                            let key = it.key.take();
                            let mut sep = it.sep.take().unwrap_or_default();
                            sep.push(st);
                            nested = Some(CstItem {
                                start,
                                key,
                                sep: Some(sep),
                                ..CstItem::default()
                            });
                        } else if let Some(sep) = &mut it.sep {
                            // not actually at the next item
                            sep.append(&mut start);
                            sep.push(st);
                        }
                    } else if it.sep.is_none() {
                        it.key = None;
                        it.sep = Some(vec![st]);
                    } else if it.value.is_some() || at_next_item {
                        map.items.push(CstItem {
                            start,
                            sep: Some(vec![st]),
                            ..CstItem::default()
                        });
                    } else if it
                        .sep
                        .as_ref()
                        .is_some_and(|sep| includes_kind(sep, TokenKind::MapValueInd))
                    {
                        nested = Some(CstItem {
                            sep: Some(vec![st]),
                            ..CstItem::default()
                        });
                    } else if let Some(sep) = &mut it.sep {
                        sep.push(st);
                    }
                    self.stack.push(CstToken::BlockMap(map));
                    if let Some(item) = nested {
                        self.push_node(CstToken::BlockMap(BlockMap {
                            offset: self.offset,
                            indent: self.indent,
                            items: vec![item],
                        }));
                    }
                    return;
                }

                TokenKind::Alias
                | TokenKind::Scalar
                | TokenKind::SingleQuotedScalar
                | TokenKind::DoubleQuotedScalar => {
                    let fs = self.flow_scalar();
                    if at_next_item || it.value.is_some() {
                        map.items.push(CstItem {
                            start,
                            key: Some(Box::new(fs)),
                            sep: Some(Vec::new()),
                            ..CstItem::default()
                        });
                        self.on_key_line = true;
                    } else if it.sep.is_some() {
                        self.stack.push(CstToken::BlockMap(map));
                        self.push_node(fs);
                        return;
                    } else {
                        it.key = Some(Box::new(fs));
                        it.sep = Some(Vec::new());
                        self.on_key_line = true;
                    }
                    self.stack.push(CstToken::BlockMap(map));
                    return;
                }

                _ => {
                    let prev = match &mut it.sep {
                        Some(sep) => sep,
                        None => &mut it.start,
                    };
                    if let Some(bv) = self.start_block_value(prev) {
                        if matches!(bv, CstToken::BlockSeq(_)) {
                            if !it.explicit_key
                                && it
                                    .sep
                                    .as_ref()
                                    .is_some_and(|sep| !includes_kind(sep, TokenKind::Newline))
                            {
                                self.stack.push(CstToken::BlockMap(map));
                                let error =
                                    self.error_token("Unexpected block-seq-ind on same line with key");
                                self.pop_token(error, out);
                                return;
                            }
                        } else if at_map_indent {
                            map.items.push(CstItem::with_start(start));
                        }
                        self.stack.push(CstToken::BlockMap(map));
                        self.push_node(bv);
                        return;
                    }
                    if !start.is_empty()
                        && let Some(sep) = map.items.last_mut().and_then(|it| it.sep.as_mut())
                    {
                        sep.append(&mut start);
                    }
                }
            }
        }
        self.pop_token(CstToken::BlockMap(map), out);
        self.step(out);
    }

    fn block_sequence(&mut self, mut seq: BlockSeq, out: &mut VecDeque<CstToken>) {
        if seq.items.is_empty() {
            seq.items.push(CstItem::default());
        }
        let seq_indent = seq.indent;
        let st = self.source_token();
        match self.kind {
            TokenKind::Newline => {
                if let Some(it) = seq.items.last_mut() {
                    if let Some(end) = comment_end(it.value.as_deref_mut()) {
                        end.push(st);
                    } else if it.value.is_some() {
                        seq.items.push(CstItem::with_start(vec![st]));
                    } else {
                        it.start.push(st);
                    }
                }
                self.stack.push(CstToken::BlockSeq(seq));
                return;
            }
            TokenKind::Space | TokenKind::Comment => {
                let has_value = seq.items.last().is_some_and(|it| it.value.is_some());
                if has_value {
                    seq.items.push(CstItem::with_start(vec![st]));
                } else if !self.absorb_indented_comment(&mut seq.items, seq_indent)
                    && let Some(it) = seq.items.last_mut()
                {
                    it.start.push(st);
                }
                self.stack.push(CstToken::BlockSeq(seq));
                return;
            }
            TokenKind::Anchor | TokenKind::Tag => {
                let has_value = seq.items.last().is_some_and(|it| it.value.is_some());
                if !has_value
                    && self.indent > seq_indent
                    && let Some(it) = seq.items.last_mut()
                {
                    it.start.push(st);
                    self.stack.push(CstToken::BlockSeq(seq));
                    return;
                }
            }
            TokenKind::SeqItemInd if self.indent == seq_indent => {
                if let Some(it) = seq.items.last_mut() {
                    if it.value.is_some() || includes_kind(&it.start, TokenKind::SeqItemInd) {
                        seq.items.push(CstItem::with_start(vec![st]));
                    } else {
                        it.start.push(st);
                    }
                }
                self.stack.push(CstToken::BlockSeq(seq));
                return;
            }
            _ => {}
        }
        if self.indent > seq_indent
            && let Some(it) = seq.items.last_mut()
            && let Some(bv) = self.start_block_value(&mut it.start)
        {
            self.stack.push(CstToken::BlockSeq(seq));
            self.push_node(bv);
            return;
        }
        self.pop_token(CstToken::BlockSeq(seq), out);
        self.step(out);
    }

    #[allow(clippy::too_many_lines, reason = "one arm per token kind")]
    fn flow_collection(&mut self, mut fc: FlowCollection, out: &mut VecDeque<CstToken>) {
        if self.kind == TokenKind::FlowErrorEnd {
            let mut top = CstToken::FlowCollection(fc);
            loop {
                self.pop_token(top, out);
                match self.stack.pop() {
                    Some(CstToken::FlowCollection(parent)) => top = CstToken::FlowCollection(parent),
                    Some(other) => {
                        self.stack.push(other);
                        break;
                    }
                    None => break,
                }
            }
            return;
        }

        if fc.end.is_empty() {
            let st = self.source_token();
            let it = fc.items.last_mut();
            match self.kind {
                TokenKind::Comma | TokenKind::ExplicitKeyInd => match it {
                    Some(it) if it.sep.is_none() => it.start.push(st),
                    _ => fc.items.push(CstItem::with_start(vec![st])),
                },
                TokenKind::MapValueInd => match it {
                    Some(it) if it.value.is_none() => match &mut it.sep {
                        Some(sep) => sep.push(st),
                        None => {
                            it.key = None;
                            it.sep = Some(vec![st]);
                        }
                    },
                    _ => fc.items.push(CstItem {
                        sep: Some(vec![st]),
                        ..CstItem::default()
                    }),
                },
                TokenKind::Space
                | TokenKind::Comment
                | TokenKind::Newline
                | TokenKind::Anchor
                | TokenKind::Tag => match it {
                    Some(it) if it.value.is_none() => match &mut it.sep {
                        Some(sep) => sep.push(st),
                        None => it.start.push(st),
                    },
                    _ => fc.items.push(CstItem::with_start(vec![st])),
                },
                TokenKind::Alias
                | TokenKind::Scalar
                | TokenKind::SingleQuotedScalar
                | TokenKind::DoubleQuotedScalar => {
                    let fs = self.flow_scalar();
                    match it {
                        Some(it) if it.value.is_none() && it.sep.is_some() => {
                            self.stack.push(CstToken::FlowCollection(fc));
                            self.push_node(fs);
                            return;
                        }
                        Some(it) if it.value.is_none() => {
                            it.key = Some(Box::new(fs));
                            it.sep = Some(Vec::new());
                        }
                        _ => fc.items.push(CstItem {
                            key: Some(Box::new(fs)),
                            sep: Some(Vec::new()),
                            ..CstItem::default()
                        }),
                    }
                }
                TokenKind::FlowMapEnd | TokenKind::FlowSeqEnd => fc.end.push(st),
                _ => {
                    let value = self.start_block_value(&mut Vec::new());
                    match value {
                        Some(bv) => {
                            self.stack.push(CstToken::FlowCollection(fc));
                            self.push_node(bv);
                        }
                        None => {
                            self.pop_token(CstToken::FlowCollection(fc), out);
                            self.step(out);
                        }
                    }
                    return;
                }
            }
            self.stack.push(CstToken::FlowCollection(fc));
            return;
        }

        let (parent_is_flow, closes_into_parent_map) = match self.stack.last() {
            Some(CstToken::BlockMap(parent)) => (
                false,
                (self.kind == TokenKind::MapValueInd && parent.indent == fc.indent)
                    || (self.kind == TokenKind::Newline
                        && parent.items.last().is_some_and(|it| it.sep.is_none())),
            ),
            Some(CstToken::FlowCollection(_)) => (true, false),
            _ => (false, false),
        };
        if closes_into_parent_map {
            self.pop_token(CstToken::FlowCollection(fc), out);
            self.step(out);
        } else if self.kind == TokenKind::MapValueInd && !parent_is_flow {
            // the flow collection is an implicit key
            let start = self
                .stack
                .last_mut()
                .and_then(get_prev_props)
                .map(get_first_key_start_props)
                .unwrap_or_default();
            fix_flow_seq_items(&mut fc);
            let mut sep = fc.end.split_off(fc.end.len().min(1));
            sep.push(self.source_token());
            let map = BlockMap {
                offset: fc.offset,
                indent: fc.indent,
                items: vec![CstItem {
                    start,
                    key: Some(Box::new(CstToken::FlowCollection(fc))),
                    sep: Some(sep),
                    ..CstItem::default()
                }],
            };
            self.on_key_line = true;
            self.push_node(CstToken::BlockMap(map));
        } else {
            self.line_end(CstToken::FlowCollection(fc), out);
        }
    }

    fn flow_scalar(&mut self) -> CstToken {
        self.record_newlines();
        CstToken::Scalar(FlowScalar {
            kind: self.kind,
            offset: self.offset,
            indent: self.indent,
            source: self.source.clone(),
            end: Vec::new(),
        })
    }

    /// Open a new node for the current token, if it can start one.
    fn start_block_value(&mut self, prev: &mut Vec<SourceToken>) -> Option<CstToken> {
        let token = match self.kind {
            TokenKind::Alias
            | TokenKind::Scalar
            | TokenKind::SingleQuotedScalar
            | TokenKind::DoubleQuotedScalar => self.flow_scalar(),
            TokenKind::BlockScalarHeader => CstToken::BlockScalar(BlockScalar {
                offset: self.offset,
                indent: self.indent,
                props: vec![self.source_token()],
                source: String::new(),
            }),
            TokenKind::FlowMapStart | TokenKind::FlowSeqStart => {
                CstToken::FlowCollection(FlowCollection {
                    offset: self.offset,
                    indent: self.indent,
                    start: self.source_token(),
                    items: Vec::new(),
                    end: Vec::new(),
                })
            }
            TokenKind::SeqItemInd => CstToken::BlockSeq(BlockSeq {
                offset: self.offset,
                indent: self.indent,
                items: vec![CstItem::with_start(vec![self.source_token()])],
            }),
            TokenKind::ExplicitKeyInd => {
                self.on_key_line = true;
                let mut start = get_first_key_start_props(prev);
                start.push(self.source_token());
                CstToken::BlockMap(BlockMap {
                    offset: self.offset,
                    indent: self.indent,
                    items: vec![CstItem {
                        start,
                        explicit_key: true,
                        ..CstItem::default()
                    }],
                })
            }
            TokenKind::MapValueInd => {
                self.on_key_line = true;
                let start = get_first_key_start_props(prev);
                CstToken::BlockMap(BlockMap {
                    offset: self.offset,
                    indent: self.indent,
                    items: vec![CstItem {
                        start,
                        sep: Some(vec![self.source_token()]),
                        ..CstItem::default()
                    }],
                })
            }
            _ => return None,
        };
        Some(token)
    }

    fn document_end(&mut self, mut end: DocumentEnd, out: &mut VecDeque<CstToken>) {
        if self.kind == TokenKind::DocMode {
            self.stack.push(CstToken::DocEnd(end));
            return;
        }
        end.end.push(self.source_token());
        if self.kind == TokenKind::Newline {
            self.pop_token(CstToken::DocEnd(end), out);
        } else {
            self.stack.push(CstToken::DocEnd(end));
        }
    }

    fn line_end(&mut self, mut token: CstToken, out: &mut VecDeque<CstToken>) {
        match self.kind {
            TokenKind::Comma
            | TokenKind::DocStart
            | TokenKind::DocEnd
            | TokenKind::FlowSeqEnd
            | TokenKind::FlowMapEnd
            | TokenKind::MapValueInd => {
                self.pop_token(token, out);
                self.step(out);
            }
            kind => {
                if kind == TokenKind::Newline {
                    self.on_key_line = false;
                }
                // anything else on the line is kept for the composer to report
                if let Some(end) = end_tokens_mut(&mut token) {
                    end.push(self.source_token());
                }
                if kind == TokenKind::Newline {
                    self.pop_token(token, out);
                } else {
                    self.stack.push(token);
                }
            }
        }
    }
}

const fn token_name(token: &CstToken) -> &'static str {
    match token {
        CstToken::Directive(_) => "directive",
        CstToken::Source(_) => "source",
        CstToken::Error(_) => "error",
        CstToken::Document(_) => "document",
        CstToken::DocEnd(_) => "doc-end",
        CstToken::Scalar(_) => "flow-scalar",
        CstToken::BlockScalar(_) => "block-scalar",
        CstToken::BlockMap(_) => "block-map",
        CstToken::BlockSeq(_) => "block-seq",
        CstToken::FlowCollection(_) => "flow-collection",
    }
}

#[derive(Debug)]
enum TokenSource<'a> {
    Borrowed(Tokens<'a>),
    Owned(std::vec::IntoIter<OwnedToken>),
}

/// Lazy iterator of completed top-level CST tokens.
#[derive(Debug)]
pub struct CstTokens<'a> {
    parser: &'a mut Parser,
    tokens: TokenSource<'a>,
    queue: VecDeque<CstToken>,
    finish: bool,
    done: bool,
}

impl CstTokens<'_> {
    /// The parser's line index, complete once iteration has finished.
    #[must_use]
    pub fn line_counter(&self) -> &LineCounter {
        &self.parser.line_counter
    }
}

impl Iterator for CstTokens<'_> {
    type Item = CstToken;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.queue.pop_front() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            match &mut self.tokens {
                TokenSource::Borrowed(tokens) => match tokens.next() {
                    Some(token) => self.parser.next(token.kind, token.source, &mut self.queue),
                    None => self.done = true,
                },
                TokenSource::Owned(tokens) => match tokens.next() {
                    Some(token) => self.parser.next(token.kind, &token.source, &mut self.queue),
                    None => self.done = true,
                },
            }
            if self.done && self.finish {
                self.parser.end(&mut self.queue);
            }
        }
    }
}

/// Parse a complete source text into CST tokens.
#[must_use]
pub fn parse_cst(src: &str) -> Vec<CstToken> {
    Parser::new().parse(src, false).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::source;

    fn single_doc(src: &str) -> CstDocument {
        let tokens = parse_cst(src);
        let docs: Vec<_> = tokens
            .into_iter()
            .filter_map(|t| match t {
                CstToken::Document(doc) => Some(doc),
                _ => None,
            })
            .collect();
        assert_eq!(docs.len(), 1, "{src:?}");
        docs.into_iter().next().unwrap()
    }

    #[test]
    fn test_block_map() {
        let doc = single_doc("a: 1\nb: two\n");
        let Some(CstToken::BlockMap(map)) = doc.value.as_deref() else {
            panic!("expected block map");
        };
        assert_eq!(map.items.len(), 2);
        let Some(CstToken::Scalar(key)) = map.items[1].key.as_deref() else {
            panic!("expected scalar key");
        };
        assert_eq!(key.source, "b");
        let Some(CstToken::Scalar(value)) = map.items[1].value.as_deref() else {
            panic!("expected scalar value");
        };
        assert_eq!(value.source, "two");
    }

    #[test]
    fn test_nested_block_seq_in_map() {
        let doc = single_doc("list:\n  - x\n  - y\nnext: z\n");
        let Some(CstToken::BlockMap(map)) = doc.value.as_deref() else {
            panic!("expected block map");
        };
        assert_eq!(map.items.len(), 2);
        let Some(CstToken::BlockSeq(seq)) = map.items[0].value.as_deref() else {
            panic!("expected block seq");
        };
        assert_eq!(seq.items.len(), 2);
        assert_eq!(seq.indent, 2);
    }

    #[test]
    fn test_flow_collection() {
        let doc = single_doc("{a: [1, 2], b: c}\n");
        let Some(CstToken::FlowCollection(fc)) = doc.value.as_deref() else {
            panic!("expected flow collection");
        };
        assert!(fc.is_map());
        assert_eq!(fc.items.len(), 2);
        let Some(CstToken::FlowCollection(inner)) = fc.items[0].value.as_deref() else {
            panic!("expected flow seq");
        };
        assert!(!inner.is_map());
        // `1` and `2` become values, not keys
        assert!(inner.items.iter().all(|it| it.key.is_none() && it.value.is_some()));
    }

    #[test]
    fn test_multiple_documents_and_directives() {
        let tokens = parse_cst("%YAML 1.2\n---\na\n...\n---\nb\n");
        let kinds: Vec<_> = tokens.iter().map(token_name).collect();
        assert_eq!(
            kinds,
            vec!["directive", "source", "document", "doc-end", "document"]
        );
    }

    #[test]
    fn test_lossless() {
        let inputs = [
            "a: 1\nb:\n  - x\n  - {y: z}\n",
            "# head\n--- !!map\n? complex\n: value # c\n\n...\n",
            "- |\n  block\n   text\n- >-\n  folded\n- 'q'\n",
            "key: [unterminated\nother: 1\n",
            "a:\n  b:\n    c: d\n  # comment\ne: f\n",
            "&anchor x: *alias\n",
        ];
        for input in inputs {
            let rebuilt: String = parse_cst(input).iter().map(source).collect();
            assert_eq!(rebuilt, input);
        }
    }

    #[test]
    fn test_incremental_parse() {
        let input = "a: 1\nb: [x, y]\n---\nc\n";
        let mut parser = Parser::new();
        let mut tokens: Vec<CstToken> = parser.parse(&input[..7], true).collect();
        tokens.extend(parser.parse(&input[7..], false));
        let rebuilt: String = tokens.iter().map(source).collect();
        assert_eq!(rebuilt, input);
        let docs = tokens
            .iter()
            .filter(|t| matches!(t, CstToken::Document(_)))
            .count();
        assert_eq!(docs, 2);
    }

    #[test]
    fn test_line_counter() {
        let mut parser = Parser::new();
        let count = parser.parse("a: 1\nb: |\n  x\n  y\nc: 2\n", false).count();
        assert_eq!(count, 1);
        assert_eq!(parser.line_counter.line_count(), 6);
        assert_eq!(parser.line_counter.line_start(5), Some(18));
    }

    #[test]
    fn test_get_first_key_start_props() {
        let mut prev = vec![
            SourceToken::new(TokenKind::Anchor, 0, 0, "&x"),
            SourceToken::new(TokenKind::Newline, 2, 0, "\n"),
            SourceToken::new(TokenKind::Space, 3, 0, "  "),
            SourceToken::new(TokenKind::Tag, 5, 2, "!t"),
        ];
        let start = get_first_key_start_props(&mut prev);
        assert_eq!(start.len(), 1);
        assert_eq!(start[0].source, "!t");
        assert_eq!(prev.len(), 3);
    }
}
