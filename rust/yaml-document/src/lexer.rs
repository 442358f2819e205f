// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Lexical tokenizer.
//!
//! Splits YAML source into classified slices without interpreting them. The
//! lexer is a single-character push-down automaton over the named states in
//! [`LexState`]. Every byte of the input ends up in exactly one token, so
//! concatenating token sources reproduces the input. Two zero-length marker
//! tokens are also emitted: [`TokenKind::DocMode`] when document content
//! starts without `---`, and [`TokenKind::FlowErrorEnd`] when a flow
//! collection is cut short by indentation.
//!
//! Input may arrive in chunks through [`Lexer::lex`]. When a chunk ends
//! before a token boundary can be decided, the lexer keeps the unconsumed
//! tail and its state and resumes on the next call.

use std::collections::VecDeque;

/// Classification of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    ByteOrderMark,
    /// Zero-length marker: document content starts without `---`.
    DocMode,
    /// Zero-length marker: a flow collection ended by unindentation.
    FlowErrorEnd,
    DirectiveLine,
    DocStart,
    DocEnd,
    Space,
    Newline,
    Comment,
    Anchor,
    Tag,
    Alias,
    SeqItemInd,
    ExplicitKeyInd,
    MapValueInd,
    FlowMapStart,
    FlowMapEnd,
    FlowSeqStart,
    FlowSeqEnd,
    Comma,
    /// Plain scalar body.
    Scalar,
    SingleQuotedScalar,
    DoubleQuotedScalar,
    BlockScalarHeader,
    /// Block scalar body, including its trailing line break.
    BlockScalar,
    Error,
}

impl TokenKind {
    /// Classify a token by its source text.
    ///
    /// Scalar bodies cannot be told apart from their text alone, so plain and
    /// block scalar bodies are never returned here.
    #[must_use]
    pub fn of(source: &str) -> Option<Self> {
        let kind = match source {
            "\u{FEFF}" => Self::ByteOrderMark,
            "---" => Self::DocStart,
            "..." => Self::DocEnd,
            "\n" | "\r\n" => Self::Newline,
            "-" => Self::SeqItemInd,
            "?" => Self::ExplicitKeyInd,
            ":" => Self::MapValueInd,
            "{" => Self::FlowMapStart,
            "}" => Self::FlowMapEnd,
            "[" => Self::FlowSeqStart,
            "]" => Self::FlowSeqEnd,
            "," => Self::Comma,
            _ => match source.as_bytes().first()? {
                b' ' | b'\t' => Self::Space,
                b'#' => Self::Comment,
                b'%' => Self::DirectiveLine,
                b'*' => Self::Alias,
                b'&' => Self::Anchor,
                b'!' => Self::Tag,
                b'\'' => Self::SingleQuotedScalar,
                b'"' => Self::DoubleQuotedScalar,
                b'|' | b'>' => Self::BlockScalarHeader,
                _ => return None,
            },
        };
        Some(kind)
    }

    #[must_use]
    pub const fn is_flow_scalar(self) -> bool {
        matches!(
            self,
            Self::Alias | Self::Scalar | Self::SingleQuotedScalar | Self::DoubleQuotedScalar
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ByteOrderMark => "byte-order-mark",
            Self::DocMode => "doc-mode",
            Self::FlowErrorEnd => "flow-error-end",
            Self::DirectiveLine => "directive-line",
            Self::DocStart => "doc-start",
            Self::DocEnd => "doc-end",
            Self::Space => "space",
            Self::Newline => "newline",
            Self::Comment => "comment",
            Self::Anchor => "anchor",
            Self::Tag => "tag",
            Self::Alias => "alias",
            Self::SeqItemInd => "seq-item-ind",
            Self::ExplicitKeyInd => "explicit-key-ind",
            Self::MapValueInd => "map-value-ind",
            Self::FlowMapStart => "flow-map-start",
            Self::FlowMapEnd => "flow-map-end",
            Self::FlowSeqStart => "flow-seq-start",
            Self::FlowSeqEnd => "flow-seq-end",
            Self::Comma => "comma",
            Self::Scalar => "scalar",
            Self::SingleQuotedScalar => "single-quoted-scalar",
            Self::DoubleQuotedScalar => "double-quoted-scalar",
            Self::BlockScalarHeader => "block-scalar-header",
            Self::BlockScalar => "block-scalar",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token borrowing its source from the lexed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub source: &'a str,
    /// Byte offset in the full stream.
    pub offset: usize,
}

/// A token produced by incremental lexing, which cannot borrow from the
/// internal buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedToken {
    pub kind: TokenKind,
    pub source: String,
    pub offset: usize,
}

impl Token<'_> {
    #[must_use]
    pub fn to_owned_token(&self) -> OwnedToken {
        OwnedToken {
            kind: self.kind,
            source: self.source.to_owned(),
            offset: self.offset,
        }
    }
}

/// Named lexer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    Stream,
    LineStart,
    BlockStart,
    Doc,
    Flow,
    QuotedScalar,
    BlockScalar,
    PlainScalar,
}

#[derive(Debug, Clone, Copy)]
struct RawToken {
    kind: TokenKind,
    start: usize,
    end: usize,
}

/// Automaton state that survives between chunks.
#[derive(Debug, Clone, Default)]
struct LexerState {
    at_end: bool,
    block_scalar_indent: Option<usize>,
    block_scalar_keep: bool,
    flow_key: bool,
    flow_level: usize,
    indent_next: usize,
    indent_value: usize,
    /// Cached position of the next line break: `Some(None)` when there is
    /// none in the buffer.
    line_end_pos: Option<Option<usize>>,
    pos: usize,
    next: Option<LexState>,
}

const fn is_empty(ch: Option<u8>) -> bool {
    matches!(ch, None | Some(b' ' | b'\n' | b'\r' | b'\t'))
}

const fn is_flow_indicator(ch: Option<u8>) -> bool {
    matches!(ch, Some(b',' | b'[' | b']' | b'{' | b'}'))
}

const fn is_not_anchor_char(ch: Option<u8>) -> bool {
    matches!(
        ch,
        None | Some(b' ' | b',' | b'[' | b']' | b'{' | b'}' | b'\n' | b'\r' | b'\t')
    )
}

const fn is_hex(ch: Option<u8>) -> bool {
    matches!(ch, Some(c) if c.is_ascii_hexdigit())
}

const fn is_tag_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'-' | b'#'
                | b';'
                | b'/'
                | b'?'
                | b':'
                | b'@'
                | b'&'
                | b'='
                | b'+'
                | b'$'
                | b'_'
                | b'.'
                | b'!'
                | b'~'
                | b'*'
                | b'\''
                | b'('
                | b')'
        )
}

/// One pass of the automaton over a buffer.
struct Scanner<'b, 's> {
    src: &'b str,
    buf: &'b [u8],
    st: &'s mut LexerState,
    out: &'s mut VecDeque<RawToken>,
}

impl<'b> Scanner<'b, '_> {
    fn ch(&self, i: usize) -> Option<u8> {
        self.buf.get(i).copied()
    }

    fn chi(&self, i: isize) -> Option<u8> {
        usize::try_from(i).ok().and_then(|i| self.ch(i))
    }

    fn char_at(&self, n: usize) -> Option<u8> {
        self.ch(self.st.pos + n)
    }

    fn has_chars(&self, n: usize) -> bool {
        self.st.pos + n <= self.buf.len()
    }

    fn peek(&self, n: usize) -> &'b [u8] {
        let end = (self.st.pos + n).min(self.buf.len());
        &self.buf[self.st.pos.min(end)..end]
    }

    /// Position of `needle` in `[from, to)`, or -1.
    fn find(&self, needle: u8, from: usize, to: usize) -> isize {
        let to = to.min(self.buf.len());
        if from >= to {
            return -1;
        }
        self.buf[from..to]
            .iter()
            .position(|&c| c == needle)
            .and_then(|p| isize::try_from(from + p).ok())
            .unwrap_or(-1)
    }

    fn suspend(&mut self, state: LexState) -> Option<LexState> {
        self.st.next = Some(state);
        None
    }

    fn step(&mut self, state: LexState) -> Option<LexState> {
        match state {
            LexState::Stream => self.parse_stream(),
            LexState::LineStart => self.parse_line_start(),
            LexState::BlockStart => self.parse_block_start(),
            LexState::Doc => self.parse_document(),
            LexState::Flow => self.parse_flow_collection(),
            LexState::QuotedScalar => self.parse_quoted_scalar(),
            LexState::BlockScalar => self.parse_block_scalar(),
            LexState::PlainScalar => self.parse_plain_scalar(),
        }
    }

    fn at_line_end(&self) -> bool {
        let mut i = self.st.pos;
        let mut ch = self.ch(i);
        while matches!(ch, Some(b' ' | b'\t')) {
            i += 1;
            ch = self.ch(i);
        }
        match ch {
            None | Some(b'#' | b'\n') => true,
            Some(b'\r') => self.ch(i + 1) == Some(b'\n'),
            _ => false,
        }
    }

    /// Where a multi-line scalar continues after the line break ending at
    /// `offset - 1`, or `None` if the next line ends it.
    fn continue_scalar(&self, offset: usize) -> Option<usize> {
        let mut ch = self.ch(offset);
        if self.st.indent_next > 0 {
            let mut indent = 0;
            while ch == Some(b' ') {
                indent += 1;
                ch = self.ch(offset + indent);
            }
            if ch == Some(b'\r') {
                let next = self.ch(offset + indent + 1);
                if next == Some(b'\n') || (next.is_none() && !self.st.at_end) {
                    return Some(offset + indent + 1);
                }
            }
            return (ch == Some(b'\n')
                || indent >= self.st.indent_next
                || (ch.is_none() && !self.st.at_end))
                .then_some(offset + indent);
        }
        if matches!(ch, Some(b'-' | b'.'))
            && matches!(self.buf.get(offset..offset + 3), Some(b"---" | b"..."))
            && is_empty(self.ch(offset + 3))
        {
            return None;
        }
        Some(offset)
    }

    /// The rest of the current line, without its line break. `None` when the
    /// line may continue in a later chunk.
    fn get_line(&mut self) -> Option<&'b str> {
        let pos = self.st.pos;
        let end = match self.st.line_end_pos {
            Some(cached) if cached.is_none_or(|e| e >= pos) => cached,
            _ => {
                let found = self.buf[pos.min(self.buf.len())..]
                    .iter()
                    .position(|&c| c == b'\n')
                    .map(|p| pos + p);
                self.st.line_end_pos = Some(found);
                found
            }
        };
        match end {
            None => self.st.at_end.then(|| self.src.get(pos..).unwrap_or_default()),
            Some(mut e) => {
                if e > pos && self.buf[e - 1] == b'\r' {
                    e -= 1;
                }
                Some(self.src.get(pos..e).unwrap_or_default())
            }
        }
    }

    fn emit(&mut self, kind: Option<TokenKind>, end: usize) {
        let start = self.st.pos;
        let end = end.min(self.buf.len()).max(start);
        let kind = kind.unwrap_or_else(|| {
            self.src
                .get(start..end)
                .and_then(TokenKind::of)
                .unwrap_or(TokenKind::Error)
        });
        self.out.push_back(RawToken { kind, start, end });
        self.st.pos = end;
    }

    fn emit_marker(&mut self, kind: TokenKind) {
        let pos = self.st.pos;
        self.out.push_back(RawToken {
            kind,
            start: pos,
            end: pos,
        });
    }

    fn push_count(&mut self, n: usize) -> usize {
        if n > 0 {
            self.emit(None, self.st.pos + n);
            n
        } else {
            0
        }
    }

    fn push_to_index(&mut self, i: usize, allow_empty: bool, kind: Option<TokenKind>) -> usize {
        let start = self.st.pos;
        let end = i.min(self.buf.len());
        if end > start {
            self.emit(kind, end);
            end - start
        } else {
            if allow_empty {
                self.emit(kind, start);
            }
            0
        }
    }

    fn push_indicators(&mut self) -> usize {
        match self.char_at(0) {
            Some(b'!') => {
                let n = self.push_tag() + self.push_spaces(true);
                n + self.push_indicators()
            }
            Some(b'&') => {
                let n = self.push_until(is_not_anchor_char) + self.push_spaces(true);
                n + self.push_indicators()
            }
            Some(b'-' | b'?' | b':') => {
                let in_flow = self.st.flow_level > 0;
                let ch1 = self.char_at(1);
                if is_empty(ch1) || (in_flow && is_flow_indicator(ch1)) {
                    if !in_flow {
                        self.st.indent_next = self.st.indent_value + 1;
                    } else if self.st.flow_key {
                        self.st.flow_key = false;
                    }
                    let n = self.push_count(1) + self.push_spaces(true);
                    n + self.push_indicators()
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    fn push_tag(&mut self) -> usize {
        let pos = self.st.pos;
        if self.ch(pos + 1) == Some(b'<') {
            let mut i = pos + 2;
            let mut ch = self.ch(i);
            while !is_empty(ch) && ch != Some(b'>') {
                i += 1;
                ch = self.ch(i);
            }
            let end = if ch == Some(b'>') { i + 1 } else { i };
            self.push_to_index(end, false, None)
        } else {
            let mut i = pos + 1;
            while let Some(c) = self.ch(i) {
                if is_tag_char(c) {
                    i += 1;
                } else if c == b'%' && is_hex(self.ch(i + 1)) && is_hex(self.ch(i + 2)) {
                    i += 3;
                } else {
                    break;
                }
            }
            self.push_to_index(i, false, None)
        }
    }

    fn push_newline(&mut self) -> usize {
        match self.char_at(0) {
            Some(b'\n') => self.push_count(1),
            Some(b'\r') if self.char_at(1) == Some(b'\n') => self.push_count(2),
            _ => 0,
        }
    }

    fn push_spaces(&mut self, allow_tabs: bool) -> usize {
        let pos = self.st.pos;
        let mut i = pos;
        while let Some(c) = self.ch(i) {
            if c == b' ' || (allow_tabs && c == b'\t') {
                i += 1;
            } else {
                break;
            }
        }
        let n = i - pos;
        if n > 0 {
            self.emit(None, i);
        }
        n
    }

    fn push_until(&mut self, test: fn(Option<u8>) -> bool) -> usize {
        let mut i = self.st.pos;
        while !test(self.ch(i)) {
            i += 1;
        }
        self.push_to_index(i, false, None)
    }

    fn parse_stream(&mut self) -> Option<LexState> {
        let Some(mut line) = self.get_line() else {
            return self.suspend(LexState::Stream);
        };
        if let Some(rest) = line.strip_prefix('\u{FEFF}') {
            self.push_count('\u{FEFF}'.len_utf8());
            line = rest;
        }
        let bytes = line.as_bytes();
        if bytes.first() == Some(&b'%') {
            let mut dir_end = bytes.len();
            let mut cs = line.find('#');
            while let Some(c) = cs {
                if c > 0 && matches!(bytes[c - 1], b' ' | b'\t') {
                    dir_end = c - 1;
                    break;
                }
                cs = line[c + 1..].find('#').map(|p| p + c + 1);
            }
            while dir_end > 0 && matches!(bytes[dir_end - 1], b' ' | b'\t') {
                dir_end -= 1;
            }
            let n = self.push_count(dir_end) + self.push_spaces(true);
            self.push_count(bytes.len().saturating_sub(n));
            self.push_newline();
            return Some(LexState::Stream);
        }
        if self.at_line_end() {
            let sp = self.push_spaces(true);
            self.push_count(bytes.len().saturating_sub(sp));
            self.push_newline();
            return Some(LexState::Stream);
        }
        self.emit_marker(TokenKind::DocMode);
        self.parse_line_start()
    }

    fn parse_line_start(&mut self) -> Option<LexState> {
        let ch = self.char_at(0);
        if ch.is_none() && !self.st.at_end {
            return self.suspend(LexState::LineStart);
        }
        if matches!(ch, Some(b'-' | b'.')) {
            if !self.st.at_end && !self.has_chars(4) {
                return self.suspend(LexState::LineStart);
            }
            let s = self.peek(3);
            if (s == b"---" || s == b"...") && is_empty(self.char_at(3)) {
                self.push_count(3);
                self.st.indent_value = 0;
                self.st.indent_next = 0;
                return Some(if s == b"---" {
                    LexState::Doc
                } else {
                    LexState::Stream
                });
            }
        }
        self.st.indent_value = self.push_spaces(false);
        if self.st.indent_next > self.st.indent_value && !is_empty(self.char_at(1)) {
            self.st.indent_next = self.st.indent_value;
        }
        self.parse_block_start()
    }

    fn parse_block_start(&mut self) -> Option<LexState> {
        let ch0 = self.char_at(0);
        let ch1 = self.char_at(1);
        if ch1.is_none() && !self.st.at_end {
            return self.suspend(LexState::BlockStart);
        }
        if matches!(ch0, Some(b'-' | b'?' | b':')) && is_empty(ch1) {
            let n = self.push_count(1) + self.push_spaces(true);
            self.st.indent_next = self.st.indent_value + 1;
            self.st.indent_value += n;
            return self.parse_block_start();
        }
        Some(LexState::Doc)
    }

    fn parse_document(&mut self) -> Option<LexState> {
        self.push_spaces(true);
        let Some(line) = self.get_line() else {
            return self.suspend(LexState::Doc);
        };
        let mut n = self.push_indicators();
        match line.as_bytes().get(n) {
            Some(b'#') => {
                self.push_count(line.len() - n);
                self.push_newline();
                self.parse_line_start()
            }
            None => {
                self.push_newline();
                self.parse_line_start()
            }
            Some(b'{' | b'[') => {
                self.push_count(1);
                self.st.flow_key = false;
                self.st.flow_level = 1;
                Some(LexState::Flow)
            }
            Some(b'}' | b']') => {
                // stray closing bracket, reported by the parser
                self.push_count(1);
                Some(LexState::Doc)
            }
            Some(b'*') => {
                self.push_until(is_not_anchor_char);
                Some(LexState::Doc)
            }
            Some(b'"' | b'\'') => self.parse_quoted_scalar(),
            Some(b'|' | b'>') => {
                n += self.parse_block_scalar_header();
                n += self.push_spaces(true);
                self.push_count(line.len().saturating_sub(n));
                self.push_newline();
                self.parse_block_scalar()
            }
            Some(_) => self.parse_plain_scalar(),
        }
    }

    fn parse_flow_collection(&mut self) -> Option<LexState> {
        let mut indent: isize = -1;
        loop {
            let nl = self.push_newline();
            let mut sp = 0;
            if nl > 0 {
                sp = self.push_spaces(false);
                self.st.indent_value = sp;
                indent = isize::try_from(sp).unwrap_or(isize::MAX);
            }
            sp += self.push_spaces(true);
            if nl + sp == 0 {
                break;
            }
        }
        let Some(line) = self.get_line() else {
            return self.suspend(LexState::Flow);
        };
        let bytes = line.as_bytes();
        let indent_next = isize::try_from(self.st.indent_next).unwrap_or(isize::MAX);
        let unindented = indent != -1 && indent < indent_next && bytes.first() != Some(&b'#');
        let at_doc_marker = indent == 0
            && (line.starts_with("---") || line.starts_with("..."))
            && is_empty(bytes.get(3).copied());
        if unindented || at_doc_marker {
            // A closing bracket one column left of the content is accepted
            let at_flow_end_marker = indent == indent_next - 1
                && self.st.flow_level == 1
                && matches!(bytes.first(), Some(b']' | b'}'));
            if !at_flow_end_marker {
                self.st.flow_level = 0;
                self.emit_marker(TokenKind::FlowErrorEnd);
                return self.parse_line_start();
            }
        }
        let mut n = 0;
        while bytes.get(n) == Some(&b',') {
            n += self.push_count(1);
            n += self.push_spaces(true);
            self.st.flow_key = false;
        }
        n += self.push_indicators();
        match bytes.get(n) {
            None => Some(LexState::Flow),
            Some(b'#') => {
                self.push_count(line.len() - n);
                Some(LexState::Flow)
            }
            Some(b'{' | b'[') => {
                self.push_count(1);
                self.st.flow_key = false;
                self.st.flow_level += 1;
                Some(LexState::Flow)
            }
            Some(b'}' | b']') => {
                self.push_count(1);
                self.st.flow_key = true;
                self.st.flow_level = self.st.flow_level.saturating_sub(1);
                Some(if self.st.flow_level > 0 {
                    LexState::Flow
                } else {
                    LexState::Doc
                })
            }
            Some(b'*') => {
                self.push_until(is_not_anchor_char);
                Some(LexState::Flow)
            }
            Some(b'"' | b'\'') => {
                self.st.flow_key = true;
                self.parse_quoted_scalar()
            }
            Some(b':')
                if self.st.flow_key
                    || is_empty(self.char_at(1))
                    || self.char_at(1) == Some(b',') =>
            {
                self.st.flow_key = false;
                self.push_count(1);
                self.push_spaces(true);
                Some(LexState::Flow)
            }
            Some(_) => {
                self.st.flow_key = false;
                self.parse_plain_scalar()
            }
        }
    }

    fn parse_quoted_scalar(&mut self) -> Option<LexState> {
        let pos = self.st.pos;
        let Some(quote) = self.ch(pos) else {
            return self.suspend(LexState::QuotedScalar);
        };
        let len = self.buf.len();
        let mut end = self.find(quote, pos + 1, len);
        if quote == b'\'' {
            while end != -1 && self.chi(end + 1) == Some(b'\'') {
                end = self.find(b'\'', end.unsigned_abs() + 2, len);
            }
        } else {
            while end != -1 {
                let mut n = 0;
                while self.chi(end - 1 - n) == Some(b'\\') {
                    n += 1;
                }
                if n % 2 == 0 {
                    break;
                }
                end = self.find(b'"', end.unsigned_abs() + 1, len);
            }
        }
        // Only line breaks inside the quotes matter
        let qb_end = usize::try_from(end).unwrap_or(0);
        let mut nl = self.find(b'\n', pos, qb_end);
        if nl != -1 {
            while nl != -1 {
                let Some(cs) = self.continue_scalar(nl.unsigned_abs() + 1) else {
                    break;
                };
                nl = self.find(b'\n', cs, qb_end);
            }
            if nl != -1 {
                // unexpected unindent inside the quotes
                end = nl - if self.chi(nl - 1) == Some(b'\r') { 2 } else { 1 };
            }
        }
        if end == -1 {
            if !self.st.at_end {
                return self.suspend(LexState::QuotedScalar);
            }
            end = isize::try_from(len).unwrap_or(isize::MAX);
        }
        self.push_to_index(end.unsigned_abs() + 1, false, None);
        Some(if self.st.flow_level > 0 {
            LexState::Flow
        } else {
            LexState::Doc
        })
    }

    fn parse_block_scalar_header(&mut self) -> usize {
        self.st.block_scalar_indent = None;
        self.st.block_scalar_keep = false;
        let mut i = self.st.pos;
        loop {
            i += 1;
            match self.ch(i) {
                Some(b'+') => self.st.block_scalar_keep = true,
                Some(c @ b'1'..=b'9') => self.st.block_scalar_indent = Some(usize::from(c - b'1')),
                Some(b'-') => {}
                _ => break,
            }
        }
        self.push_until(|ch| is_empty(ch) || ch == Some(b'#'))
    }

    fn parse_block_scalar(&mut self) -> Option<LexState> {
        let pos = self.st.pos;
        let pos_i = isize::try_from(pos).unwrap_or(isize::MAX);
        let len = self.buf.len();
        let len_i = isize::try_from(len).unwrap_or(isize::MAX);
        let mut nl: isize = pos_i - 1;
        let mut indent = 0usize;
        let mut i = pos;
        let mut ch;
        loop {
            ch = self.ch(i);
            match ch {
                None => break,
                Some(b' ') => indent += 1,
                Some(b'\n') => {
                    nl = isize::try_from(i).unwrap_or(isize::MAX);
                    indent = 0;
                }
                Some(b'\r') => {
                    let next = self.ch(i + 1);
                    if next.is_none() && !self.st.at_end {
                        return self.suspend(LexState::BlockScalar);
                    }
                    if next != Some(b'\n') {
                        break;
                    }
                }
                Some(_) => break,
            }
            i += 1;
        }
        if ch.is_none() && !self.st.at_end {
            return self.suspend(LexState::BlockScalar);
        }
        if indent >= self.st.indent_next {
            self.st.indent_next = match self.st.block_scalar_indent {
                None => indent,
                Some(explicit) => {
                    explicit
                        + if self.st.indent_next == 0 {
                            1
                        } else {
                            self.st.indent_next
                        }
                }
            };
            loop {
                let Some(cs) = usize::try_from(nl + 1)
                    .ok()
                    .and_then(|o| self.continue_scalar(o))
                else {
                    break;
                };
                nl = self.find(b'\n', cs, len);
                if nl == -1 {
                    break;
                }
            }
            if nl == -1 {
                if !self.st.at_end {
                    return self.suspend(LexState::BlockScalar);
                }
                nl = len_i;
            }
        }
        // Trailing insufficiently indented tabs are kept in the body so the
        // composer can report them.
        let mut j = nl + 1;
        let mut c = self.chi(j);
        while c == Some(b' ') {
            j += 1;
            c = self.chi(j);
        }
        if c == Some(b'\t') {
            while matches!(c, Some(b'\t' | b' ' | b'\r' | b'\n')) {
                j += 1;
                c = self.chi(j);
            }
            nl = j - 1;
        } else if !self.st.block_scalar_keep {
            loop {
                let mut k = nl - 1;
                let mut c = self.chi(k);
                if c == Some(b'\r') {
                    k -= 1;
                    c = self.chi(k);
                }
                let last_char = k;
                while c == Some(b' ') {
                    k -= 1;
                    c = self.chi(k);
                }
                let indent_i = isize::try_from(indent).unwrap_or(isize::MAX);
                if c == Some(b'\n') && k >= pos_i && k + 1 + indent_i > last_char {
                    nl = k;
                } else {
                    break;
                }
            }
        }
        self.push_to_index(
            usize::try_from(nl + 1).unwrap_or(pos),
            true,
            Some(TokenKind::BlockScalar),
        );
        self.parse_line_start()
    }

    fn parse_plain_scalar(&mut self) -> Option<LexState> {
        let in_flow = self.st.flow_level > 0;
        let pos_i = isize::try_from(self.st.pos).unwrap_or(isize::MAX);
        let mut end = pos_i - 1;
        let mut i = pos_i - 1;
        let mut ch;
        loop {
            i += 1;
            ch = self.chi(i);
            let Some(mut c) = ch else { break };
            if c == b':' {
                let next = self.chi(i + 1);
                if is_empty(next) || (in_flow && is_flow_indicator(next)) {
                    break;
                }
                end = i;
            } else if is_empty(ch) {
                let mut next = self.chi(i + 1);
                if c == b'\r' {
                    if next == Some(b'\n') {
                        i += 1;
                        c = b'\n';
                        next = self.chi(i + 1);
                    } else {
                        end = i;
                    }
                }
                if next == Some(b'#') || (in_flow && is_flow_indicator(next)) {
                    break;
                }
                if c == b'\n' {
                    let Some(cs) = self.continue_scalar(i.unsigned_abs() + 1) else {
                        break;
                    };
                    // still account for a following ' #'
                    i = i.max(isize::try_from(cs).unwrap_or(isize::MAX) - 2);
                }
            } else {
                if in_flow && is_flow_indicator(ch) {
                    break;
                }
                end = i;
            }
        }
        if ch.is_none() && !self.st.at_end {
            return self.suspend(LexState::PlainScalar);
        }
        self.push_to_index(
            usize::try_from(end + 1).unwrap_or(self.st.pos),
            true,
            Some(TokenKind::Scalar),
        );
        Some(if in_flow {
            LexState::Flow
        } else {
            LexState::Doc
        })
    }
}

/// Incremental lexer for chunked input.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    buffer: String,
    /// Stream offset of `buffer[0]`.
    base: usize,
    state: LexerState,
}

impl Lexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True before any input has been consumed.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.base == 0 && self.buffer.is_empty() && self.state.next.is_none()
    }

    /// Lex the next chunk of input.
    ///
    /// With `incomplete` set, nothing is emitted for content whose end has
    /// not been seen yet; it is retained and lexed on the next call. A final
    /// call with `incomplete` unset flushes everything.
    pub fn lex(&mut self, chunk: &str, incomplete: bool) -> Vec<OwnedToken> {
        if !chunk.is_empty() {
            self.buffer.push_str(chunk);
            self.state.line_end_pos = None;
        }
        self.state.at_end = !incomplete;
        let mut out = VecDeque::new();
        let mut next = Some(self.state.next.take().unwrap_or(LexState::Stream));
        while let Some(state) = next {
            if !incomplete && self.state.pos >= self.buffer.len() {
                self.state.next = Some(state);
                break;
            }
            let mut scanner = Scanner {
                src: &self.buffer,
                buf: self.buffer.as_bytes(),
                st: &mut self.state,
                out: &mut out,
            };
            next = scanner.step(state);
        }
        let tokens: Vec<OwnedToken> = out
            .into_iter()
            .map(|raw| OwnedToken {
                kind: raw.kind,
                source: self.buffer[raw.start..raw.end].to_owned(),
                offset: self.base + raw.start,
            })
            .collect();
        let consumed = self.state.pos.min(self.buffer.len());
        self.buffer.drain(..consumed);
        self.base += consumed;
        self.state.pos = 0;
        self.state.line_end_pos = None;
        log::trace!(
            "lexed {} tokens, {} bytes pending",
            tokens.len(),
            self.buffer.len()
        );
        tokens
    }
}

/// Lazy token iterator over a complete source text.
#[derive(Debug)]
pub struct Tokens<'a> {
    src: &'a str,
    state: LexerState,
    pending: VecDeque<RawToken>,
    next: Option<LexState>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(raw) = self.pending.pop_front() {
                return Some(Token {
                    kind: raw.kind,
                    source: self.src.get(raw.start..raw.end).unwrap_or_default(),
                    offset: raw.start,
                });
            }
            let state = self.next?;
            if self.state.pos >= self.src.len() {
                self.next = None;
                return None;
            }
            let mut scanner = Scanner {
                src: self.src,
                buf: self.src.as_bytes(),
                st: &mut self.state,
                out: &mut self.pending,
            };
            self.next = scanner.step(state);
        }
    }
}

/// Tokenize a complete source text lazily.
#[must_use]
pub fn tokenize(src: &str) -> Tokens<'_> {
    Tokens {
        src,
        state: LexerState {
            at_end: true,
            ..LexerState::default()
        },
        pending: VecDeque::new(),
        next: Some(LexState::Stream),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src).map(|t| (t.kind, t.source)).collect()
    }

    #[test]
    fn test_simple_map() {
        use TokenKind::*;
        assert_eq!(
            kinds("a: 1\nb: [x, y]\n"),
            vec![
                (DocMode, ""),
                (Scalar, "a"),
                (MapValueInd, ":"),
                (Space, " "),
                (Scalar, "1"),
                (Newline, "\n"),
                (Scalar, "b"),
                (MapValueInd, ":"),
                (Space, " "),
                (FlowSeqStart, "["),
                (Scalar, "x"),
                (Comma, ","),
                (Space, " "),
                (Scalar, "y"),
                (FlowSeqEnd, "]"),
                (Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_document_markers_and_directives() {
        use TokenKind::*;
        assert_eq!(
            kinds("%YAML 1.2 # v\n--- !!str foo\n...\n"),
            vec![
                (DirectiveLine, "%YAML 1.2"),
                (Space, " "),
                (Comment, "# v"),
                (Newline, "\n"),
                (DocStart, "---"),
                (Space, " "),
                (Tag, "!!str"),
                (Space, " "),
                (Scalar, "foo"),
                (Newline, "\n"),
                (DocEnd, "..."),
                (Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_block_sequence_with_props() {
        use TokenKind::*;
        assert_eq!(
            kinds("- &a x\n- *a\n"),
            vec![
                (DocMode, ""),
                (SeqItemInd, "-"),
                (Space, " "),
                (Anchor, "&a"),
                (Space, " "),
                (Scalar, "x"),
                (Newline, "\n"),
                (SeqItemInd, "-"),
                (Space, " "),
                (Alias, "*a"),
                (Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_quoted_scalars() {
        use TokenKind::*;
        assert_eq!(
            kinds("'it''s': \"a\\\"b\"\n"),
            vec![
                (DocMode, ""),
                (SingleQuotedScalar, "'it''s'"),
                (MapValueInd, ":"),
                (Space, " "),
                (DoubleQuotedScalar, "\"a\\\"b\""),
                (Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_block_scalar() {
        use TokenKind::*;
        assert_eq!(
            kinds("key: |-\n  line 1\n  line 2\nnext: x\n"),
            vec![
                (DocMode, ""),
                (Scalar, "key"),
                (MapValueInd, ":"),
                (Space, " "),
                (BlockScalarHeader, "|-"),
                (Newline, "\n"),
                (BlockScalar, "  line 1\n  line 2\n"),
                (Scalar, "next"),
                (MapValueInd, ":"),
                (Space, " "),
                (Scalar, "x"),
                (Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_multiline_plain_scalar() {
        use TokenKind::*;
        assert_eq!(
            kinds("a: b\n  c # note\n"),
            vec![
                (DocMode, ""),
                (Scalar, "a"),
                (MapValueInd, ":"),
                (Space, " "),
                (Scalar, "b\n  c"),
                (Space, " "),
                (Comment, "# note"),
                (Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_plain_scalar_with_colon() {
        use TokenKind::*;
        assert_eq!(
            kinds("url: http://x.y:80/z\n"),
            vec![
                (DocMode, ""),
                (Scalar, "url"),
                (MapValueInd, ":"),
                (Space, " "),
                (Scalar, "http://x.y:80/z"),
                (Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_flow_error_end_on_unindent() {
        let tokens = kinds("a:\n  [x,\ny\n");
        assert!(tokens.iter().any(|(k, _)| *k == TokenKind::FlowErrorEnd));
    }

    #[test]
    fn test_sources_reconstruct_input() {
        let inputs = [
            "a: 1\nb:\n  - x\n  - {y: z}\n",
            "\u{FEFF}--- |+\n  keep\n\n...\n# trailing\n",
            "? complex key\n: value # c\r\n\"unterminated\n",
            "é: ü\n  ß\n",
        ];
        for input in inputs {
            let rebuilt: String = tokenize(input).map(|t| t.source).collect();
            assert_eq!(rebuilt, input);
            let mut offset = 0;
            for token in tokenize(input) {
                assert_eq!(token.offset, offset);
                offset += token.source.len();
            }
        }
    }

    #[test]
    fn test_incremental_matches_full() {
        let input = "a: \"multi\n  line\"\nb: |\n  text\n  more\nc: [1, 2]\n";
        let full: Vec<OwnedToken> = tokenize(input).map(|t| t.to_owned_token()).collect();
        for split in 1..input.len() {
            let mut lexer = Lexer::new();
            let mut tokens = lexer.lex(&input[..split], true);
            tokens.extend(lexer.lex(&input[split..], false));
            assert_eq!(tokens, full, "split at {split}");
        }
    }

    #[test]
    fn test_incomplete_quote_emits_nothing() {
        let mut lexer = Lexer::new();
        let tokens = lexer.lex("key: \"abc", true);
        assert!(
            tokens
                .iter()
                .all(|t| t.kind != TokenKind::DoubleQuotedScalar)
        );
        let tokens = lexer.lex(" def\"\n", false);
        let quoted: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::DoubleQuotedScalar)
            .collect();
        assert_eq!(quoted.len(), 1);
        assert_eq!(quoted[0].source, "\"abc def\"");
        assert_eq!(quoted[0].offset, 5);
    }
}
