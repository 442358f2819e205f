// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Scalar source text to string value: line folding, quote and escape
//! handling, and block scalar indentation and chomping.

use super::Diagnostics;
use super::props::resolve_end;
use crate::cst::{BlockScalar, FlowScalar};
use crate::document::ScalarStyle;
use crate::error::ErrorCode;
use crate::lexer::TokenKind;
use crate::span::span;

/// A scalar's string value with its presentation details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedScalar {
    pub value: String,
    pub style: Option<ScalarStyle>,
    pub comment: String,
    pub range: [usize; 3],
}

pub(crate) fn resolve_flow_scalar(
    scalar: &FlowScalar,
    strict: bool,
    diag: &mut Diagnostics,
) -> ResolvedScalar {
    let offset = scalar.offset;
    let source = scalar.source.as_str();
    let mut on_error =
        |rel: usize, code: ErrorCode, message: String| diag.error(span(offset + rel, offset + rel + 1), code, message);
    let (style, value) = match scalar.kind {
        TokenKind::Scalar => (ScalarStyle::Plain, plain_value(source, &mut on_error)),
        TokenKind::SingleQuotedScalar => {
            (ScalarStyle::QuoteSingle, single_quoted_value(source, &mut on_error))
        }
        TokenKind::DoubleQuotedScalar => {
            (ScalarStyle::QuoteDouble, double_quoted_value(source, &mut on_error))
        }
        kind => {
            let end = offset + source.len();
            diag.error(
                span(offset, end),
                ErrorCode::UnexpectedToken,
                format!("Expected a flow scalar value, but found: {kind}"),
            );
            return ResolvedScalar {
                value: String::new(),
                style: None,
                comment: String::new(),
                range: [offset, end, end],
            };
        }
    };
    let value_end = offset + source.len();
    let (comment, end) = resolve_end(&scalar.end, value_end, strict, diag);
    ResolvedScalar {
        value,
        style: Some(style),
        comment,
        range: [offset, value_end, end],
    }
}

fn plain_value(source: &str, on_error: &mut dyn FnMut(usize, ErrorCode, String)) -> String {
    let bad_char = match source.chars().next() {
        Some('\t') => Some("a tab character".to_owned()),
        Some(',') => Some("flow indicator character ,".to_owned()),
        Some('%') => Some("directive indicator character %".to_owned()),
        Some(ch @ ('|' | '>')) => Some(format!("block scalar indicator {ch}")),
        Some(ch @ ('@' | '`')) => Some(format!("reserved character {ch}")),
        _ => None,
    };
    if let Some(bad_char) = bad_char {
        on_error(
            0,
            ErrorCode::BadScalarStart,
            format!("Plain value cannot start with {bad_char}"),
        );
    }
    fold_lines(source)
}

fn single_quoted_value(source: &str, on_error: &mut dyn FnMut(usize, ErrorCode, String)) -> String {
    let closed = source.len() > 1 && source.ends_with('\'');
    if !closed {
        on_error(
            source.len(),
            ErrorCode::MissingChar,
            "Missing closing 'quote".to_owned(),
        );
    }
    let inner = source.get(1..if closed { source.len() - 1 } else { source.len() });
    fold_lines(inner.unwrap_or_default()).replace("''", "'")
}

fn trim_blank_end(line: &str) -> &str {
    line.trim_end_matches([' ', '\t'])
}

fn trim_blank_start(line: &str) -> &str {
    line.trim_start_matches([' ', '\t'])
}

/// Fold a multi-line flow scalar: single line breaks become spaces, blank
/// lines become line breaks, and whitespace around breaks is dropped.
pub(crate) fn fold_lines(source: &str) -> String {
    if !source.contains('\n') {
        return source.to_owned();
    }
    let lines: Vec<&str> = source
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let last = lines.len() - 1;
    let mut res = trim_blank_end(lines[0]).to_owned();
    let mut sep = " ";
    for line in &lines[1..last] {
        let line = trim_blank_end(trim_blank_start(line));
        if line.is_empty() {
            if sep == "\n" {
                res.push('\n');
            } else {
                sep = "\n";
            }
        } else {
            res.push_str(sep);
            res.push_str(line);
            sep = " ";
        }
    }
    res.push_str(sep);
    res.push_str(trim_blank_start(lines[last]));
    res
}

fn escape_code(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '\0',
        'a' => '\x07',
        'b' => '\x08',
        'e' => '\x1b',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' | '\t' => '\t',
        'v' => '\x0b',
        'N' => '\u{85}',
        '_' => '\u{a0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        ' ' => ' ',
        '"' => '"',
        '/' => '/',
        '\\' => '\\',
        _ => return None,
    })
}

#[allow(clippy::too_many_lines, reason = "escape handling reads best inline")]
fn double_quoted_value(source: &str, on_error: &mut dyn FnMut(usize, ErrorCode, String)) -> String {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let closed = chars.len() > 1 && source.ends_with('"');
    let end = if closed { chars.len() - 1 } else { chars.len() };
    let at = |i: usize| chars.get(i).map(|&(_, ch)| ch);
    let mut res = String::with_capacity(source.len());
    let mut i = 1;
    while i < end {
        let ch = chars[i].1;
        match ch {
            '\r' if at(i + 1) == Some('\n') => {}
            '\n' => {
                // fold the line break and the indentation after it
                let mut fold = String::new();
                while let Some(next) = at(i + 1).filter(|_| i + 1 < end) {
                    match next {
                        ' ' | '\t' => {}
                        '\n' => fold.push('\n'),
                        '\r' if at(i + 2) == Some('\n') => {}
                        _ => break,
                    }
                    i += 1;
                }
                res.push_str(if fold.is_empty() { " " } else { &fold });
            }
            '\\' => {
                i += 1;
                let next = at(i).filter(|_| i < end);
                match next {
                    Some(next) if escape_code(next).is_some() => {
                        res.extend(escape_code(next));
                    }
                    Some('\n') => {
                        while matches!(at(i + 1), Some(' ' | '\t')) && i + 1 < end {
                            i += 1;
                        }
                    }
                    Some('\r') if at(i + 1) == Some('\n') => {
                        i += 1;
                        while matches!(at(i + 1), Some(' ' | '\t')) && i + 1 < end {
                            i += 1;
                        }
                    }
                    Some(kind @ ('x' | 'u' | 'U')) => {
                        let length = match kind {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let code: String = chars
                            .iter()
                            .skip(i + 1)
                            .take(length)
                            .map(|&(_, ch)| ch)
                            .collect();
                        let decoded = (code.len() == length
                            && code.chars().all(|ch| ch.is_ascii_hexdigit()))
                        .then(|| u32::from_str_radix(&code, 16).ok())
                        .flatten()
                        .and_then(char::from_u32);
                        match decoded {
                            Some(decoded) => res.push(decoded),
                            None => {
                                let raw = format!("\\{kind}{code}");
                                on_error(
                                    chars[i - 1].0,
                                    ErrorCode::BadDqEscape,
                                    format!("Invalid escape sequence {raw}"),
                                );
                                res.push_str(&raw);
                            }
                        }
                        i += length;
                    }
                    other => {
                        let raw: String = std::iter::once('\\').chain(other).collect();
                        on_error(
                            chars[i - 1].0,
                            ErrorCode::BadDqEscape,
                            format!("Invalid escape sequence {raw}"),
                        );
                        res.push_str(&raw);
                    }
                }
            }
            ' ' | '\t' => {
                // trailing whitespace before a line break is dropped
                let ws_start = i;
                while matches!(at(i + 1), Some(' ' | '\t')) && i + 1 < end {
                    i += 1;
                }
                let next = at(i + 1).filter(|_| i + 1 < end);
                let at_break = next == Some('\n') || (next == Some('\r') && at(i + 2) == Some('\n'));
                if !at_break {
                    res.extend(chars[ws_start..=i].iter().map(|&(_, ch)| ch));
                }
            }
            _ => res.push(ch),
        }
        i += 1;
    }
    if !closed {
        on_error(
            source.len(),
            ErrorCode::MissingChar,
            "Missing closing \"quote".to_owned(),
        );
    }
    res
}

struct BlockHeader {
    folded: bool,
    indent: usize,
    chomp: Option<char>,
    comment: String,
    length: usize,
}

fn parse_block_header(
    scalar: &BlockScalar,
    strict: bool,
    diag: &mut Diagnostics,
) -> Option<BlockHeader> {
    let Some(header) = scalar
        .props
        .first()
        .filter(|t| t.kind == TokenKind::BlockScalarHeader)
    else {
        diag.error(
            span(scalar.offset, scalar.offset + 1),
            ErrorCode::Impossible,
            "Block scalar header not found",
        );
        return None;
    };
    let source = header.source.as_str();
    let mut indent = 0;
    let mut chomp = None;
    let mut error = None;
    for (i, ch) in source.char_indices().skip(1) {
        if chomp.is_none() && (ch == '-' || ch == '+') {
            chomp = Some(ch);
        } else {
            match ch.to_digit(10) {
                Some(n) if indent == 0 && n > 0 => indent = n as usize,
                _ => {
                    error.get_or_insert(scalar.offset + i);
                }
            }
        }
    }
    if let Some(error) = error {
        diag.error(
            span(error, error + 1),
            ErrorCode::UnexpectedToken,
            format!("Block scalar header includes extra characters: {source}"),
        );
    }
    let mut has_space = false;
    let mut comment = String::new();
    let mut length = source.len();
    for token in &scalar.props[1..] {
        match token.kind {
            TokenKind::Space => {
                has_space = true;
                length += token.source.len();
            }
            TokenKind::Newline => length += token.source.len(),
            TokenKind::Comment => {
                if strict && !has_space {
                    diag.error(
                        span(token.offset, token.end_offset()),
                        ErrorCode::MissingChar,
                        "Comments must be separated from other tokens by white space characters",
                    );
                }
                length += token.source.len();
                token.source[1..].clone_into(&mut comment);
            }
            kind => {
                diag.error(
                    span(token.offset, token.end_offset()),
                    ErrorCode::UnexpectedToken,
                    format!("Unexpected token in block scalar header: {kind}"),
                );
                length += token.source.len();
            }
        }
    }
    Some(BlockHeader {
        folded: source.starts_with('>'),
        indent,
        chomp,
        comment,
        length,
    })
}

/// Split a block scalar body into `(indent, content)` pairs, where indent is
/// the run of leading spaces.
fn split_lines(source: &str) -> Vec<(&str, &str)> {
    source
        .split('\n')
        .map(|line| {
            let content = line.trim_start_matches(' ');
            (&line[..line.len() - content.len()], content)
        })
        .collect()
}

#[allow(clippy::too_many_lines, reason = "follows the block scalar grammar step by step")]
pub(crate) fn resolve_block_scalar(
    scalar: &BlockScalar,
    strict: bool,
    at_root: bool,
    diag: &mut Diagnostics,
) -> ResolvedScalar {
    let start = scalar.offset;
    let Some(header) = parse_block_header(scalar, strict, diag) else {
        return ResolvedScalar {
            value: String::new(),
            style: None,
            comment: String::new(),
            range: [start, start, start],
        };
    };
    let style = if header.folded {
        ScalarStyle::BlockFolded
    } else {
        ScalarStyle::BlockLiteral
    };
    let lines = if scalar.source.is_empty() {
        Vec::new()
    } else {
        split_lines(&scalar.source)
    };
    let is_blank = |content: &str| content.is_empty() || content == "\r";

    let mut chomp_start = lines.len();
    for (i, (_, content)) in lines.iter().enumerate().rev() {
        if is_blank(content) {
            chomp_start = i;
        } else {
            break;
        }
    }

    let end = start + header.length + scalar.source.len();
    if chomp_start == 0 {
        let value = if header.chomp == Some('+') && !lines.is_empty() {
            "\n".repeat(lines.len().saturating_sub(1).max(1))
        } else {
            String::new()
        };
        return ResolvedScalar {
            value,
            style: Some(style),
            comment: header.comment,
            range: [start, end, end],
        };
    }

    let mut trim_indent = scalar.indent + header.indent;
    let mut offset = scalar.offset + header.length;
    let mut content_start = 0;
    for (i, (indent, content)) in lines.iter().enumerate().take(chomp_start) {
        if is_blank(content) {
            if header.indent == 0 && indent.len() > trim_indent {
                trim_indent = indent.len();
            }
        } else {
            if indent.len() < trim_indent {
                let at = offset + indent.len();
                diag.error(
                    span(at, at + 1),
                    ErrorCode::MissingChar,
                    "Block scalars with more-indented leading empty lines must use an explicit indentation indicator",
                );
            }
            if header.indent == 0 {
                trim_indent = indent.len();
            }
            content_start = i;
            if trim_indent == 0 && !at_root {
                diag.error(
                    span(offset, offset + 1),
                    ErrorCode::BadIndent,
                    "Block scalar values in collections must be indented",
                );
            }
            break;
        }
        offset += indent.len() + content.len() + 1;
    }

    for i in (chomp_start..lines.len()).rev() {
        if lines[i].0.len() > trim_indent {
            chomp_start = i + 1;
        }
    }

    let slice_indent = |indent: &str| indent.get(trim_indent..).unwrap_or_default().to_owned();
    let mut value = String::new();
    let mut sep = "";
    let mut prev_more_indented = false;
    for (indent, _) in &lines[..content_start] {
        value.push_str(&slice_indent(indent));
        value.push('\n');
    }
    for &(indent, content) in &lines[content_start..chomp_start] {
        offset += indent.len() + content.len() + 1;
        let crlf = content.ends_with('\r');
        let content = content.strip_suffix('\r').unwrap_or(content);
        let mut indent = indent;
        if !content.is_empty() && indent.len() < trim_indent {
            let what = if header.indent > 0 {
                "explicit indentation indicator"
            } else {
                "first line"
            };
            let at = offset - content.len() - if crlf { 2 } else { 1 };
            diag.error(
                span(at, at + 1),
                ErrorCode::BadIndent,
                format!("Block scalar lines must not be less indented than their {what}"),
            );
            indent = "";
        }
        if style == ScalarStyle::BlockLiteral {
            value.push_str(sep);
            value.push_str(&slice_indent(indent));
            value.push_str(content);
            sep = "\n";
        } else if indent.len() > trim_indent || content.starts_with('\t') {
            // more-indented lines keep their line breaks
            if sep == " " {
                sep = "\n";
            } else if !prev_more_indented && sep == "\n" {
                sep = "\n\n";
            }
            value.push_str(sep);
            value.push_str(&slice_indent(indent));
            value.push_str(content);
            sep = "\n";
            prev_more_indented = true;
        } else if content.is_empty() {
            if sep == "\n" {
                value.push('\n');
            } else {
                sep = "\n";
            }
        } else {
            value.push_str(sep);
            value.push_str(content);
            sep = " ";
            prev_more_indented = false;
        }
    }

    match header.chomp {
        Some('-') => {}
        Some('+') => {
            for (indent, _) in &lines[chomp_start..] {
                value.push('\n');
                value.push_str(&slice_indent(indent));
            }
            if !value.ends_with('\n') {
                value.push('\n');
            }
        }
        _ => value.push('\n'),
    }

    ResolvedScalar {
        value,
        style: Some(style),
        comment: header.comment,
        range: [start, end, end],
    }
}
