// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! String scalar styles: plain, single-quoted, double-quoted and block.

use super::fold::{FoldMode, FoldOptions, fold};
use super::{Emitted, StringifyContext, stringify_comment};
use crate::document::ScalarStyle;
use crate::options::BlockQuote;
use crate::schema::pattern_test;

pattern_test!(
    plain_forbidden,
    r"^[\n\t ,\[\]{}#&*!|>'\x22%@`]|^[?-]$|^[?-][ \t]|[\n:][ \t]|[ \t]\n|[\n\t ]#|[\n\t :]$"
);

fn fold_options(ctx: &StringifyContext<'_>, is_block: bool) -> FoldOptions {
    FoldOptions {
        indent_at_start: if is_block {
            Some(ctx.indent.len())
        } else {
            ctx.indent_at_start
        },
        line_width: ctx.options.line_width,
        min_content_width: ctx.options.min_content_width,
    }
}

fn contains_document_marker(value: &str) -> bool {
    value
        .split('\n')
        .any(|line| line.starts_with('%') || line.starts_with("---") || line.starts_with("..."))
}

/// Indentation for continuation lines of a flow scalar.
fn flow_indent(value: &str, ctx: &StringifyContext<'_>) -> String {
    if ctx.indent.is_empty() && contains_document_marker(value) {
        "  ".to_owned()
    } else {
        ctx.indent.clone()
    }
}

/// Insert `insert` after every run of line breaks.
fn after_newline_runs(value: &str, insert: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch == '\n' && chars.peek() != Some(&'\n') {
            out.push_str(insert);
        }
    }
    out
}

fn line_length_over_limit(value: &str, line_width: usize, indent_len: usize) -> bool {
    if line_width == 0 {
        return false;
    }
    let limit = line_width.saturating_sub(indent_len);
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= limit {
        return false;
    }
    let mut start = 0;
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '\n' {
            if i - start > limit {
                return true;
            }
            start = i + 1;
            if chars.len() - start <= limit {
                return false;
            }
        }
    }
    true
}

/// JSON string literal, with C1 controls and line separators escaped too.
fn json_quote(value: &str) -> String {
    let json = serde_json::Value::String(value.to_owned()).to_string();
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if matches!(ch, '\u{7f}'..='\u{9f}' | '\u{2028}' | '\u{2029}') {
            out.push_str(&format!("\\u{:04x}", u32::from(ch)));
        } else {
            out.push(ch);
        }
    }
    out
}

pub(super) fn double_quoted(value: &str, ctx: &StringifyContext<'_>) -> String {
    let json = json_quote(value);
    if ctx.options.double_quoted_as_json {
        return json;
    }
    let indent = flow_indent(value, ctx);
    let chars: Vec<char> = json.chars().collect();
    let at = |i: usize| chars.get(i).copied();
    let mut out = String::new();
    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        let mut ch = chars[i];
        if ch == ' ' && at(i + 1) == Some('\\') && at(i + 2) == Some('n') {
            // a space before a line break is escaped so folding keeps it
            out.extend(&chars[start..i]);
            out.push_str("\\ ");
            i += 1;
            start = i;
            ch = '\\';
        }
        if ch == '\\' {
            match at(i + 1) {
                Some('u') => {
                    out.extend(&chars[start..i]);
                    let code: String = chars[(i + 2).min(chars.len())..(i + 6).min(chars.len())]
                        .iter()
                        .collect();
                    match code.as_str() {
                        "0000" => out.push_str("\\0"),
                        "0007" => out.push_str("\\a"),
                        "000b" => out.push_str("\\v"),
                        "001b" => out.push_str("\\e"),
                        "0085" => out.push_str("\\N"),
                        "00a0" => out.push_str("\\_"),
                        "2028" => out.push_str("\\L"),
                        "2029" => out.push_str("\\P"),
                        _ => match code.strip_prefix("00") {
                            Some(byte) => {
                                out.push_str("\\x");
                                out.push_str(byte);
                            }
                            None => out.extend(&chars[i..(i + 6).min(chars.len())]),
                        },
                    }
                    i += 5;
                    start = i + 1;
                }
                Some('n') => {
                    if ctx.implicit_key
                        || at(i + 2) == Some('"')
                        || chars.len() < ctx.options.double_quoted_min_multiline_length
                    {
                        i += 1;
                    } else {
                        // folding eats the first line break
                        out.extend(&chars[start..i]);
                        out.push_str("\n\n");
                        while at(i + 2) == Some('\\') && at(i + 3) == Some('n') && at(i + 4) != Some('"') {
                            out.push('\n');
                            i += 2;
                        }
                        out.push_str(&indent);
                        if at(i + 2) == Some(' ') {
                            out.push('\\');
                        }
                        i += 1;
                        start = i + 1;
                    }
                }
                _ => i += 1,
            }
        }
        i += 1;
    }
    let text = if start > 0 {
        out.extend(&chars[start.min(chars.len())..]);
        out
    } else {
        json
    };
    if ctx.implicit_key {
        text
    } else {
        fold(&text, &indent, FoldMode::Quoted, &fold_options(ctx, false)).0
    }
}

fn single_quoted(value: &str, ctx: &StringifyContext<'_>) -> String {
    if ctx.options.single_quote == Some(false)
        || (ctx.implicit_key && value.contains('\n'))
        || [" \n", "\t\n", "\n ", "\n\t"].iter().any(|ws| value.contains(ws))
    {
        return double_quoted(value, ctx);
    }
    let indent = flow_indent(value, ctx);
    let body = after_newline_runs(&value.replace('\'', "''"), &format!("\n{indent}"));
    let text = format!("'{body}'");
    if ctx.implicit_key {
        return text;
    }
    match fold(&text, &indent, FoldMode::Flow, &fold_options(ctx, false)) {
        // no space to fold at; only a double-quoted scalar can break the line
        (_, true) => double_quoted(value, ctx),
        (folded, false) => folded,
    }
}

pub(super) fn quoted(value: &str, ctx: &StringifyContext<'_>) -> String {
    let single = match ctx.options.single_quote {
        Some(false) => false,
        prefer => {
            let has_double = value.contains('"');
            let has_single = value.contains('\'');
            if has_double != has_single {
                has_double
            } else {
                prefer == Some(true)
            }
        }
    };
    if single {
        single_quoted(value, ctx)
    } else {
        double_quoted(value, ctx)
    }
}

/// Undo the doubled line breaks around more-indented lines, whose breaks
/// a folded scalar keeps as they are.
fn unfold_more_indented(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let is_ws = |ch: char| matches!(ch, '\n' | '\t' | ' ');
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars.len() {
        let line_start = if i == 0 && matches!(chars[0], ' ' | '\t') {
            0
        } else if chars[i] == '\n' && matches!(chars.get(i + 1), Some(' ' | '\t')) {
            i + 1
        } else {
            out.push(chars[i]);
            i += 1;
            continue;
        };
        let line_end = chars[line_start..]
            .iter()
            .position(|&ch| ch == '\n')
            .map_or(chars.len(), |p| line_start + p);
        out.extend(&chars[line_start..line_end]);
        let run_end = chars[line_end..]
            .iter()
            .position(|&ch| !is_ws(ch))
            .map_or(chars.len(), |p| line_end + p);
        if run_end > line_end && chars[run_end - 1] == '\n' {
            out.extend(&chars[line_end..run_end - 1]);
            i = run_end;
        } else {
            i = line_end;
        }
    }
    out
}

fn block_string(
    value: &str,
    style: Option<ScalarStyle>,
    comment: Option<&str>,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> String {
    let block_quote = ctx.options.block_quote;
    let trailing_ws_line = value
        .rfind('\n')
        .is_some_and(|nl| {
            let tail = &value[nl + 1..];
            !tail.is_empty() && tail.chars().all(|ch| matches!(ch, ' ' | '\t'))
        });
    if block_quote == BlockQuote::Off || trailing_ws_line || value.chars().all(char::is_whitespace) {
        return quoted(value, ctx);
    }

    // chomping, from the white-space at the end
    let body_len = value.trim_end_matches(['\n', '\t', ' ']).len();
    let (body, end) = value.split_at(body_len);
    let chomp = match end.find('\n') {
        None => "-",
        Some(pos) if body.is_empty() || pos != end.len() - 1 => {
            out.chomp_keep = true;
            "+"
        }
        Some(_) => "",
    };

    // indentation indicator, from the white-space at the start
    let mut start_with_space = false;
    let mut start_nl: Option<usize> = None;
    for (idx, ch) in body.char_indices() {
        match ch {
            ' ' => start_with_space = true,
            '\n' => start_nl = Some(idx),
            _ => break,
        }
    }
    let indent = if !ctx.indent.is_empty() {
        ctx.indent.clone()
    } else if ctx.force_block_indent || start_with_space || contains_document_marker(value) {
        "  ".to_owned()
    } else {
        String::new()
    };
    let literal = match block_quote {
        BlockQuote::Literal => true,
        BlockQuote::Folded => false,
        _ => match style {
            Some(ScalarStyle::BlockFolded) => false,
            Some(ScalarStyle::BlockLiteral) => true,
            _ => !line_length_over_limit(value, ctx.options.line_width, indent.len()),
        },
    };

    let end = match end.strip_suffix('\n').unwrap_or(end) {
        "" => String::new(),
        tail => {
            // indent line breaks that are followed by more white-space
            let mut res = String::new();
            let mut chars = tail.chars().peekable();
            while let Some(ch) = chars.next() {
                res.push(ch);
                if ch == '\n' && chars.peek().is_some_and(|&next| next != '\n') {
                    res.push_str(&indent);
                }
            }
            res
        }
    };
    let (start, rest) = match start_nl {
        Some(nl) => body.split_at(nl + 1),
        None => ("", body),
    };
    let start = after_newline_runs(start, &indent);

    let mut header = String::new();
    if start_with_space {
        let indicator = indent.len().saturating_sub(ctx.parent_indent).clamp(1, 9);
        header.push_str(&indicator.to_string());
    }
    header.push_str(chomp);
    if let Some(comment) = comment {
        let mut single_line = String::with_capacity(comment.len());
        let mut in_break = false;
        for ch in comment.chars() {
            if matches!(ch, '\r' | '\n') {
                if !in_break && single_line.ends_with(' ') {
                    single_line.pop();
                }
                if !in_break {
                    single_line.push(' ');
                }
                in_break = true;
            } else {
                single_line.push(ch);
                in_break = false;
            }
        }
        header.push(' ');
        header.push_str(&stringify_comment(&single_line));
        out.comment = true;
    }

    if !literal {
        let mut doubled = String::with_capacity(rest.len());
        let mut prev_nl = false;
        for ch in rest.chars() {
            if ch == '\n' && !prev_nl {
                doubled.push('\n');
            }
            prev_nl = ch == '\n';
            doubled.push(ch);
        }
        let folded = after_newline_runs(&unfold_more_indented(&doubled), &indent);
        let (text, overflow) = fold(
            &format!("{start}{folded}{end}"),
            &indent,
            FoldMode::Block,
            &fold_options(ctx, true),
        );
        let literal_fallback =
            overflow && block_quote != BlockQuote::Folded && style != Some(ScalarStyle::BlockFolded);
        if !literal_fallback {
            return format!(">{header}\n{indent}{text}");
        }
    }
    let rest = after_newline_runs(rest, &indent);
    format!("|{header}\n{indent}{start}{rest}{end}")
}

fn plain(
    value: &str,
    style: Option<ScalarStyle>,
    comment: Option<&str>,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> String {
    let in_flow = ctx.in_flow == Some(true);
    if (ctx.implicit_key && value.contains('\n'))
        || (in_flow && value.contains(['[', ']', '{', '}', ',']))
    {
        return quoted(value, ctx);
    }
    if value.is_empty() || plain_forbidden(value) {
        return if ctx.implicit_key || in_flow || !value.contains('\n') {
            quoted(value, ctx)
        } else {
            block_string(value, style, comment, ctx, out)
        };
    }
    if !ctx.implicit_key && !in_flow && style != Some(ScalarStyle::Plain) && value.contains('\n') {
        return block_string(value, style, comment, ctx, out);
    }
    if contains_document_marker(value) {
        if ctx.indent.is_empty() {
            let mut forced = ctx.clone();
            forced.force_block_indent = true;
            return block_string(value, style, comment, &forced, out);
        } else if ctx.implicit_key && ctx.indent == ctx.indent_step {
            return quoted(value, ctx);
        }
    }
    let text = after_newline_runs(value, &format!("\n{}", ctx.indent));
    if ctx.actual_string && ctx.doc.schema.plain_resolves_as_non_string(&text, ctx.implicit_key) {
        return quoted(value, ctx);
    }
    if ctx.implicit_key {
        return text;
    }
    match fold(&text, &ctx.indent, FoldMode::Flow, &fold_options(ctx, false)) {
        (_, true) => double_quoted(value, ctx),
        (folded, false) => folded,
    }
}

/// Render a string scalar, picking a style that reads back as the same
/// string. `style` is the node's requested style, if any.
pub(super) fn stringify_string(
    value: &str,
    style: Option<ScalarStyle>,
    comment: Option<&str>,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> String {
    let needs_escapes = value
        .chars()
        .any(|ch| matches!(ch, '\x00'..='\x08' | '\x0b'..='\x1f' | '\u{7f}'..='\u{9f}'));
    let style = if needs_escapes {
        Some(ScalarStyle::QuoteDouble)
    } else {
        style
    };
    let chosen = style.unwrap_or(if ctx.implicit_key {
        ctx.options
            .default_key_type
            .unwrap_or(ctx.options.default_string_type)
    } else {
        ctx.options.default_string_type
    });
    match chosen {
        ScalarStyle::BlockFolded | ScalarStyle::BlockLiteral => {
            if ctx.implicit_key || ctx.in_flow == Some(true) {
                quoted(value, ctx)
            } else {
                block_string(value, Some(chosen), comment, ctx, out)
            }
        }
        ScalarStyle::QuoteDouble => double_quoted(value, ctx),
        ScalarStyle::QuoteSingle => single_quoted(value, ctx),
        ScalarStyle::Plain => plain(value, style, comment, ctx, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::options::Options;
    use crate::value::Value;

    fn render(value: &str, options: &Options, setup: impl FnOnce(&mut StringifyContext<'_>)) -> (String, Emitted) {
        let doc = Document::new(&Value::Null, options).unwrap();
        let mut ctx = StringifyContext::new(&doc);
        ctx.actual_string = true;
        setup(&mut ctx);
        let mut out = Emitted::default();
        let text = stringify_string(value, None, None, &ctx, &mut out);
        (text, out)
    }

    fn render_value(value: &str) -> String {
        render(value, &Options::default(), |ctx| {
            ctx.indent = "  ".to_owned();
        })
        .0
    }

    #[test]
    fn test_plain_when_safe() {
        assert_eq!(render_value("hello world"), "hello world");
        assert_eq!(render_value("a:b"), "a:b");
    }

    #[test]
    fn test_quotes_when_plain_is_ambiguous() {
        let test_cases = [
            ("true", "\"true\""),
            ("42", "\"42\""),
            ("", "\"\""),
            ("a: b", "\"a: b\""),
            ("- x", "\"- x\""),
            ("it's", "\"it's\""),
            ("say \"hi\" #1", "'say \"hi\" #1'"),
            ("\tlead", "\"\\tlead\""),
            ("bell\u{7}", "\"bell\\a\""),
        ];
        for (value, expected) in test_cases {
            assert_eq!(render_value(value), expected, "{value:?}");
        }
    }

    #[test]
    fn test_multiline_uses_block() {
        assert_eq!(render_value("line1\nline2\n"), "|\n  line1\n  line2");
        assert_eq!(render_value("a\nb"), "|-\n  a\n  b");
        let (text, out) = render("keep\n\n", &Options::default(), |ctx| {
            ctx.indent = "  ".to_owned();
        });
        assert_eq!(text, "|+\n  keep\n");
        assert!(out.chomp_keep);
    }

    #[test]
    fn test_block_indent_indicator() {
        let (text, _) = render("  indented\nnext\n", &Options::default(), |ctx| {
            ctx.indent = "  ".to_owned();
        });
        assert_eq!(text, "|2\n    indented\n  next");
    }

    #[test]
    fn test_implicit_key_never_multiline() {
        let (text, _) = render("a\nb", &Options::default(), |ctx| {
            ctx.implicit_key = true;
        });
        assert_eq!(text, "\"a\\nb\"");
    }

    #[test]
    fn test_single_quote_preference() {
        let options = Options {
            single_quote: Some(true),
            ..Options::default()
        };
        let (text, _) = render("true", &options, |_| {});
        assert_eq!(text, "'true'");
        let options = Options {
            single_quote: Some(false),
            ..Options::default()
        };
        let (text, _) = render("say \"hi\" #1", &options, |_| {});
        assert_eq!(text, "\"say \\\"hi\\\" #1\"");
    }

    #[test]
    fn test_folded_block_for_long_lines() {
        let long = format!("{}\n", "word ".repeat(30).trim_end());
        let (text, _) = render(&long, &Options::default(), |ctx| {
            ctx.indent = "  ".to_owned();
        });
        assert!(text.starts_with(">\n  word word"), "{text}");
        assert!(text.lines().all(|line| line.len() <= 80), "{text}");
    }

    #[test]
    fn test_unbreakable_text_switches_to_double_quotes() {
        let options = Options {
            line_width: 20,
            ..Options::default()
        };
        let long = "x".repeat(60);
        let (text, _) = render(&long, &options, |_| {});
        assert!(text.starts_with('"') && text.ends_with('"'), "{text}");
        assert!(text.lines().count() > 1, "{text}");
        assert!(text.lines().all(|line| line.chars().count() <= 20), "{text}");

        let options = Options {
            line_width: 20,
            default_string_type: ScalarStyle::QuoteSingle,
            ..Options::default()
        };
        let (text, _) = render(&long, &options, |_| {});
        assert!(text.starts_with('"'), "{text}");

        let (text, _) = render("fits in the width", &options, |_| {});
        assert_eq!(text, "'fits in the width'");
    }

    #[test]
    fn test_unfold_more_indented() {
        assert_eq!(unfold_more_indented("a\n\n  b\n\nc"), "a\n  b\nc");
        assert_eq!(unfold_more_indented("a\n\nb"), "a\n\nb");
    }
}
