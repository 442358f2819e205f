// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Line folding for flow, quoted and folded block scalars.

use std::collections::HashSet;

/// How a scalar may be folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldMode {
    /// Plain and single-quoted scalars: fold at single spaces.
    Flow,
    /// Folded block scalars: more-indented lines are never folded.
    Block,
    /// Double-quoted scalars: may also break with a `\` continuation, but
    /// never inside an escape sequence.
    Quoted,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FoldOptions {
    /// Column at which the text starts on its first line, if known.
    pub indent_at_start: Option<usize>,
    /// Zero disables folding.
    pub line_width: usize,
    pub min_content_width: usize,
}

/// Fold `text` so that lines fit within the line width, continuing on new
/// lines prefixed with `indent`.
#[must_use]
pub fn fold_flow_lines(text: &str, indent: &str, mode: FoldMode, options: &FoldOptions) -> String {
    fold(text, indent, mode, options).0
}

/// As [`fold_flow_lines`], also reporting whether some line could not be
/// brought within the width.
pub(crate) fn fold(text: &str, indent: &str, mode: FoldMode, options: &FoldOptions) -> (String, bool) {
    #[allow(clippy::cast_possible_wrap, reason = "text lengths fit in i64")]
    let (line_width, mut min_content_width, indent_len) = (
        options.line_width as i64,
        options.min_content_width as i64,
        indent.chars().count() as i64,
    );
    if line_width <= 0 {
        return (text.to_owned(), false);
    }
    if line_width < min_content_width {
        min_content_width = 0;
    }
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;
    let end_step = (1 + min_content_width).max(1 + line_width - indent_len);
    if len <= end_step {
        return (text.to_owned(), false);
    }
    let at = |i: i64| usize::try_from(i).ok().and_then(|i| chars.get(i).copied());

    let mut folds: Vec<i64> = Vec::new();
    let mut escaped_folds: HashSet<i64> = HashSet::new();
    let mut end = line_width - indent_len;
    if let Some(at_start) = options.indent_at_start {
        #[allow(clippy::cast_possible_wrap, reason = "column fits in i64")]
        let at_start = at_start as i64;
        if at_start > line_width - min_content_width.max(2) {
            folds.push(0);
        } else {
            end = line_width - at_start;
        }
    }
    let mut split: Option<i64> = None;
    let mut prev: Option<char> = None;
    let mut overflow = false;
    let mut i: i64 = -1;
    let mut esc_start: i64 = -1;
    let mut esc_end: i64 = -1;
    if mode == FoldMode::Block {
        i = consume_more_indented(&chars, i, indent_len);
        if i != -1 {
            end = i + end_step;
        }
    }
    loop {
        i += 1;
        let Some(mut ch) = at(i) else {
            break;
        };
        if mode == FoldMode::Quoted && ch == '\\' {
            esc_start = i;
            i += match at(i + 1) {
                Some('x') => 3,
                Some('u') => 5,
                Some('U') => 9,
                _ => 1,
            };
            esc_end = i;
        }
        if ch == '\n' {
            if mode == FoldMode::Block {
                i = consume_more_indented(&chars, i, indent_len);
            }
            end = i + indent_len + end_step;
            split = None;
        } else {
            let is_space = |c: Option<char>| matches!(c, Some(' ' | '\n' | '\t'));
            if ch == ' ' && prev.is_some() && !is_space(prev) && at(i + 1).is_some() && !is_space(at(i + 1)) {
                // a single space between non-spaces can become a line break
                split = Some(i);
            }
            if i >= end {
                if let Some(at_split) = split.take() {
                    folds.push(at_split);
                    end = at_split + end_step;
                } else if mode == FoldMode::Quoted {
                    // trailing white-space may stretch past the width
                    while matches!(prev, Some(' ' | '\t')) {
                        prev = Some(ch);
                        i += 1;
                        overflow = true;
                        match at(i) {
                            Some(next) => ch = next,
                            None => break,
                        }
                    }
                    let j = if i > esc_end + 1 { i - 2 } else { esc_start - 1 };
                    if j < 1 || escaped_folds.contains(&j) {
                        return (text.to_owned(), false);
                    }
                    folds.push(j);
                    escaped_folds.insert(j);
                    end = j + end_step;
                } else {
                    overflow = true;
                }
            }
        }
        prev = Some(ch);
    }
    if folds.is_empty() {
        return (text.to_owned(), overflow);
    }

    let slice = |from: i64, to: i64| -> String {
        let from = usize::try_from(from).unwrap_or(0).min(chars.len());
        let to = usize::try_from(to).unwrap_or(0).clamp(from, chars.len());
        chars[from..to].iter().collect()
    };
    let mut res = slice(0, folds[0]);
    for (idx, &at_fold) in folds.iter().enumerate() {
        let next = folds.get(idx + 1).copied().unwrap_or(len);
        if at_fold == 0 {
            res = format!("\n{indent}{}", slice(0, next));
        } else {
            if mode == FoldMode::Quoted && escaped_folds.contains(&at_fold) {
                res.push_str(&slice(at_fold, at_fold + 1));
                res.push('\\');
            }
            res.push('\n');
            res.push_str(indent);
            res.push_str(&slice(at_fold + 1, next));
        }
    }
    (res, overflow)
}

/// Skip lines indented deeper than `indent`, returning the position of the
/// last line break consumed, or `i` if none.
fn consume_more_indented(chars: &[char], mut i: i64, indent: i64) -> i64 {
    let at = |i: i64| usize::try_from(i).ok().and_then(|i| chars.get(i).copied());
    let mut end = i;
    let mut start = i + 1;
    let mut ch = at(start);
    while matches!(ch, Some(' ' | '\t')) {
        if i < start + indent {
            i += 1;
            ch = at(i);
        } else {
            loop {
                i += 1;
                ch = at(i);
                if matches!(ch, None | Some('\n')) {
                    break;
                }
            }
            end = i;
            start = i + 1;
            ch = at(start);
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(line_width: usize) -> FoldOptions {
        FoldOptions {
            indent_at_start: None,
            line_width,
            min_content_width: 0,
        }
    }

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(fold_flow_lines("abc def", "", FoldMode::Flow, &options(80)), "abc def");
        assert_eq!(fold_flow_lines("abc def", "", FoldMode::Flow, &options(0)), "abc def");
    }

    #[test]
    fn test_flow_fold_at_spaces() {
        assert_eq!(
            fold_flow_lines("abcd efgh ijkl", "", FoldMode::Flow, &options(10)),
            "abcd efgh\nijkl"
        );
        assert_eq!(
            fold_flow_lines("abcd efgh ijkl", "  ", FoldMode::Flow, &options(10)),
            "abcd\n  efgh\n  ijkl"
        );
    }

    #[test]
    fn test_unbreakable_text_overflows() {
        let (text, overflow) = fold("abcdefghijklmnop", "", FoldMode::Flow, &options(10));
        assert_eq!(text, "abcdefghijklmnop");
        assert!(overflow);
    }

    #[test]
    fn test_quoted_fold_keeps_escapes_whole() {
        let text = r#""\x01\x01\x01\x01\x01\x01""#;
        assert_eq!(
            fold_flow_lines(text, "", FoldMode::Quoted, &options(10)),
            "\"\\x01\\x01\\\n\\x01\\x01\\\n\\x01\\x01\""
        );
    }

    #[test]
    fn test_block_more_indented_lines_not_folded() {
        let text = "aaaa bbbb\n   cccc dddd eeee ffff";
        let (folded, _) = fold(text, "", FoldMode::Block, &options(10));
        assert!(folded.ends_with("   cccc dddd eeee ffff"));
    }
}
