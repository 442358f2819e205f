// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Error types.
//!
//! Problems found in the YAML source are collected as [`YamlError`] values on
//! the [`Document`](crate::Document) and never abort processing. Only misuse
//! of the API (bad options, stringifying a broken document) is returned as a
//! hard error.

use crate::span::{LineCounter, LinePos, Span};

/// Machine-readable classification of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Anchor or tag applied to an alias.
    AliasProps,
    /// Alias to an undefined or later anchor.
    BadAlias,
    /// Collection tag used on the wrong kind of collection.
    BadCollectionType,
    BadDirective,
    /// Invalid escape sequence in a double-quoted scalar.
    BadDqEscape,
    BadIndent,
    /// Properties in a position where they cannot apply.
    BadPropOrder,
    /// Plain scalar starting with a reserved indicator.
    BadScalarStart,
    BlockAsImplicitKey,
    BlockInFlow,
    DuplicateKey,
    /// Internal parser state that should not be reachable.
    Impossible,
    KeyOver1024Chars,
    MissingChar,
    MultilineImplicitKey,
    MultipleAnchors,
    MultipleDocs,
    MultipleTags,
    NonStringKey,
    TabAsIndent,
    TagResolveFailed,
    UnexpectedToken,
    /// Alias expansion exceeded the configured limit.
    ExcessiveAliasCount,
    /// Collections nested deeper than the configured limit.
    ExcessiveDepth,
}

impl ErrorCode {
    /// The stable upper-case identifier of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AliasProps => "ALIAS_PROPS",
            Self::BadAlias => "BAD_ALIAS",
            Self::BadCollectionType => "BAD_COLLECTION_TYPE",
            Self::BadDirective => "BAD_DIRECTIVE",
            Self::BadDqEscape => "BAD_DQ_ESCAPE",
            Self::BadIndent => "BAD_INDENT",
            Self::BadPropOrder => "BAD_PROP_ORDER",
            Self::BadScalarStart => "BAD_SCALAR_START",
            Self::BlockAsImplicitKey => "BLOCK_AS_IMPLICIT_KEY",
            Self::BlockInFlow => "BLOCK_IN_FLOW",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::Impossible => "IMPOSSIBLE",
            Self::KeyOver1024Chars => "KEY_OVER_1024_CHARS",
            Self::MissingChar => "MISSING_CHAR",
            Self::MultilineImplicitKey => "MULTILINE_IMPLICIT_KEY",
            Self::MultipleAnchors => "MULTIPLE_ANCHORS",
            Self::MultipleDocs => "MULTIPLE_DOCS",
            Self::MultipleTags => "MULTIPLE_TAGS",
            Self::NonStringKey => "NON_STRING_KEY",
            Self::TabAsIndent => "TAB_AS_INDENT",
            Self::TagResolveFailed => "TAG_RESOLVE_FAILED",
            Self::UnexpectedToken => "UNEXPECTED_TOKEN",
            Self::ExcessiveAliasCount => "EXCESSIVE_ALIAS_COUNT",
            Self::ExcessiveDepth => "EXCESSIVE_DEPTH",
        }
    }

    /// Get a suggestion for how to fix this error.
    #[must_use]
    pub const fn suggestion(self) -> Option<&'static str> {
        match self {
            Self::BadIndent => {
                Some("YAML uses spaces for indentation; ensure consistent indentation levels")
            }
            Self::TabAsIndent => {
                Some("Replace tabs with spaces; YAML requires space-based indentation")
            }
            Self::MissingChar => Some("Add the missing closing character"),
            Self::BadDqEscape => {
                Some("Valid escape sequences: \\n, \\r, \\t, \\\\, \\\", \\0, \\x##, \\u####")
            }
            Self::DuplicateKey => Some("Remove or rename one of the duplicate keys"),
            Self::BadAlias => Some("Define the anchor with &name before referencing it with *name"),
            Self::MultipleAnchors => {
                Some("A node can only have one anchor; remove the extra &anchor")
            }
            Self::MultipleTags => Some("A node can only have one tag; remove the extra !tag"),
            Self::AliasProps => Some(
                "Aliases (*name) cannot have anchors or tags; apply them to the original value",
            ),
            Self::MultilineImplicitKey | Self::KeyOver1024Chars => {
                Some("Use an explicit key indicator '? ' for long or multi-line keys")
            }
            Self::MultipleDocs => Some("Use parse_all_documents() for multi-document streams"),
            Self::ExcessiveAliasCount => {
                Some("Reduce nested aliases or raise the max_alias_count option")
            }
            Self::ExcessiveDepth => Some("Flatten the structure or raise the max_depth option"),
            Self::BadCollectionType
            | Self::BadDirective
            | Self::BadPropOrder
            | Self::BadScalarStart
            | Self::BlockAsImplicitKey
            | Self::BlockInFlow
            | Self::Impossible
            | Self::NonStringKey
            | Self::TagResolveFailed
            | Self::UnexpectedToken => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic collected while lexing, parsing, composing or converting a
/// document.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlError {
    pub code: ErrorCode,
    pub message: String,
    /// Byte range in the source.
    pub span: Span,
    /// 1-indexed start and end positions, filled in when pretty errors are
    /// enabled.
    pub line_pos: Option<(LinePos, LinePos)>,
    pub warning: bool,
}

impl YamlError {
    #[must_use]
    pub fn new(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            line_pos: None,
            warning: false,
        }
    }

    #[must_use]
    pub fn warning(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            warning: true,
            ..Self::new(code, span, message)
        }
    }

    /// Attach line/column positions computed from `counter`.
    #[must_use]
    pub fn with_line_pos(mut self, counter: &LineCounter, source: &str) -> Self {
        self.line_pos = Some((
            counter.line_pos(self.span.start, Some(source)),
            counter.line_pos(self.span.end, Some(source)),
        ));
        self
    }

    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        self.code.suggestion()
    }

    /// Render the message with a source excerpt and a caret run under the
    /// offending range.
    ///
    /// Lines longer than 80 columns are cut around the caret. When the error
    /// points at the start of a line the previous line is shown as context.
    #[must_use]
    pub fn pretty(&self, source: &str) -> String {
        let counter = LineCounter::from_source(source);
        let start = counter.line_pos(self.span.start, Some(source));
        let end = counter.line_pos(self.span.end, Some(source));
        let mut out = format!(
            "{}: {} at line {}, column {}",
            self.code, self.message, start.line, start.col
        );

        let line_text = |line: usize| -> String {
            let from = counter.line_start(line).unwrap_or(source.len());
            let to = counter.line_start(line + 1).unwrap_or(source.len());
            source
                .get(from..to)
                .unwrap_or_default()
                .trim_end_matches(['\n', '\r'])
                .to_owned()
        };

        let mut chars: Vec<char> = line_text(start.line).chars().collect();
        let mut caret = start.col - 1;
        if caret >= 60 && chars.len() > 80 {
            let trim_start = (caret - 39).min(chars.len() - 79);
            let mut trimmed = vec!['…'];
            trimmed.extend_from_slice(&chars[trim_start..]);
            chars = trimmed;
            caret -= trim_start - 1;
        }
        if chars.len() > 80 {
            chars.truncate(79);
            chars.push('…');
        }
        let mut excerpt: String = chars.iter().collect();
        let leading_blank = chars.iter().take(caret).all(|&ch| ch == ' ');
        if start.line > 1 && leading_blank {
            let mut prev: String = line_text(start.line - 1);
            if prev.chars().count() > 80 {
                prev = prev.chars().take(79).collect::<String>() + "…";
            }
            excerpt = format!("{prev}\n{excerpt}");
        }
        if excerpt.chars().any(|ch| ch != ' ' && ch != '\n') {
            let mut count = 1;
            if end.line == start.line && end.col > start.col {
                count = (end.col - start.col).min(80usize.saturating_sub(caret)).max(1);
            }
            out.push_str(":\n\n");
            out.push_str(&excerpt);
            out.push('\n');
            out.push_str(&" ".repeat(caret));
            out.push_str(&"^".repeat(count));
            out.push('\n');
        }
        out
    }
}

impl std::fmt::Display for YamlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some((start, _)) = self.line_pos {
            write!(f, " at line {}, column {}", start.line, start.col)?;
        }
        Ok(())
    }
}

impl std::error::Error for YamlError {}

/// Error returned by [`parse`](crate::parse) when strict error handling is
/// requested and the source contains errors.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum ParseError {
    #[display("{_0}")]
    Yaml(YamlError),
    #[display("{_0}")]
    Options(OptionsError),
}

impl std::error::Error for ParseError {}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum OptionsError {
    #[display("Unknown schema \"{_0}\"; use one of failsafe, json, core, yaml-1.1")]
    UnknownSchema(String),
    #[display("Unsupported YAML version {_0}")]
    UnsupportedVersion(String),
    #[display("Invalid indent {_0}; must be a positive integer")]
    InvalidIndent(usize),
    #[display("Unsupported default string type {_0}")]
    InvalidStringType(String),
}

impl std::error::Error for OptionsError {}

/// Errors that abort stringification.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::From)]
pub enum StringifyError {
    #[display("Document with errors cannot be stringified: {}", _0.first().map(ToString::to_string).unwrap_or_default())]
    DocumentHasErrors(Vec<YamlError>),
    #[display("Unresolved alias (the anchor must be set before the alias): {_0}")]
    #[from(ignore)]
    UnresolvedAlias(String),
    #[display("Tag not resolved for {_0} value")]
    #[from(ignore)]
    UnresolvedTag(String),
    #[display("Anchor must not contain whitespace or control characters: {_0}")]
    #[from(ignore)]
    InvalidAnchor(String),
    #[display("With simple keys, {_0}")]
    #[from(ignore)]
    SimpleKeys(&'static str),
    #[display("{_0}")]
    Options(OptionsError),
}

impl std::error::Error for StringifyError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::span;

    #[test]
    fn test_error_display() {
        let err = YamlError::new(ErrorCode::DuplicateKey, span(0, 3), "Map keys must be unique");
        assert_eq!(err.to_string(), "DUPLICATE_KEY: Map keys must be unique");
        assert!(!err.warning);
        let src = "a: 1\na: 2\n";
        let err = YamlError::new(ErrorCode::DuplicateKey, span(5, 6), "Map keys must be unique")
            .with_line_pos(&LineCounter::from_source(src), src);
        assert_eq!(
            err.to_string(),
            "DUPLICATE_KEY: Map keys must be unique at line 2, column 1"
        );
    }

    #[test]
    fn test_code_names() {
        let test_cases = [
            (ErrorCode::BadAlias, "BAD_ALIAS"),
            (ErrorCode::KeyOver1024Chars, "KEY_OVER_1024_CHARS"),
            (ErrorCode::BadDqEscape, "BAD_DQ_ESCAPE"),
            (ErrorCode::ExcessiveAliasCount, "EXCESSIVE_ALIAS_COUNT"),
            (ErrorCode::ExcessiveDepth, "EXCESSIVE_DEPTH"),
        ];
        for (code, expected) in test_cases {
            assert_eq!(code.as_str(), expected);
        }
    }

    #[test]
    fn test_error_suggestions() {
        for code in [
            ErrorCode::BadIndent,
            ErrorCode::TabAsIndent,
            ErrorCode::DuplicateKey,
            ErrorCode::BadAlias,
            ErrorCode::MultipleDocs,
        ] {
            assert!(code.suggestion().is_some(), "{code:?} should have a suggestion");
        }
        assert!(ErrorCode::Impossible.suggestion().is_none());
    }

    #[test]
    fn test_pretty_excerpt() {
        let src = "key: value\nother: [1, 2\n";
        let err = YamlError::new(ErrorCode::MissingChar, span(18, 22), "Expected ] here");
        let pretty = err.pretty(src);
        assert_eq!(
            pretty,
            "MISSING_CHAR: Expected ] here at line 2, column 8:\n\nother: [1, 2\n       ^^^^\n"
        );
    }

    #[test]
    fn test_pretty_includes_previous_line_at_line_start() {
        let src = "a:\n  - b\n- c\n";
        let err = YamlError::new(ErrorCode::BadIndent, span(9, 10), "Bad indentation");
        let pretty = err.pretty(src);
        assert!(pretty.contains("  - b\n- c\n^\n"), "{pretty}");
    }

    #[test]
    fn test_pretty_trims_long_lines() {
        let src = format!("{}X{}", "a".repeat(100), "b".repeat(100));
        let err = YamlError::new(ErrorCode::UnexpectedToken, span(100, 101), "Unexpected X");
        let pretty = err.pretty(&src);
        let excerpt = pretty.lines().nth(2).unwrap_or_default();
        assert!(excerpt.starts_with('…'));
        assert!(excerpt.ends_with('…'));
        assert_eq!(excerpt.chars().count(), 80);
        let caret_line = pretty.lines().nth(3).unwrap_or_default();
        let caret_col = caret_line.find('^').unwrap_or_default();
        assert_eq!(excerpt.chars().nth(caret_col), Some('X'));
    }

    #[test]
    fn test_thrown_errors_display() {
        let err = StringifyError::UnresolvedAlias("x".to_owned());
        assert_eq!(
            err.to_string(),
            "Unresolved alias (the anchor must be set before the alias): x"
        );
        let err: StringifyError = OptionsError::InvalidIndent(0).into();
        assert_eq!(err.to_string(), "Invalid indent 0; must be a positive integer");
        let err: ParseError =
            YamlError::new(ErrorCode::BadAlias, span(0, 2), "Unresolved alias").into();
        assert_eq!(err.to_string(), "BAD_ALIAS: Unresolved alias");
    }
}

/// Misuse of the document path API.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PathError {
    #[display("Expected YAML collection at {at}. Remaining path: {remaining}")]
    NotACollection { at: String, remaining: String },
    #[display("Expected a map or sequence to add to, found {_0}")]
    CannotAdd(&'static str),
}

impl std::error::Error for PathError {}
