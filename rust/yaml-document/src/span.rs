// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Span types and line/column lookup for diagnostics.

use chumsky::span::SimpleSpan;
use chumsky::span::Span as _;

/// A span representing a byte range in the source text.
///
/// This is an alias for chumsky's `SimpleSpan`, which tracks byte offsets.
/// The span is a half-open range `[start, end)`.
pub type Span = SimpleSpan<usize>;

/// A value with an associated source span.
pub type Spanned<T> = (T, Span);

/// Build a span from a byte range.
#[must_use]
pub fn span(start: usize, end: usize) -> Span {
    Span::new((), start..end.max(start))
}

/// A 1-indexed line and column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct LinePos {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for LinePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Tracks the byte offsets at which each line starts.
///
/// The parser feeds newline offsets as it goes; lookups use binary search,
/// so the index stays cheap even for large streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCounter {
    line_starts: Vec<usize>,
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            line_starts: vec![0],
        }
    }

    /// Build an index for a complete source text.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        let mut counter = Self::new();
        for (idx, _) in source.match_indices('\n') {
            counter.add_newline(idx + 1);
        }
        counter
    }

    /// Record that a new line starts at `offset`.
    pub fn add_newline(&mut self, offset: usize) {
        match self.line_starts.last() {
            Some(&last) if last >= offset => {}
            _ => self.line_starts.push(offset),
        }
    }

    /// Number of lines seen so far.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset at which the 1-indexed `line` begins.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|idx| self.line_starts.get(idx).copied())
    }

    /// Convert a byte offset into a 1-indexed line/column pair.
    ///
    /// Columns count characters when `source` is given and bytes otherwise.
    #[must_use]
    pub fn line_pos(&self, offset: usize, source: Option<&str>) -> LinePos {
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let start = self.line_starts.get(idx).copied().unwrap_or(0);
        let col = match source.and_then(|src| src.get(start..offset)) {
            Some(text) => text.chars().count(),
            None => offset.saturating_sub(start),
        };
        LinePos {
            line: idx + 1,
            col: col + 1,
        }
    }
}
