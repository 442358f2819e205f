// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! A lossless YAML 1.1/1.2 engine.
//!
//! This crate provides:
//! - An incremental lexer and a concrete syntax tree that reproduces the
//!   source byte for byte
//! - A composer building an editable document model with anchors, aliases,
//!   tags, comments and merge keys
//! - The failsafe, json, core and yaml-1.1 schemas, plus custom tags
//! - A stringifier that keeps comments and scalar styles across a round trip
//! - Problems collected on the document instead of aborting
//!
//! # Example
//!
//! ```
//! use yaml_document::{Node, Options, parse_document};
//!
//! let src = "# config\nname: app\nports: [80, 443]\n";
//! let mut doc = parse_document(src, &Options::default()).unwrap();
//! assert!(doc.errors.is_empty());
//!
//! doc.set("name", Node::from("api")).unwrap();
//! doc.add_in(&["ports".into()], Node::from(8080_i64)).unwrap();
//!
//! let out = doc.to_string().unwrap();
//! assert!(out.starts_with("# config\n"));
//! assert!(out.contains("ports: [ 80, 443, 8080 ]"));
//! ```

mod compose;
pub mod cst;
mod directives;
mod document;
mod error;
mod lexer;
mod options;
mod parser;
pub mod schema;
mod span;
mod stringify;
mod value;


pub use compose::{Composer, StreamInfo};
pub use cst::CstToken;
pub use directives::{Directives, YamlDirective};
pub use document::{
    Alias, Document, MapKind, Node, NodeMeta, NumberFormat, Pair, PathSegment, Scalar, ScalarStyle,
    ScalarValue, SeqKind, Timestamp, VisitControl, VisitKey, YamlMap, YamlSeq, visit,
};
pub use error::{ErrorCode, OptionsError, ParseError, PathError, StringifyError, YamlError};
pub use lexer::{LexState, Lexer, OwnedToken, Token, TokenKind, Tokens, tokenize};
pub use options::{BlockQuote, CollectionStyle, CustomTags, Options, SchemaName, UniqueKeys, Version};
pub use parser::{CstTokens, Parser, parse_cst};
pub use schema::{Schema, TagDefinition};
pub use span::{LineCounter, LinePos, Span, Spanned};
pub use stringify::{FoldMode, FoldOptions, fold_flow_lines};
pub use value::Value;

use crate::span::span;

/// Parse every document in `src`.
///
/// Syntax problems never abort: they are collected on the document they
/// occur in. A stream without documents yields an empty `Vec`, unless it
/// holds stream-level errors, which are then reported on an empty document.
pub fn parse_all_documents(src: &str, options: &Options) -> Result<Vec<Document>, OptionsError> {
    options.validate()?;
    let mut composer = Composer::new(options.clone())?;
    let mut parser = Parser::new();
    let mut tokens = parser.parse(src, false);
    let mut docs: Vec<Document> = tokens.by_ref().filter_map(|token| composer.next(token)).collect();
    let force_doc = docs.is_empty() && !composer.stream_info().errors.is_empty();
    docs.extend(composer.end(force_doc, src.len()));
    if options.pretty_errors {
        for doc in &mut docs {
            add_line_positions(doc, tokens.line_counter(), src);
        }
    }
    log::debug!("parsed {} documents from {} bytes", docs.len(), src.len());
    Ok(docs)
}

/// Parse a single document.
///
/// An empty source gives a document without contents. If `src` holds more
/// than one document, the first is returned with a `MultipleDocs` error and
/// the rest are discarded.
pub fn parse_document(src: &str, options: &Options) -> Result<Document, OptionsError> {
    options.validate()?;
    let mut composer = Composer::new(options.clone())?;
    let mut parser = Parser::new();
    let mut tokens = parser.parse(src, false);
    let mut found: Vec<Document> = Vec::with_capacity(2);
    for token in tokens.by_ref() {
        found.extend(composer.next(token));
        if found.len() > 1 {
            break;
        }
    }
    if found.len() < 2 {
        found.extend(composer.end(true, src.len()));
    }
    let complete = found.len() < 2;

    let mut found = found.into_iter();
    let mut doc = match found.next() {
        Some(doc) => doc,
        None => {
            let mut empty = Document::new(&Value::Null, options)?;
            empty.contents = None;
            empty
        }
    };
    if let Some(extra) = found.next() {
        doc.errors.push(YamlError::new(
            ErrorCode::MultipleDocs,
            span(extra.range[0], extra.range[1]),
            "Source contains multiple documents; please use parse_all_documents()",
        ));
    }
    if options.pretty_errors {
        if complete {
            add_line_positions(&mut doc, tokens.line_counter(), src);
        } else {
            add_line_positions(&mut doc, &LineCounter::from_source(src), src);
        }
    }
    log::debug!("parsed document from {} bytes", src.len());
    Ok(doc)
}

/// Parse a single document straight to a native [`Value`].
///
/// Warnings are logged. With `options.strict` the first error is returned,
/// otherwise errors are dropped and whatever could be composed is converted.
pub fn parse(src: &str, options: &Options) -> Result<Value, ParseError> {
    let mut doc = parse_document(src, options)?;
    for warning in &doc.warnings {
        log::warn!("{warning}");
    }
    if !doc.errors.is_empty() {
        if options.strict {
            return Err(doc.errors.swap_remove(0).into());
        }
        log::debug!("ignoring {} errors in non-strict parse", doc.errors.len());
        doc.errors.clear();
    }
    Ok(doc.to_native()?)
}

/// Render `value` as a YAML document.
pub fn stringify(value: &Value, options: &Options) -> Result<String, StringifyError> {
    Document::new(value, options)?.to_string()
}

fn add_line_positions(doc: &mut Document, counter: &LineCounter, src: &str) {
    for list in [&mut doc.errors, &mut doc.warnings] {
        *list = std::mem::take(list)
            .into_iter()
            .map(|error| error.with_line_pos(counter, src))
            .collect();
    }
}
