// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Turn CST documents into [`Document`]s.
//!
//! The [`Composer`] is fed top-level CST tokens one at a time and hands back
//! each document once the next one starts or the stream ends. Stream-level
//! comments and directives are buffered in a prelude and attached to the
//! document that follows them. Every problem found on the way is collected
//! as a [`YamlError`] on the document it belongs to.

mod collections;
mod node;
mod props;
mod scalars;

use std::collections::HashSet;

use crate::cst::{CstDocument, CstToken, SourceToken};
use crate::directives::Directives;
use crate::document::{Document, Node};
use crate::error::{ErrorCode, OptionsError, YamlError};
use crate::lexer::TokenKind;
use crate::options::Options;
use crate::schema::Schema;
use crate::span::{Span, span};
use node::{compose_empty_node, compose_node};
use props::{Next, PropsContext, resolve_end, resolve_props};

/// Errors and warnings collected for the document being composed.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    pub errors: Vec<YamlError>,
    pub warnings: Vec<YamlError>,
}

impl Diagnostics {
    pub fn error(&mut self, span: Span, code: ErrorCode, message: impl Into<String>) {
        self.errors.push(YamlError::new(code, span, message));
    }

    pub fn warning(&mut self, span: Span, code: ErrorCode, message: impl Into<String>) {
        self.warnings.push(YamlError::warning(code, span, message));
    }

    pub fn report(&mut self, warning: bool, span: Span, code: ErrorCode, message: impl Into<String>) {
        if warning {
            self.warning(span, code, message);
        } else {
            self.error(span, code, message);
        }
    }
}

/// State shared while composing the nodes of one document.
pub(crate) struct ComposeContext<'a> {
    pub directives: &'a Directives,
    pub schema: &'a Schema,
    pub options: &'a Options,
    pub at_key: bool,
    pub at_root: bool,
    /// Number of collections currently being composed.
    pub depth: usize,
    /// Anchor names defined so far, in document order.
    pub anchors: HashSet<String>,
    pub diag: &'a mut Diagnostics,
}

impl ComposeContext<'_> {
    /// Resolve a tag token through the directives' handles.
    fn tag_name(&mut self, token: &SourceToken) -> Option<String> {
        let mut messages = Vec::new();
        let name = self
            .directives
            .tag_name(&token.source, &mut |msg| messages.push(msg));
        for message in messages {
            self.diag
                .error(token_span(token), ErrorCode::TagResolveFailed, message);
        }
        name
    }
}

fn at(offset: usize) -> Span {
    span(offset, offset + 1)
}

fn token_span(token: &SourceToken) -> Span {
    span(token.offset, token.end_offset().max(token.offset + 1))
}

fn cst_span(token: &CstToken) -> Span {
    span(token.offset(), token.end_offset().max(token.offset() + 1))
}

fn node_span(node: &Node) -> Span {
    node.meta()
        .range
        .map_or_else(|| at(0), |range| span(range[0], range[1]))
}

fn node_end(node: &Node) -> usize {
    node.meta().range.map_or(0, |range| range[2])
}

/// Leading comment of the prelude and whether a blank line followed it.
fn parse_prelude(prelude: &[String]) -> (String, bool) {
    let mut comment = String::new();
    let mut at_comment = false;
    let mut after_empty_line = false;
    let mut i = 0;
    while i < prelude.len() {
        let source = &prelude[i];
        if let Some(body) = source.strip_prefix('#') {
            if !comment.is_empty() {
                comment.push_str(if after_empty_line { "\n\n" } else { "\n" });
            }
            comment.push_str(if body.is_empty() { " " } else { body });
            at_comment = true;
            after_empty_line = false;
        } else if source.starts_with('%') {
            // skip the line break after a directive
            if !prelude.get(i + 1).is_some_and(|next| next.starts_with('#')) {
                i += 1;
            }
            at_comment = false;
        } else {
            if !at_comment {
                after_empty_line = true;
            }
            at_comment = false;
        }
        i += 1;
    }
    (comment, after_empty_line)
}

fn prepend_comment(target: &mut Option<String>, comment: &str) {
    *target = Some(match target.take() {
        Some(existing) => format!("{comment}\n{existing}"),
        None => comment.to_owned(),
    });
}

/// What is left of a stream after its last document.
#[derive(Debug)]
pub struct StreamInfo {
    pub comment: String,
    pub directives: Directives,
    pub errors: Vec<YamlError>,
    pub warnings: Vec<YamlError>,
}

/// Composes CST tokens into documents.
#[derive(Debug)]
pub struct Composer {
    directives: Directives,
    doc: Option<Document>,
    options: Options,
    schema: Schema,
    at_directives: bool,
    prelude: Vec<String>,
    diag: Diagnostics,
}

impl Composer {
    pub fn new(options: Options) -> Result<Self, OptionsError> {
        let schema = Schema::new(&options)?;
        Ok(Self {
            directives: Directives::for_version(options.version),
            doc: None,
            options,
            schema,
            at_directives: false,
            prelude: Vec::new(),
            diag: Diagnostics::default(),
        })
    }

    /// Feed one top-level CST token. Returns the previous document when this
    /// token starts a new one.
    pub fn next(&mut self, token: CstToken) -> Option<Document> {
        match token {
            CstToken::Directive(directive) => {
                let mut problems = Vec::new();
                self.directives
                    .add(&directive.source, &mut |offset, message, warning| {
                        problems.push((offset, message, warning));
                    });
                for (offset, message, warning) in problems {
                    self.diag.report(
                        warning,
                        span(directive.offset + offset, directive.end_offset()),
                        ErrorCode::BadDirective,
                        message,
                    );
                }
                self.prelude.push(directive.source);
                self.at_directives = true;
                None
            }
            CstToken::Document(cst_doc) => {
                let doc = self.compose_doc(&cst_doc);
                if self.at_directives && !doc.directives.doc_start {
                    self.diag.error(
                        span(cst_doc.offset, cst_doc.offset + 1),
                        ErrorCode::MissingChar,
                        "Missing directives-end/doc-start indicator line",
                    );
                }
                let doc = self.decorate(doc, false);
                self.at_directives = false;
                self.doc.replace(doc)
            }
            CstToken::Source(source) => {
                if matches!(source.kind, TokenKind::Comment | TokenKind::Newline) {
                    self.prelude.push(source.source);
                }
                None
            }
            CstToken::Error(error) => {
                let message = if error.source.is_empty() {
                    error.message
                } else {
                    let quoted = serde_json::to_string(&error.source).unwrap_or_default();
                    format!("{}: {quoted}", error.message)
                };
                let error_span = span(error.offset, error.offset + error.source.len().max(1));
                let error = YamlError::new(ErrorCode::UnexpectedToken, error_span, message);
                match &mut self.doc {
                    Some(doc) if !self.at_directives => doc.errors.push(error),
                    _ => self.diag.errors.push(error),
                }
                None
            }
            CstToken::DocEnd(end) => {
                let Some(mut doc) = self.doc.take() else {
                    self.diag.error(
                        span(end.offset, end.offset + end.source.len()),
                        ErrorCode::UnexpectedToken,
                        "Unexpected doc-end without preceding document",
                    );
                    return None;
                };
                doc.directives.doc_end = true;
                let (comment, end_offset) = resolve_end(
                    &end.end,
                    end.offset + end.source.len(),
                    doc.options.strict,
                    &mut self.diag,
                );
                let mut doc = self.decorate(doc, true);
                if !comment.is_empty() {
                    doc.comment = Some(match doc.comment.take() {
                        Some(existing) => format!("{existing}\n{comment}"),
                        None => comment,
                    });
                }
                doc.range[2] = end_offset;
                self.doc = Some(doc);
                None
            }
            other => {
                self.diag.error(
                    cst_span(&other),
                    ErrorCode::UnexpectedToken,
                    "Unsupported token at stream level",
                );
                None
            }
        }
    }

    /// Flush the last document. With `force_doc` an empty document is
    /// returned even for a stream without content.
    pub fn end(&mut self, force_doc: bool, end_offset: usize) -> Option<Document> {
        if let Some(doc) = self.doc.take() {
            return Some(self.decorate(doc, true));
        }
        if !force_doc {
            return None;
        }
        let directives = self.directives.at_document();
        let mut doc = Document::from_parts(directives, self.options.clone(), self.schema.clone());
        if self.at_directives {
            self.diag.error(
                at(end_offset),
                ErrorCode::MissingChar,
                "Missing directives-end indicator line",
            );
        }
        doc.range = [0, end_offset, end_offset];
        Some(self.decorate(doc, false))
    }

    /// Comment, directives and diagnostics left over after the last document.
    #[must_use]
    pub fn stream_info(&self) -> StreamInfo {
        StreamInfo {
            comment: parse_prelude(&self.prelude).0,
            directives: self.directives.clone(),
            errors: self.diag.errors.clone(),
            warnings: self.diag.warnings.clone(),
        }
    }

    /// Compose every document of `tokens`.
    pub fn compose(
        &mut self,
        tokens: impl IntoIterator<Item = CstToken>,
        force_doc: bool,
        end_offset: usize,
    ) -> Vec<Document> {
        let mut docs: Vec<Document> = tokens
            .into_iter()
            .filter_map(|token| self.next(token))
            .collect();
        docs.extend(self.end(force_doc, end_offset));
        docs
    }

    fn compose_doc(&mut self, token: &CstDocument) -> Document {
        let directives = self.directives.at_document();
        let (options, schema) =
            if directives.yaml.explicit && directives.yaml.version != self.options.version {
                let options = self.options.clone().with_version(directives.yaml.version);
                let schema = Schema::new(&options).unwrap_or_else(|_| self.schema.clone());
                (options, schema)
            } else {
                (self.options.clone(), self.schema.clone())
            };
        log::debug!(
            "composing document at {} with schema {}",
            token.offset,
            schema.name.as_str()
        );
        let mut doc = Document::from_parts(directives, options, schema);

        let value = token.value.as_deref();
        let props = resolve_props(
            &token.start,
            &PropsContext {
                flow: None,
                indicator: TokenKind::DocStart,
                next: Next::from_node(value).or_else(|| token.end.first().map(Next::Token)),
                offset: token.offset,
                parent_indent: 0,
                start_on_newline: true,
            },
            &mut self.diag,
        );
        if props.found.is_some() {
            doc.directives.doc_start = true;
            if matches!(value, Some(CstToken::BlockMap(_) | CstToken::BlockSeq(_))) && !props.has_newline {
                self.diag.error(
                    at(props.end),
                    ErrorCode::MissingChar,
                    "Block collection cannot start on same line with directives-end marker",
                );
            }
        }

        let contents = {
            let mut ctx = ComposeContext {
                directives: &doc.directives,
                schema: &doc.schema,
                options: &doc.options,
                at_key: false,
                at_root: true,
                depth: 0,
                anchors: HashSet::new(),
                diag: &mut self.diag,
            };
            match value {
                Some(value) => compose_node(&mut ctx, value, &props),
                None => compose_empty_node(&mut ctx, props.end, &token.start, &props),
            }
        };
        let content_end = node_end(&contents);
        let (comment, end) = resolve_end(&token.end, content_end, false, &mut self.diag);
        if !comment.is_empty() {
            doc.comment = Some(comment);
        }
        doc.contents = Some(contents);
        doc.range = [token.offset, content_end, end];
        doc
    }

    /// Attach the buffered prelude comment and diagnostics to `doc`.
    fn decorate(&mut self, mut doc: Document, after_doc: bool) -> Document {
        let (comment, after_empty_line) = parse_prelude(&self.prelude);
        if !comment.is_empty() {
            if after_doc {
                doc.comment = Some(match doc.comment.take() {
                    Some(existing) => format!("{existing}\n{comment}"),
                    None => comment,
                });
            } else if after_empty_line || doc.directives.doc_start || doc.contents.is_none() {
                doc.comment_before = Some(comment);
            } else if let Some(contents) = &mut doc.contents {
                match contents {
                    Node::Map(map) if !map.flow && map.items.first().is_some_and(|p| p.key.is_some()) => {
                        if let Some(key) = map.items[0].key.as_mut() {
                            prepend_comment(&mut key.meta_mut().comment_before, &comment);
                        }
                    }
                    Node::Seq(seq) if !seq.flow && !seq.items.is_empty() => {
                        prepend_comment(&mut seq.items[0].meta_mut().comment_before, &comment);
                    }
                    other => prepend_comment(&mut other.meta_mut().comment_before, &comment),
                }
            }
        }

        let diag = std::mem::take(&mut self.diag);
        if after_doc {
            doc.errors.extend(diag.errors);
            doc.warnings.extend(diag.warnings);
        } else {
            doc.errors = diag.errors;
            doc.warnings = diag.warnings;
        }
        self.prelude.clear();
        doc
    }
}
