// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Block and flow collections.

use super::node::{compose_empty_node, compose_node};
use super::props::{Next, PropsContext, contains_newline, resolve_end, resolve_props};
use super::{ComposeContext, at, cst_span, node_end, node_span, token_span};
use crate::cst::{BlockMap, BlockSeq, CstToken, FlowCollection};
use crate::document::{Node, Pair, YamlMap, YamlSeq};
use crate::error::ErrorCode;
use crate::lexer::TokenKind;
use crate::options::UniqueKeys;

const START_COL_MSG: &str = "All mapping items must start at the same column";
const BLOCK_MSG: &str = "Block collections are not allowed within flow collections";

fn append_comment(target: &mut Option<String>, comment: &str) {
    match target {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(comment);
        }
        None => *target = Some(comment.to_owned()),
    }
}

/// Whether `items` already holds a key equal to `search`.
fn map_includes(ctx: &ComposeContext<'_>, items: &[Pair], search: &Node) -> bool {
    match &ctx.options.unique_keys {
        UniqueKeys::Off => false,
        UniqueKeys::Custom(eq) => items
            .iter()
            .filter_map(|pair| pair.key.as_ref())
            .any(|key| eq(key, search)),
        UniqueKeys::ByValue => {
            let Node::Scalar(search) = search else {
                return false;
            };
            if ctx.schema.merge && search.value.as_str() == Some("<<") {
                return false;
            }
            items.iter().any(|pair| {
                matches!(&pair.key, Some(Node::Scalar(key)) if key.value.loose_eq(&search.value))
            })
        }
    }
}

const fn is_block(token: Option<&CstToken>) -> bool {
    matches!(token, Some(CstToken::BlockMap(_) | CstToken::BlockSeq(_)))
}

pub(crate) fn resolve_block_map(ctx: &mut ComposeContext<'_>, bm: &BlockMap) -> YamlMap {
    let mut map = YamlMap::new();
    ctx.at_root = false;
    let strict = ctx.options.strict;
    let mut offset = bm.offset;
    let mut comment_end = None;
    for item in &bm.items {
        let key = item.key.as_deref();
        let sep = item.sep.as_deref();
        let key_props = resolve_props(
            &item.start,
            &PropsContext {
                flow: None,
                indicator: TokenKind::ExplicitKeyInd,
                next: Next::key_or_sep(key, sep),
                offset,
                parent_indent: bm.indent,
                start_on_newline: true,
            },
            ctx.diag,
        );
        let implicit_key = key_props.found.is_none();
        if implicit_key {
            if let Some(key) = key {
                if matches!(key, CstToken::BlockSeq(_)) {
                    ctx.diag.error(
                        at(offset),
                        ErrorCode::BlockAsImplicitKey,
                        "A block sequence may not be used as an implicit map key",
                    );
                } else if key.indent().is_some_and(|indent| indent != bm.indent) {
                    ctx.diag.error(at(offset), ErrorCode::BadIndent, START_COL_MSG);
                }
            }
            if key_props.anchor.is_none() && key_props.tag.is_none() && sep.is_none() {
                comment_end = Some(key_props.end);
                if !key_props.comment.is_empty() {
                    append_comment(&mut map.meta.comment, &key_props.comment);
                }
                continue;
            }
            if key_props.newline_after_prop.is_some() || contains_newline(key) {
                let span = key.map_or_else(
                    || item.start.last().map_or_else(|| at(offset), token_span),
                    cst_span,
                );
                ctx.diag.report(
                    !strict,
                    span,
                    ErrorCode::MultilineImplicitKey,
                    "Implicit keys need to be on a single line",
                );
            }
        } else if key_props.found.map(|found| found.indent) != Some(bm.indent) {
            ctx.diag.error(at(offset), ErrorCode::BadIndent, START_COL_MSG);
        }

        ctx.at_key = true;
        let key_start = key_props.end;
        let mut key_node = match key {
            Some(key) => compose_node(ctx, key, &key_props),
            None => compose_empty_node(ctx, key_start, &item.start, &key_props),
        };
        ctx.at_key = false;
        if map_includes(ctx, &map.items, &key_node) {
            ctx.diag
                .error(at(key_start), ErrorCode::DuplicateKey, "Map keys must be unique");
        }

        let value = item.value.as_deref();
        let sep_tokens = sep.unwrap_or_default();
        let value_props = resolve_props(
            sep_tokens,
            &PropsContext {
                flow: None,
                indicator: TokenKind::MapValueInd,
                next: Next::from_node(value),
                offset: node_end(&key_node),
                parent_indent: bm.indent,
                start_on_newline: key.is_none_or(|k| matches!(k, CstToken::BlockScalar(_))),
            },
            ctx.diag,
        );
        offset = value_props.end;

        if let Some(found) = value_props.found {
            if implicit_key {
                if matches!(value, Some(CstToken::BlockMap(_))) && !value_props.has_newline {
                    ctx.diag.error(
                        at(offset),
                        ErrorCode::BlockAsImplicitKey,
                        "Nested mappings are not allowed in compact mappings",
                    );
                }
                if key_props.start + 1024 < found.offset {
                    ctx.diag.report(
                        !strict,
                        node_span(&key_node),
                        ErrorCode::KeyOver1024Chars,
                        "The : indicator must be at most 1024 chars after the start of an implicit block mapping key",
                    );
                }
            }
            let value_node = match value {
                Some(value) => compose_node(ctx, value, &value_props),
                None => compose_empty_node(ctx, offset, sep_tokens, &value_props),
            };
            offset = node_end(&value_node);
            map.items.push(Pair {
                key: Some(key_node),
                value: Some(value_node),
            });
        } else {
            if implicit_key {
                ctx.diag.error(
                    node_span(&key_node),
                    ErrorCode::MissingChar,
                    "Implicit map keys need to be followed by map values",
                );
            }
            if !value_props.comment.is_empty() {
                append_comment(&mut key_node.meta_mut().comment, &value_props.comment);
            }
            map.items.push(Pair {
                key: Some(key_node),
                value: None,
            });
        }
    }
    if let Some(end) = comment_end
        && end < offset
    {
        ctx.diag.error(
            at(end),
            ErrorCode::Impossible,
            "Map comment with trailing content",
        );
    }
    map.meta.range = Some([bm.offset, offset, comment_end.unwrap_or(offset)]);
    map
}

pub(crate) fn resolve_block_seq(ctx: &mut ComposeContext<'_>, bs: &BlockSeq) -> YamlSeq {
    let mut seq = YamlSeq::new();
    ctx.at_root = false;
    ctx.at_key = false;
    let mut offset = bs.offset;
    let mut comment_end = None;
    for item in &bs.items {
        let value = item.value.as_deref();
        let props = resolve_props(
            &item.start,
            &PropsContext {
                flow: None,
                indicator: TokenKind::SeqItemInd,
                next: Next::from_node(value),
                offset,
                parent_indent: bs.indent,
                start_on_newline: true,
            },
            ctx.diag,
        );
        if props.found.is_none() {
            if props.anchor.is_some() || props.tag.is_some() || value.is_some() {
                if matches!(value, Some(CstToken::BlockSeq(_))) {
                    ctx.diag.error(
                        at(props.end),
                        ErrorCode::BadIndent,
                        "All sequence items must start at the same column",
                    );
                } else {
                    ctx.diag.error(
                        at(offset),
                        ErrorCode::MissingChar,
                        "Sequence item without - indicator",
                    );
                }
            } else {
                comment_end = Some(props.end);
                if !props.comment.is_empty() {
                    seq.meta.comment = Some(props.comment.clone());
                }
                continue;
            }
        }
        let node = match value {
            Some(value) => compose_node(ctx, value, &props),
            None => compose_empty_node(ctx, props.end, &item.start, &props),
        };
        offset = node_end(&node);
        seq.items.push(node);
    }
    seq.meta.range = Some([bs.offset, offset, comment_end.unwrap_or(offset)]);
    seq
}

#[allow(clippy::too_many_lines, reason = "flow items mix values and pairs")]
pub(crate) fn resolve_flow_collection(ctx: &mut ComposeContext<'_>, fc: &FlowCollection) -> Node {
    let is_map = fc.is_map();
    let fc_name = if is_map { "flow map" } else { "flow sequence" };
    let strict = ctx.options.strict;
    let mut map = YamlMap {
        flow: true,
        ..YamlMap::default()
    };
    let mut seq = YamlSeq {
        flow: true,
        ..YamlSeq::default()
    };
    let at_root = ctx.at_root;
    ctx.at_root = false;
    ctx.at_key = false;
    let mut offset = fc.offset + fc.start.source.len();

    for (i, item) in fc.items.iter().enumerate() {
        let key = item.key.as_deref();
        let sep = item.sep.as_deref();
        let value = item.value.as_deref();
        let mut props = resolve_props(
            &item.start,
            &PropsContext {
                flow: Some(fc_name),
                indicator: TokenKind::ExplicitKeyInd,
                next: Next::key_or_sep(key, sep),
                offset,
                parent_indent: fc.indent,
                start_on_newline: false,
            },
            ctx.diag,
        );
        if props.found.is_none() {
            if props.anchor.is_none() && props.tag.is_none() && sep.is_none() && value.is_none() {
                if i == 0
                    && let Some(comma) = props.comma
                {
                    ctx.diag.error(
                        token_span(comma),
                        ErrorCode::UnexpectedToken,
                        format!("Unexpected , in {fc_name}"),
                    );
                } else if i + 1 < fc.items.len() {
                    ctx.diag.error(
                        at(props.start),
                        ErrorCode::UnexpectedToken,
                        format!("Unexpected empty item in {fc_name}"),
                    );
                }
                if !props.comment.is_empty() {
                    let target = if is_map { &mut map.meta.comment } else { &mut seq.meta.comment };
                    append_comment(target, &props.comment);
                }
                offset = props.end;
                continue;
            }
            if !is_map && strict && contains_newline(key) {
                ctx.diag.error(
                    key.map_or_else(|| at(offset), cst_span),
                    ErrorCode::MultilineImplicitKey,
                    "Implicit keys of flow sequence pairs need to be on a single line",
                );
            }
        }
        if i == 0 {
            if let Some(comma) = props.comma {
                ctx.diag.error(
                    token_span(comma),
                    ErrorCode::UnexpectedToken,
                    format!("Unexpected , in {fc_name}"),
                );
            }
        } else {
            if props.comma.is_none() {
                ctx.diag.error(
                    at(props.start),
                    ErrorCode::MissingChar,
                    format!("Missing , between {fc_name} items"),
                );
            }
            if !props.comment.is_empty() {
                // a comment right after the comma belongs to the previous item
                let prev_comment = item
                    .start
                    .iter()
                    .find(|t| !matches!(t.kind, TokenKind::Comma | TokenKind::Space))
                    .filter(|t| t.kind == TokenKind::Comment)
                    .map(|t| t.source.get(1..).unwrap_or_default().to_owned())
                    .filter(|c| !c.is_empty());
                if let Some(prev_comment) = prev_comment {
                    let prev = if is_map {
                        map.items
                            .last_mut()
                            .and_then(|pair| pair.value.as_mut().or(pair.key.as_mut()))
                    } else {
                        seq.items.last_mut()
                    };
                    if let Some(prev) = prev {
                        append_comment(&mut prev.meta_mut().comment, &prev_comment);
                    }
                    props.comment = props
                        .comment
                        .get(prev_comment.len() + 1..)
                        .unwrap_or_default()
                        .to_owned();
                }
            }
        }

        if !is_map && sep.is_none() && props.found.is_none() {
            // plain sequence entry
            let value_node = match value {
                Some(value) => compose_node(ctx, value, &props),
                None => compose_empty_node(ctx, props.end, &[], &props),
            };
            if is_block(value) {
                ctx.diag
                    .error(node_span(&value_node), ErrorCode::BlockInFlow, BLOCK_MSG);
            }
            offset = node_end(&value_node);
            seq.items.push(value_node);
            continue;
        }

        ctx.at_key = true;
        let key_start = props.end;
        let mut key_node = match key {
            Some(key) => compose_node(ctx, key, &props),
            None => compose_empty_node(ctx, key_start, &item.start, &props),
        };
        if is_block(key) {
            ctx.diag
                .error(node_span(&key_node), ErrorCode::BlockInFlow, BLOCK_MSG);
        }
        ctx.at_key = false;

        let sep_tokens = sep.unwrap_or_default();
        let value_props = resolve_props(
            sep_tokens,
            &PropsContext {
                flow: Some(fc_name),
                indicator: TokenKind::MapValueInd,
                next: Next::from_node(value),
                offset: node_end(&key_node),
                parent_indent: fc.indent,
                start_on_newline: false,
            },
            ctx.diag,
        );

        if let Some(found) = value_props.found {
            if !is_map && props.found.is_none() && strict {
                let newline = sep_tokens
                    .iter()
                    .take_while(|t| !std::ptr::eq(*t, found))
                    .find(|t| t.kind == TokenKind::Newline);
                if let Some(newline) = newline {
                    ctx.diag.error(
                        token_span(newline),
                        ErrorCode::MultilineImplicitKey,
                        "Implicit keys of flow sequence pairs need to be on a single line",
                    );
                }
                if props.start + 1024 < found.offset {
                    ctx.diag.error(
                        token_span(found),
                        ErrorCode::KeyOver1024Chars,
                        "The : indicator must be at most 1024 chars after the start of an implicit flow sequence key",
                    );
                }
            }
        } else if let Some(value) = value {
            let missing_space = matches!(value, CstToken::Scalar(s) if s.source.starts_with(':'));
            if missing_space {
                ctx.diag.error(
                    cst_span(value),
                    ErrorCode::MissingChar,
                    format!("Missing space after : in {fc_name}"),
                );
            } else {
                ctx.diag.error(
                    at(value_props.start),
                    ErrorCode::MissingChar,
                    format!("Missing , or : between {fc_name} items"),
                );
            }
        }

        let value_node = match value {
            Some(value) => Some(compose_node(ctx, value, &value_props)),
            None if value_props.found.is_some() => Some(compose_empty_node(
                ctx,
                value_props.end,
                sep_tokens,
                &value_props,
            )),
            None => None,
        };
        match &value_node {
            Some(node) if is_block(value) => {
                ctx.diag
                    .error(node_span(node), ErrorCode::BlockInFlow, BLOCK_MSG);
            }
            None if !value_props.comment.is_empty() => {
                append_comment(&mut key_node.meta_mut().comment, &value_props.comment);
            }
            _ => {}
        }
        offset = value_node.as_ref().map_or(value_props.end, node_end);

        if is_map {
            if map_includes(ctx, &map.items, &key_node) {
                ctx.diag
                    .error(at(key_start), ErrorCode::DuplicateKey, "Map keys must be unique");
            }
            map.items.push(Pair {
                key: Some(key_node),
                value: value_node,
            });
        } else {
            let start = key_node.meta().range.map_or(key_start, |r| r[0]);
            let end_range = value_node
                .as_ref()
                .unwrap_or(&key_node)
                .meta()
                .range
                .unwrap_or([start, offset, offset]);
            let mut pair_map = YamlMap {
                flow: true,
                ..YamlMap::default()
            };
            pair_map.items.push(Pair {
                key: Some(key_node),
                value: value_node,
            });
            pair_map.meta.range = Some([start, end_range[1], end_range[2]]);
            seq.items.push(Node::Map(pair_map));
        }
    }

    let expected_end = if is_map { "}" } else { "]" };
    let mut end_tokens = fc.end.iter();
    let close = fc.end.first().filter(|t| t.source == expected_end);
    let close_end = if let Some(close) = close {
        end_tokens.next();
        close.end_offset()
    } else {
        let name = if is_map { "Flow map" } else { "Flow sequence" };
        if at_root {
            ctx.diag.error(
                at(offset),
                ErrorCode::MissingChar,
                format!("{name} must end with a {expected_end}"),
            );
        } else {
            ctx.diag.error(
                at(offset),
                ErrorCode::BadIndent,
                format!("{name} in block collection must be sufficiently indented and end with a {expected_end}"),
            );
        }
        // a stray single-character closer is dropped, anything else is trailing content
        if fc.end.first().is_some_and(|t| t.source.len() == 1) {
            end_tokens.next();
        }
        offset
    };
    let rest: Vec<_> = end_tokens
        .filter(|t| t.kind != TokenKind::FlowErrorEnd)
        .cloned()
        .collect();
    let (comment, end) = resolve_end(&rest, close_end, strict, ctx.diag);
    let range = Some([fc.offset, close_end, end]);
    if is_map {
        if !comment.is_empty() {
            append_comment(&mut map.meta.comment, &comment);
        }
        map.meta.range = range;
        Node::Map(map)
    } else {
        if !comment.is_empty() {
            append_comment(&mut seq.meta.comment, &comment);
        }
        seq.meta.range = range;
        Node::Seq(seq)
    }
}
