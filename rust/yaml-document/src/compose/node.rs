// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

use super::collections::{resolve_block_map, resolve_block_seq, resolve_flow_collection};
use super::props::{Props, empty_scalar_position, resolve_end};
use super::scalars::{ResolvedScalar, resolve_block_scalar, resolve_flow_scalar};
use super::{ComposeContext, at, cst_span, token_span};
use crate::cst::{CstToken, FlowScalar, SourceToken, source};
use crate::document::{Alias, Node, Scalar};
use crate::error::ErrorCode;
use crate::lexer::TokenKind;
use crate::schema::{CollectionKind, Resolver, TagDefinition, yaml_tag};

pub(crate) fn compose_node(ctx: &mut ComposeContext<'_>, token: &CstToken, props: &Props<'_>) -> Node {
    let anchor = props.anchor.map(|a| a.source.get(1..).unwrap_or_default().to_owned());
    let mut node = match token {
        CstToken::Scalar(scalar) if scalar.kind == TokenKind::Alias => {
            if props.anchor.is_some() || props.tag.is_some() {
                ctx.diag.error(
                    cst_span(token),
                    ErrorCode::AliasProps,
                    "An alias node must not specify any properties",
                );
            }
            compose_alias(ctx, scalar)
        }
        CstToken::Scalar(_) | CstToken::BlockScalar(_) => {
            Node::Scalar(compose_scalar(ctx, token, props.tag))
        }
        CstToken::BlockMap(_) | CstToken::BlockSeq(_) | CstToken::FlowCollection(_) => {
            if ctx.depth >= ctx.options.max_depth {
                ctx.diag.error(
                    cst_span(token),
                    ErrorCode::ExcessiveDepth,
                    format!(
                        "Collections are nested more than {} levels deep",
                        ctx.options.max_depth
                    ),
                );
                return compose_empty_node(ctx, token.offset(), &[], props);
            }
            // aliases inside the collection may refer to it
            if let Some(name) = &anchor {
                ctx.anchors.insert(name.clone());
            }
            ctx.depth += 1;
            let node = compose_collection(ctx, token, props);
            ctx.depth -= 1;
            node
        }
        other => {
            let message = match other {
                CstToken::Error(error) => error.message.clone(),
                _ => format!("Unsupported token (type: {})", token_kind_name(other)),
            };
            ctx.diag.error(cst_span(other), ErrorCode::UnexpectedToken, message);
            return compose_empty_node(ctx, other.offset(), &[], props);
        }
    };
    if !node.is_alias()
        && let Some(name) = anchor
    {
        if name.is_empty()
            && let Some(anchor) = props.anchor
        {
            ctx.diag.error(
                token_span(anchor),
                ErrorCode::BadAlias,
                "Anchor cannot be an empty string",
            );
        }
        ctx.anchors.insert(name.clone());
        node.meta_mut().anchor = Some(name);
    }
    let meta = node.meta_mut();
    if props.space_before {
        meta.space_before = true;
    }
    if !props.comment.is_empty() {
        let empty_scalar = matches!(token, CstToken::Scalar(s) if s.kind == TokenKind::Scalar && s.source.is_empty());
        if empty_scalar {
            meta.comment = Some(props.comment.clone());
        } else {
            meta.comment_before = Some(props.comment.clone());
        }
    }
    if ctx.options.keep_source_tokens
        && let Node::Scalar(scalar) = &mut node
    {
        scalar.src_token = Some(source(token));
    }
    node
}

const fn token_kind_name(token: &CstToken) -> &'static str {
    match token {
        CstToken::Directive(_) => "directive",
        CstToken::Source(_) => "source",
        CstToken::Error(_) => "error",
        CstToken::Document(_) => "document",
        CstToken::DocEnd(_) => "doc-end",
        CstToken::Scalar(_) => "scalar",
        CstToken::BlockScalar(_) => "block-scalar",
        CstToken::BlockMap(_) => "block-map",
        CstToken::BlockSeq(_) => "block-seq",
        CstToken::FlowCollection(_) => "flow-collection",
    }
}

/// An empty plain scalar standing in for a missing node.
pub(crate) fn compose_empty_node(
    ctx: &mut ComposeContext<'_>,
    offset: usize,
    before: &[SourceToken],
    props: &Props<'_>,
) -> Node {
    let token = CstToken::Scalar(FlowScalar {
        kind: TokenKind::Scalar,
        offset: empty_scalar_position(offset, before),
        indent: 0,
        source: String::new(),
        end: Vec::new(),
    });
    let mut scalar = compose_scalar(ctx, &token, props.tag);
    if let Some(anchor) = props.anchor {
        let name = anchor.source.get(1..).unwrap_or_default().to_owned();
        if name.is_empty() {
            ctx.diag.error(
                token_span(anchor),
                ErrorCode::BadAlias,
                "Anchor cannot be an empty string",
            );
        }
        ctx.anchors.insert(name.clone());
        scalar.meta.anchor = Some(name);
    }
    if props.space_before {
        scalar.meta.space_before = true;
    }
    if !props.comment.is_empty() {
        scalar.meta.comment = Some(props.comment.clone());
        if let Some(range) = &mut scalar.meta.range {
            range[2] = props.end;
        }
    }
    Node::Scalar(scalar)
}

fn compose_alias(ctx: &mut ComposeContext<'_>, token: &FlowScalar) -> Node {
    let name = token.source.get(1..).unwrap_or_default();
    let mut alias = Alias::new(name);
    if name.is_empty() {
        ctx.diag.error(
            at(token.offset),
            ErrorCode::BadAlias,
            "Alias cannot be an empty string",
        );
    } else if !ctx.anchors.contains(name) {
        ctx.diag.error(
            crate::span::span(token.offset, token.offset + token.source.len()),
            ErrorCode::BadAlias,
            format!("Aliased anchor not found: {name}"),
        );
    }
    if name.ends_with(':') {
        ctx.diag.warning(
            at(token.offset + token.source.len() - 1),
            ErrorCode::BadAlias,
            "Alias ending in : is ambiguous",
        );
    }
    let value_end = token.offset + token.source.len();
    let (comment, end) = resolve_end(&token.end, value_end, ctx.options.strict, ctx.diag);
    alias.meta.range = Some([token.offset, value_end, end]);
    if !comment.is_empty() {
        alias.meta.comment = Some(comment);
    }
    Node::Alias(alias)
}

pub(crate) fn compose_scalar(
    ctx: &mut ComposeContext<'_>,
    token: &CstToken,
    tag_token: Option<&SourceToken>,
) -> Scalar {
    let strict = ctx.options.strict;
    let ResolvedScalar {
        value,
        style,
        comment,
        range,
    } = match token {
        CstToken::BlockScalar(scalar) => resolve_block_scalar(scalar, strict, ctx.at_root, ctx.diag),
        CstToken::Scalar(scalar) => resolve_flow_scalar(scalar, strict, ctx.diag),
        other => {
            let offset = other.offset();
            ResolvedScalar {
                value: String::new(),
                style: None,
                comment: String::new(),
                range: [offset, offset, offset],
            }
        }
    };
    let tag_name = tag_token.and_then(|t| ctx.tag_name(t));
    let schema = ctx.schema;
    let is_plain = matches!(token, CstToken::Scalar(s) if s.kind == TokenKind::Scalar);
    let tag: &TagDefinition = match tag_name.as_deref() {
        // non-specific tag
        Some("!") => schema.string_tag(),
        Some(name) => match schema.scalar_tag_by_name(name, &value) {
            Some(tag) => tag,
            None => {
                let span = tag_token.map_or_else(|| cst_span(token), token_span);
                ctx.diag.report(
                    name != yaml_tag("str"),
                    span,
                    ErrorCode::TagResolveFailed,
                    format!("Unresolved tag: {name}"),
                );
                schema.string_tag()
            }
        },
        None if is_plain => schema.default_scalar_tag_for(&value, ctx.at_key),
        None => schema.string_tag(),
    };

    let mut scalar = match tag.resolve {
        Resolver::Scalar(resolve) => match resolve(&value, ctx.options) {
            Ok(scalar) => scalar,
            Err(message) => {
                let span = tag_token.map_or_else(|| cst_span(token), token_span);
                ctx.diag.error(span, ErrorCode::TagResolveFailed, message);
                Scalar::new(value.clone())
            }
        },
        Resolver::Map(_) | Resolver::Seq(_) => Scalar::new(value.clone()),
    };
    scalar.meta.range = Some(range);
    scalar.source = Some(value);
    if style.is_some() {
        scalar.style = style;
    }
    if tag_name.is_some() {
        scalar.meta.tag = tag_name;
    }
    if tag.format.is_some() {
        scalar.format = tag.format;
    }
    if !comment.is_empty() {
        scalar.meta.comment = Some(comment);
    }
    scalar
}

const fn kind_name(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Map => "map",
        CollectionKind::Seq => "seq",
    }
}

fn compose_collection(ctx: &mut ComposeContext<'_>, token: &CstToken, props: &Props<'_>) -> Node {
    let tag_token = props.tag;
    let tag_name = tag_token.and_then(|t| ctx.tag_name(t));
    if matches!(token, CstToken::BlockSeq(_)) {
        let last_prop = match (props.anchor, tag_token) {
            (Some(anchor), Some(tag)) => Some(if anchor.offset > tag.offset { anchor } else { tag }),
            (anchor, tag) => anchor.or(tag),
        };
        if let Some(last) = last_prop
            && props
                .newline_after_prop
                .is_none_or(|nl| nl.offset < last.offset)
        {
            ctx.diag.error(
                token_span(last),
                ErrorCode::MissingChar,
                "Missing newline after block sequence props",
            );
        }
    }
    let expected = match token {
        CstToken::BlockSeq(_) => CollectionKind::Seq,
        CstToken::FlowCollection(fc) if !fc.is_map() => CollectionKind::Seq,
        _ => CollectionKind::Map,
    };

    let (Some(tag_token), Some(name)) = (tag_token, tag_name) else {
        return resolve_collection(ctx, token, None, expected);
    };
    if name == "!" || name == yaml_tag(kind_name(expected)) {
        return resolve_collection(ctx, token, Some(name), expected);
    }

    let schema = ctx.schema;
    let Some(tag) = schema
        .tags_for_collection_kind(expected)
        .find(|t| t.tag == name)
    else {
        match schema.resolve_tag(&name) {
            Some(known) => ctx.diag.warning(
                token_span(tag_token),
                ErrorCode::BadCollectionType,
                format!(
                    "{} used for {} collection, but expects {}",
                    known.tag,
                    kind_name(expected),
                    known.collection().map_or("scalar", kind_name)
                ),
            ),
            None => ctx.diag.warning(
                token_span(tag_token),
                ErrorCode::TagResolveFailed,
                format!("Unresolved tag: {name}"),
            ),
        }
        return resolve_collection(ctx, token, Some(name), expected);
    };

    let collection = resolve_collection(ctx, token, None, expected);
    let range = collection.meta().range;
    let mut messages = Vec::new();
    let mut node = match (tag.resolve, collection) {
        (Resolver::Map(resolve), Node::Map(map)) => resolve(map, &mut |msg| messages.push(msg)),
        (Resolver::Seq(resolve), Node::Seq(seq)) => resolve(seq, &mut |msg| messages.push(msg)),
        (_, node) => node,
    };
    for message in messages {
        ctx.diag
            .error(token_span(tag_token), ErrorCode::TagResolveFailed, message);
    }
    let meta = node.meta_mut();
    meta.range = range;
    meta.tag = Some(name);
    node
}

fn resolve_collection(
    ctx: &mut ComposeContext<'_>,
    token: &CstToken,
    tag_name: Option<String>,
    kind: CollectionKind,
) -> Node {
    let mut node = match token {
        CstToken::BlockSeq(seq) => Node::Seq(resolve_block_seq(ctx, seq)),
        CstToken::FlowCollection(fc) => resolve_flow_collection(ctx, fc),
        CstToken::BlockMap(map) => Node::Map(resolve_block_map(ctx, map)),
        _ => Node::Scalar(Scalar::null()),
    };
    node.meta_mut().tag = match tag_name.as_deref() {
        Some("!") => Some(yaml_tag(kind_name(kind))),
        _ => tag_name,
    };
    node
}
