// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Block and flow layout of maps, sequences and pairs.

use super::{
    Emitted, StringifyContext, indent_comment, line_comment, stringify_comment, stringify_node,
};
use crate::document::{MapKind, Node, Pair, YamlMap, YamlSeq};
use crate::error::StringifyError;

#[derive(Clone, Copy)]
enum Item<'a> {
    Node(&'a Node),
    Pair(&'a Pair),
}

struct Layout {
    block_item_prefix: &'static str,
    flow_start: &'static str,
    flow_end: &'static str,
    item_indent: String,
}

impl Item<'_> {
    fn stringify(self, ctx: &StringifyContext<'_>, out: &mut Emitted) -> Result<String, StringifyError> {
        match self {
            Self::Node(node) => stringify_node(Some(node), ctx, out),
            Self::Pair(pair) => stringify_pair(pair, ctx, out),
        }
    }
}

pub(super) fn stringify_map(
    map: &YamlMap,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> Result<String, StringifyError> {
    let all_null = match map.kind {
        MapKind::Set => map.has_all_null_values(),
        MapKind::Map => map.items.iter().all(|pair| pair.value.is_none()),
    };
    let mut ctx = ctx.clone();
    ctx.all_null_values |= all_null;
    let items: Vec<Item<'_>> = map.items.iter().map(Item::Pair).collect();
    let layout = Layout {
        block_item_prefix: "",
        flow_start: "{",
        flow_end: "}",
        item_indent: ctx.indent.clone(),
    };
    stringify_collection(&items, map.flow, map.meta.comment.as_deref(), &ctx, &layout, out)
}

pub(super) fn stringify_seq(
    seq: &YamlSeq,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> Result<String, StringifyError> {
    let items: Vec<Item<'_>> = seq.items.iter().map(Item::Node).collect();
    let layout = Layout {
        block_item_prefix: "- ",
        flow_start: "[",
        flow_end: "]",
        item_indent: format!("{}  ", ctx.indent),
    };
    stringify_collection(&items, seq.flow, seq.meta.comment.as_deref(), ctx, &layout, out)
}

fn stringify_collection(
    items: &[Item<'_>],
    flow: bool,
    comment: Option<&str>,
    ctx: &StringifyContext<'_>,
    layout: &Layout,
    out: &mut Emitted,
) -> Result<String, StringifyError> {
    if ctx.in_flow.unwrap_or(flow) {
        flow_collection(items, ctx, layout)
    } else {
        block_collection(items, comment, ctx, layout, out)
    }
}

fn add_comment_before(ctx: &StringifyContext<'_>, lines: &mut Vec<String>, comment: Option<&str>, chomp_keep: bool) {
    let Some(mut comment) = comment else {
        return;
    };
    if chomp_keep {
        comment = comment.trim_start_matches('\n');
    }
    if !comment.is_empty() {
        let text = indent_comment(&stringify_comment(comment), &ctx.indent);
        lines.push(text.trim_start().to_owned());
    }
}

fn block_collection(
    items: &[Item<'_>],
    comment: Option<&str>,
    ctx: &StringifyContext<'_>,
    layout: &Layout,
    out: &mut Emitted,
) -> Result<String, StringifyError> {
    let mut item_ctx = ctx.clone();
    item_ctx.indent.clone_from(&layout.item_indent);
    item_ctx.parent_indent = ctx.indent.len();
    let mut chomp_keep = false;
    let mut lines = Vec::new();
    for &item in items {
        let mut item_comment = None;
        let lead = match item {
            Item::Node(node) => {
                item_comment = node.meta().comment.as_deref();
                Some(node)
            }
            Item::Pair(pair) => pair.key.as_ref(),
        };
        if let Some(lead) = lead {
            if !chomp_keep && lead.meta().space_before {
                lines.push(String::new());
            }
            add_comment_before(ctx, &mut lines, lead.meta().comment_before.as_deref(), chomp_keep);
        }
        let mut emitted = Emitted::default();
        let mut text = item.stringify(&item_ctx, &mut emitted)?;
        chomp_keep = emitted.chomp_keep;
        if emitted.comment {
            item_comment = None;
        }
        if let Some(item_comment) = item_comment {
            text.push_str(&line_comment(&text, &layout.item_indent, &stringify_comment(item_comment)));
            chomp_keep = false;
        }
        lines.push(format!("{}{text}", layout.block_item_prefix));
    }

    let mut text = match lines.split_first() {
        None => format!("{}{}", layout.flow_start, layout.flow_end),
        Some((first, rest)) => {
            let mut text = first.clone();
            for line in rest {
                text.push('\n');
                if !line.is_empty() {
                    text.push_str(&ctx.indent);
                    text.push_str(line);
                }
            }
            text
        }
    };
    if let Some(comment) = comment {
        text.push('\n');
        text.push_str(&indent_comment(&stringify_comment(comment), &ctx.indent));
        out.comment = true;
    } else if chomp_keep {
        out.chomp_keep = true;
    }
    Ok(text)
}

fn flow_collection(
    items: &[Item<'_>],
    ctx: &StringifyContext<'_>,
    layout: &Layout,
) -> Result<String, StringifyError> {
    let item_indent = format!("{}{}", layout.item_indent, ctx.indent_step);
    let mut item_ctx = ctx.clone();
    item_ctx.indent.clone_from(&item_indent);
    item_ctx.in_flow = Some(true);
    let mut req_newline = false;
    let mut lines_at_value = 0;
    let mut lines: Vec<String> = Vec::new();
    for (idx, &item) in items.iter().enumerate() {
        let mut item_comment = match item {
            Item::Node(node) => {
                if node.meta().space_before {
                    lines.push(String::new());
                }
                add_comment_before(ctx, &mut lines, node.meta().comment_before.as_deref(), false);
                node.meta().comment.as_deref()
            }
            Item::Pair(pair) => {
                if let Some(key) = &pair.key {
                    if key.meta().space_before {
                        lines.push(String::new());
                    }
                    add_comment_before(ctx, &mut lines, key.meta().comment_before.as_deref(), false);
                    req_newline |= key.meta().comment.is_some();
                }
                match &pair.value {
                    Some(value) => {
                        req_newline |= value.meta().comment_before.is_some();
                        value.meta().comment.as_deref()
                    }
                    None => pair.key.as_ref().and_then(|key| key.meta().comment.as_deref()),
                }
            }
        };
        req_newline |= item_comment.is_some();
        let mut emitted = Emitted::default();
        let mut text = item.stringify(&item_ctx, &mut emitted)?;
        if emitted.comment {
            item_comment = None;
        }
        if idx + 1 < items.len() {
            text.push(',');
        }
        if let Some(item_comment) = item_comment {
            text.push_str(&line_comment(&text, &item_indent, &stringify_comment(item_comment)));
        }
        if !req_newline && (lines.len() > lines_at_value || text.contains('\n')) {
            req_newline = true;
        }
        lines.push(text);
        lines_at_value = lines.len();
    }

    let (start, end) = (layout.flow_start, layout.flow_end);
    if lines.is_empty() {
        return Ok(format!("{start}{end}"));
    }
    if !req_newline {
        let width = lines.iter().map(|line| line.len() + 2).sum::<usize>() + 2;
        req_newline = ctx.options.line_width > 0 && width > ctx.options.line_width;
    }
    if req_newline {
        let mut text = start.to_owned();
        for line in &lines {
            text.push('\n');
            if !line.is_empty() {
                text.push_str(&ctx.indent_step);
                text.push_str(&ctx.indent);
                text.push_str(line);
            }
        }
        text.push('\n');
        text.push_str(&ctx.indent);
        text.push_str(end);
        Ok(text)
    } else {
        let padding = if ctx.options.flow_collection_padding { " " } else { "" };
        Ok(format!("{start}{padding}{}{padding}{end}", lines.join(" ")))
    }
}

/// Whether a collection value stays on the key's line.
fn is_flow_value(node: &Node, ctx: &StringifyContext<'_>) -> bool {
    ctx.in_flow.unwrap_or_else(|| match node {
        Node::Map(map) => map.flow || map.items.is_empty(),
        Node::Seq(seq) => seq.flow || seq.items.is_empty(),
        Node::Scalar(_) | Node::Alias(_) => false,
    })
}

/// A props-only first line, as in `&anchor !tag\n  key: value`.
fn has_props_line(text: &str, newline: usize) -> bool {
    if !text.starts_with(['&', '!']) {
        return false;
    }
    let mut space = text.find(' ');
    if text.starts_with('&')
        && let Some(sp) = space
        && sp < newline
        && text[sp + 1..].starts_with('!')
    {
        space = text[sp + 1..].find(' ').map(|next| sp + 1 + next);
    }
    space.is_none_or(|sp| newline < sp)
}

pub(super) fn stringify_pair(
    pair: &Pair,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> Result<String, StringifyError> {
    let options = ctx.options;
    let in_flow = ctx.in_flow == Some(true);
    let key = pair.key.as_ref();
    let value = pair.value.as_ref();
    let mut key_comment = key.and_then(|key| key.meta().comment.as_deref());
    if options.simple_keys {
        if key_comment.is_some() {
            return Err(StringifyError::SimpleKeys("key nodes cannot have comments"));
        }
        if key.is_some_and(Node::is_collection) {
            return Err(StringifyError::SimpleKeys(
                "collection cannot be used as a key value",
            ));
        }
    }
    let mut explicit_key = !options.simple_keys
        && match key {
            None => true,
            Some(Node::Scalar(scalar)) => {
                (key_comment.is_some() && value.is_none() && !in_flow)
                    || scalar.style.is_some_and(|style| style.is_block())
            }
            Some(_) => true,
        };

    let mut key_ctx = ctx.clone();
    key_ctx.all_null_values = false;
    key_ctx.implicit_key = !explicit_key && (options.simple_keys || !ctx.all_null_values);
    key_ctx.indent = format!("{}{}", ctx.indent, ctx.indent_step);
    let mut key_out = Emitted::default();
    let mut text = stringify_node(key, &key_ctx, &mut key_out)?;
    if !explicit_key && !in_flow && text.len() > 1024 {
        if options.simple_keys {
            return Err(StringifyError::SimpleKeys(
                "single line scalar must not span more than 1024 characters",
            ));
        }
        explicit_key = true;
    }

    if in_flow {
        if ctx.all_null_values || value.is_none() {
            out.comment |= key_out.comment;
            return Ok(if text.is_empty() {
                "?".to_owned()
            } else if explicit_key {
                format!("? {text}")
            } else {
                text
            });
        }
    } else if (ctx.all_null_values && !options.simple_keys) || (value.is_none() && explicit_key) {
        text = format!("? {text}");
        match key_comment {
            Some(comment) if !key_out.comment => {
                text.push_str(&line_comment(&text, &key_ctx.indent, &stringify_comment(comment)));
            }
            _ => out.chomp_keep |= key_out.chomp_keep,
        }
        return Ok(text);
    }

    if key_out.comment {
        key_comment = None;
    }
    if explicit_key {
        if let Some(comment) = key_comment {
            text.push_str(&line_comment(&text, &key_ctx.indent, &stringify_comment(comment)));
        }
        text = format!("? {text}\n{}:", ctx.indent);
    } else {
        text.push(':');
        if let Some(comment) = key_comment {
            text.push_str(&line_comment(&text, &key_ctx.indent, &stringify_comment(comment)));
        }
    }

    let (space_before, comment_before, value_comment) = value.map_or((false, None, None), |value| {
        let meta = value.meta();
        (meta.space_before, meta.comment_before.as_deref(), meta.comment.as_deref())
    });
    let mut value_ctx = key_ctx;
    value_ctx.implicit_key = false;
    if !explicit_key && key_comment.is_none() && value.is_some_and(Node::is_scalar) {
        value_ctx.indent_at_start = Some(ctx.indent.len() + text.len() + 1);
    }
    if !options.indent_seq
        && ctx.indent_step.len() >= 2
        && !in_flow
        && !explicit_key
        && let Some(Node::Seq(seq)) = value
        && !seq.flow
        && seq.meta.tag.is_none()
        && seq.meta.anchor.is_none()
    {
        value_ctx.indent = value_ctx.indent.get(2..).unwrap_or_default().to_owned();
    }
    let mut value_out = Emitted::default();
    let value_text = stringify_node(value, &value_ctx, &mut value_out)?;

    let mut ws = " ".to_owned();
    if key_comment.is_some() || space_before || comment_before.is_some() {
        ws = if space_before { "\n" } else { "" }.to_owned();
        if let Some(comment) = comment_before {
            ws.push('\n');
            ws.push_str(&indent_comment(&stringify_comment(comment), &value_ctx.indent));
        }
        if value_text.is_empty() && !in_flow {
            if ws == "\n" {
                ws = "\n\n".to_owned();
            }
        } else {
            ws.push('\n');
            ws.push_str(&value_ctx.indent);
        }
    } else if !explicit_key
        && let Some(node) = value.filter(|node| node.is_collection())
    {
        let newline = value_text.find('\n');
        if (newline.is_some() || !is_flow_value(node, ctx))
            && !newline.is_some_and(|nl| has_props_line(&value_text, nl))
        {
            ws = format!("\n{}", value_ctx.indent);
        }
    } else if value_text.is_empty() || value_text.starts_with('\n') {
        ws = String::new();
    }
    text.push_str(&ws);
    text.push_str(&value_text);

    if in_flow {
        out.comment |= value_out.comment;
    } else if let Some(comment) = value_comment
        && !value_out.comment
    {
        text.push_str(&line_comment(&text, &value_ctx.indent, &stringify_comment(comment)));
    } else {
        out.chomp_keep |= value_out.chomp_keep;
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::{Alias, Document, Scalar, ScalarStyle};
    use crate::options::Options;
    use crate::value::Value;

    fn render_pair(pair: &Pair, options: &Options) -> Result<String, StringifyError> {
        let doc = Document::new(&Value::Null, options).unwrap();
        let ctx = StringifyContext::new(&doc);
        stringify_pair(pair, &ctx, &mut Emitted::default())
    }

    #[test]
    fn test_explicit_keys() {
        let options = Options::default();
        let mut key_seq = YamlSeq::new();
        key_seq.items.push(Node::from(1));
        let pair = Pair::new(key_seq, Node::from("v"));
        assert_eq!(render_pair(&pair, &options).unwrap(), "? - 1\n: v");

        let block_key = Scalar::new("k\n").with_style(ScalarStyle::BlockLiteral);
        let pair = Pair::new(block_key, Node::from(1));
        assert_eq!(render_pair(&pair, &options).unwrap(), "? |\n  k\n: 1");

        let pair = Pair {
            key: Some(Node::from("k")),
            value: None,
        };
        assert_eq!(render_pair(&pair, &options).unwrap(), "k: null");

        let long_key = "k".repeat(1100);
        let pair = Pair::new(long_key.as_str(), Node::from(1));
        let text = render_pair(&pair, &options).unwrap();
        assert!(text.starts_with("? kkk"), "{text}");
        assert!(text.ends_with("\n: 1"), "{text}");
    }

    #[test]
    fn test_simple_keys() {
        let options = Options {
            simple_keys: true,
            ..Options::default()
        };
        let mut key_map = YamlMap::new();
        key_map.set("a".into(), Node::from(1));
        let pair = Pair::new(key_map, Node::from("v"));
        assert_eq!(
            render_pair(&pair, &options),
            Err(StringifyError::SimpleKeys("collection cannot be used as a key value"))
        );
        let mut key = Node::from("k");
        key.meta_mut().comment = Some(" c".to_owned());
        let pair = Pair::new(key, Node::from("v"));
        assert!(render_pair(&pair, &options).is_err());
        let pair = Pair::new(Alias::new("a"), Node::from("v"));
        assert_eq!(render_pair(&pair, &options).unwrap(), "*a : v");
    }

    #[test]
    fn test_alias_keys_are_explicit() {
        let pair = Pair::new(Alias::new("a"), Node::from("v"));
        assert_eq!(render_pair(&pair, &Options::default()).unwrap(), "? *a\n: v");
    }

    #[test]
    fn test_value_props_line() {
        let mut doc = Document::new(&Value::from(json!({"m": {"x": 1}, "s": [1]})), &Options::default()).unwrap();
        let Some(Node::Map(map)) = &mut doc.contents else {
            panic!("map expected");
        };
        for pair in &mut map.items {
            if let Some(value) = pair.value.as_mut() {
                value.meta_mut().anchor = Some("a".to_owned());
                value.meta_mut().tag = Some("!t".to_owned());
            }
        }
        doc.options.directives = Some(false);
        map.items[1].value.as_mut().unwrap().meta_mut().anchor = Some("b".to_owned());
        assert_eq!(
            doc.to_string().unwrap(),
            "m: &a !t\n  x: 1\ns: &b !t\n  - 1\n"
        );
    }

    #[test]
    fn test_flow_item_comments() {
        let mut seq = YamlSeq::new();
        seq.flow = true;
        let mut first = Node::from("x");
        first.meta_mut().comment = Some(" one".to_owned());
        seq.items.push(first);
        seq.items.push(Node::from("y"));
        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Seq(seq));
        let text = doc.to_string().unwrap();
        assert!(text.starts_with("[\n"), "{text}");
        assert!(text.contains("x, # one\n"), "{text}");
        assert_eq!(
            crate::parse(&text, &Options::default()).unwrap(),
            Value::from(json!(["x", "y"]))
        );
    }

    #[test]
    fn test_flow_pair_without_value() {
        let mut map = YamlMap::new();
        map.flow = true;
        map.items.push(Pair {
            key: Some(Node::from("a")),
            value: None,
        });
        map.items.push(Pair::new("b", Node::from(1)));
        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Map(map));
        assert_eq!(doc.to_string().unwrap(), "{ a, b: 1 }\n");
    }

    #[test]
    fn test_kept_block_scalar_then_next_key() {
        let mut doc = Document::new(&Value::from(json!({"a": "x\n\n", "b": 1})), &Options::default()).unwrap();
        doc.comment = Some(" end".to_owned());
        assert_eq!(doc.to_string().unwrap(), "a: |+\n  x\n\nb: 1\n\n# end\n");
    }
}
