// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Turn a [`Document`] back into YAML text.
//!
//! Comments, blank lines, anchors, explicit tags and the scalar and
//! collection styles recorded on the nodes are kept where the output allows
//! them. Everything else is laid out from the [`Options`] of the document.

mod anchors;
mod collection;
mod fold;
mod string;

pub use fold::{FoldMode, FoldOptions, fold_flow_lines};

use crate::document::{Document, MapKind, Node, Scalar, ScalarValue, SeqKind, walk};
use crate::error::StringifyError;
use crate::options::{CollectionStyle, Options};
use crate::schema::{TagContext, TagOutput, yaml_tag};

/// Output position and layout state, copied and adjusted on the way down.
#[derive(Clone)]
pub(crate) struct StringifyContext<'d> {
    pub doc: &'d Document,
    pub options: &'d Options,
    pub indent: String,
    pub indent_step: String,
    /// Column of the enclosing block collection.
    pub parent_indent: usize,
    /// Column at which the current value starts on its line, if known.
    pub indent_at_start: Option<usize>,
    pub implicit_key: bool,
    /// `None` keeps each collection's own flow flag.
    pub in_flow: Option<bool>,
    pub all_null_values: bool,
    pub force_block_indent: bool,
    /// The scalar being written is a string and must read back as one.
    pub actual_string: bool,
}

impl<'d> StringifyContext<'d> {
    pub fn new(doc: &'d Document) -> Self {
        let options = &doc.options;
        Self {
            doc,
            options,
            indent: String::new(),
            indent_step: " ".repeat(options.indent),
            parent_indent: 0,
            indent_at_start: None,
            implicit_key: false,
            in_flow: match options.collection_style {
                CollectionStyle::Any => None,
                CollectionStyle::Block => Some(false),
                CollectionStyle::Flow => Some(true),
            },
            all_null_values: false,
            force_block_indent: false,
            actual_string: false,
        }
    }
}

/// What a nested stringify call already wrote on behalf of its caller.
#[derive(Debug, Default)]
pub(crate) struct Emitted {
    /// The node's own comment is already part of the output.
    pub comment: bool,
    /// The output ends in a kept (`|+`) block scalar.
    pub chomp_keep: bool,
}

/// `#`-prefix every non-empty comment line.
pub(crate) fn stringify_comment(comment: &str) -> String {
    comment
        .split('\n')
        .map(|line| match line {
            "" => String::new(),
            " " => "#".to_owned(),
            line => format!("#{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn indent_comment(comment: &str, indent: &str) -> String {
    if !comment.is_empty() && comment.chars().all(|ch| ch == '\n') {
        return comment[1..].to_owned();
    }
    if indent.is_empty() {
        return comment.to_owned();
    }
    comment
        .split('\n')
        .map(|line| {
            if line.chars().all(|ch| ch == ' ') {
                line.to_owned()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text to append to `text` to give it the trailing `comment`.
pub(crate) fn line_comment(text: &str, indent: &str, comment: &str) -> String {
    if text.ends_with('\n') {
        indent_comment(comment, indent)
    } else if comment.contains('\n') {
        format!("\n{}", indent_comment(comment, indent))
    } else if text.ends_with(' ') {
        comment.to_owned()
    } else {
        format!(" {comment}")
    }
}

fn value_type_name(value: &ScalarValue) -> &'static str {
    match value {
        ScalarValue::Null => "null",
        ScalarValue::Bool(_) => "bool",
        ScalarValue::Int(_) => "int",
        ScalarValue::BigInt(_) => "bigint",
        ScalarValue::Float(_) => "float",
        ScalarValue::Str(_) => "string",
        ScalarValue::Binary(_) => "binary",
        ScalarValue::Timestamp(_) => "timestamp",
    }
}

fn props_prefix(node: &Node, tag: Option<&str>, ctx: &StringifyContext<'_>) -> String {
    let mut props = Vec::new();
    if let Some(anchor) = node.anchor() {
        props.push(format!("&{anchor}"));
    }
    if let Some(tag) = tag.filter(|tag| !tag.is_empty()) {
        props.push(ctx.doc.directives.tag_string(tag));
    }
    props.join(" ")
}

fn stringify_scalar(
    node: &Node,
    scalar: &Scalar,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> Result<String, StringifyError> {
    let schema = &ctx.doc.schema;
    let Some(tag) = schema.tag_for_scalar(scalar) else {
        return Err(StringifyError::UnresolvedTag(
            value_type_name(&scalar.value).to_owned(),
        ));
    };
    let explicit_tag = scalar
        .meta
        .tag
        .as_deref()
        .or_else(|| (!schema.is_implicit(tag)).then_some(tag.tag.as_str()));
    let props = props_prefix(node, explicit_tag, ctx);
    let mut ctx = ctx.clone();
    if !props.is_empty() {
        ctx.indent_at_start = Some(ctx.indent_at_start.unwrap_or(0) + props.len() + 1);
    }
    let comment = scalar.meta.comment.as_deref();
    let text = match tag.stringify {
        Some(stringify) => {
            let tag_ctx = TagContext {
                options: ctx.options,
                indent: ctx.indent.len(),
            };
            match stringify(scalar, &tag_ctx) {
                TagOutput::Text(text) => text,
                TagOutput::Str(value, style) => {
                    string::stringify_string(&value, Some(style), comment, &ctx, out)
                }
            }
        }
        None => {
            let value = match &scalar.value {
                ScalarValue::Str(value) => {
                    ctx.actual_string = true;
                    value.clone()
                }
                other => other.to_key_string(),
            };
            string::stringify_string(&value, scalar.style, comment, &ctx, out)
        }
    };
    Ok(if props.is_empty() {
        text
    } else {
        format!("{props} {text}")
    })
}

/// Render one node at the position described by `ctx`. A missing node is
/// written as null.
pub(crate) fn stringify_node(
    node: Option<&Node>,
    ctx: &StringifyContext<'_>,
    out: &mut Emitted,
) -> Result<String, StringifyError> {
    let null;
    let node = match node {
        Some(node) => node,
        None => {
            null = Node::Scalar(Scalar::null());
            &null
        }
    };
    let (text, tag) = match node {
        Node::Alias(alias) => {
            return Ok(if ctx.implicit_key {
                format!("*{} ", alias.source)
            } else {
                format!("*{}", alias.source)
            });
        }
        Node::Scalar(scalar) => return stringify_scalar(node, scalar, ctx, out),
        Node::Map(map) => (
            collection::stringify_map(map, ctx, out)?,
            map.meta.tag.clone().or_else(|| match map.kind {
                MapKind::Set => Some(yaml_tag("set")),
                MapKind::Map => None,
            }),
        ),
        Node::Seq(seq) => (
            collection::stringify_seq(seq, ctx, out)?,
            seq.meta.tag.clone().or_else(|| match seq.kind {
                SeqKind::OMap => Some(yaml_tag("omap")),
                SeqKind::Pairs => Some(yaml_tag("pairs")),
                SeqKind::Seq => None,
            }),
        ),
    };
    let props = props_prefix(node, tag.as_deref(), ctx);
    Ok(if props.is_empty() {
        text
    } else if text.starts_with(['{', '[']) {
        format!("{props} {text}")
    } else {
        format!("{props}\n{}{text}", ctx.indent)
    })
}

/// Tags set on nodes of `node`, for picking the `%TAG` lines to emit.
fn used_tags(node: &Node) -> Vec<String> {
    let mut tags = Vec::new();
    walk(node, &mut |node| {
        if let Some(tag) = node.tag()
            && !tags.iter().any(|seen| seen == tag)
        {
            tags.push(tag.to_owned());
        }
        true
    });
    tags
}

pub(crate) fn stringify_document(doc: &Document) -> Result<String, StringifyError> {
    if !doc.errors.is_empty() {
        return Err(StringifyError::DocumentHasErrors(doc.errors.clone()));
    }
    doc.options.validate()?;
    let mut contents = doc.contents.clone();
    if let Some(node) = &mut contents {
        anchors::prepare_anchors(node)?;
    }
    let view = Document {
        contents,
        ..doc.clone()
    };
    let doc = &view;
    log::debug!("stringifying document with {} anchors", doc.anchor_names().len());

    let mut lines: Vec<String> = Vec::new();
    let mut has_directives = doc.options.directives == Some(true);
    if doc.options.directives != Some(false) {
        let tags = doc.contents.as_ref().map(used_tags);
        let directives = doc.directives.to_string(tags.as_deref());
        if !directives.is_empty() {
            lines.push(directives);
            has_directives = true;
        } else if doc.directives.doc_start {
            has_directives = true;
        }
    }
    if has_directives {
        lines.push("---".to_owned());
    }

    let mut ctx = StringifyContext::new(doc);
    if let Some(comment) = &doc.comment_before {
        if lines.len() != 1 {
            lines.insert(0, String::new());
        }
        lines.insert(0, indent_comment(&stringify_comment(comment), ""));
    }

    let mut chomp_keep = false;
    let mut content_comment = None;
    match &doc.contents {
        Some(contents) => {
            let meta = contents.meta();
            if meta.space_before && has_directives {
                lines.push(String::new());
            }
            if let Some(comment) = &meta.comment_before {
                lines.push(indent_comment(&stringify_comment(comment), ""));
            }
            ctx.force_block_indent = doc.comment.is_some();
            content_comment = meta.comment.as_deref();
            let mut out = Emitted::default();
            let mut body = stringify_node(Some(contents), &ctx, &mut out)?;
            if out.comment {
                content_comment = None;
            }
            if content_comment.is_none() {
                chomp_keep = out.chomp_keep;
            }
            if let Some(comment) = content_comment {
                body.push_str(&line_comment(&body, "", &stringify_comment(comment)));
            }
            if body.starts_with(['|', '>']) && lines.last().is_some_and(|line| line == "---") {
                lines.pop();
                lines.push(format!("--- {body}"));
            } else {
                lines.push(body);
            }
        }
        None => lines.push(stringify_node(None, &ctx, &mut Emitted::default())?),
    }

    if doc.directives.doc_end {
        match &doc.comment {
            Some(comment) => {
                let comment = stringify_comment(comment);
                if comment.contains('\n') {
                    lines.push("...".to_owned());
                    lines.push(indent_comment(&comment, ""));
                } else {
                    lines.push(format!("... {comment}"));
                }
            }
            None => lines.push("...".to_owned()),
        }
    } else if let Some(comment) = &doc.comment {
        let comment = if chomp_keep {
            comment.trim_start_matches('\n')
        } else {
            comment
        };
        if !comment.is_empty() {
            if (!chomp_keep || content_comment.is_some()) && lines.last().is_some_and(|line| !line.is_empty()) {
                lines.push(String::new());
            }
            lines.push(indent_comment(&stringify_comment(comment), ""));
        }
    }
    Ok(lines.join("\n") + "\n")
}

impl Document {
    /// Render the document as YAML text.
    ///
    /// Fails for documents with errors, invalid layout options and aliases
    /// that have no anchor before them.
    pub fn to_string(&self) -> Result<String, StringifyError> {
        stringify_document(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::{Alias, Pair, ScalarStyle, YamlMap, YamlSeq};
    use crate::error::{ErrorCode, YamlError};
    use crate::options::Version;
    use crate::span::span;
    use crate::value::Value;

    fn stringify_json(value: serde_json::Value, options: &Options) -> String {
        Document::new(&Value::from(value), options)
            .unwrap()
            .to_string()
            .unwrap()
    }

    fn stringify(value: serde_json::Value) -> String {
        stringify_json(value, &Options::default())
    }

    #[test]
    fn test_block_layout() {
        assert_eq!(
            stringify(json!({"a": 1, "b": [1, 2], "c": {"d": "x"}})),
            "a: 1\nb:\n  - 1\n  - 2\nc:\n  d: x\n"
        );
        assert_eq!(stringify(json!([[1, 2], {"a": null}])), "- - 1\n  - 2\n- a: null\n");
        assert_eq!(stringify(json!({})), "{}\n");
        assert_eq!(stringify(json!({"a": [], "b": {}})), "a: []\nb: {}\n");
        assert_eq!(stringify(json!("plain")), "plain\n");
    }

    #[test]
    fn test_strings_keep_their_type() {
        assert_eq!(stringify(json!({"s": "true"})), "s: \"true\"\n");
        assert_eq!(stringify(json!({"s": "a: b"})), "s: \"a: b\"\n");
        assert_eq!(stringify(json!({"s": "line1\nline2\n"})), "s: |\n  line1\n  line2\n");
        assert_eq!(stringify(json!({"s": "a\nb"})), "s: |-\n  a\n  b\n");
        assert_eq!(stringify(json!({"1": "x"})), "\"1\": x\n");
    }

    #[test]
    fn test_indent_seq_off() {
        let options = Options {
            indent_seq: false,
            ..Options::default()
        };
        assert_eq!(
            stringify_json(json!({"a": [1, 2]}), &options),
            "a:\n- 1\n- 2\n"
        );
    }

    #[test]
    fn test_flow_collections() {
        let options = Options {
            collection_style: CollectionStyle::Flow,
            ..Options::default()
        };
        assert_eq!(
            stringify_json(json!({"a": [1, 2], "b": "x"}), &options),
            "{ a: [ 1, 2 ], b: x }\n"
        );
        let options = Options {
            collection_style: CollectionStyle::Flow,
            flow_collection_padding: false,
            ..Options::default()
        };
        assert_eq!(stringify_json(json!({"a": [1, 2]}), &options), "{a: [1, 2]}\n");
    }

    #[test]
    fn test_flow_wraps_past_line_width() {
        let options = Options {
            collection_style: CollectionStyle::Flow,
            line_width: 20,
            min_content_width: 0,
            ..Options::default()
        };
        let text = stringify_json(json!(["alpha", "beta", "gamma", "delta"]), &options);
        assert_eq!(text, "[\n  alpha,\n  beta,\n  gamma,\n  delta\n]\n");
    }

    #[test]
    fn test_comments() {
        let mut doc = Document::new(&Value::from(json!({"a": 1, "b": [2]})), &Options::default()).unwrap();
        doc.comment_before = Some(" top".to_owned());
        doc.comment = Some(" end".to_owned());
        let Some(Node::Map(map)) = &mut doc.contents else {
            panic!("map expected");
        };
        if let Some(value) = map.items[0].value.as_mut() {
            value.meta_mut().comment = Some(" one".to_owned());
        }
        if let Some(key) = map.items[1].key.as_mut() {
            key.meta_mut().comment_before = Some(" before b".to_owned());
            key.meta_mut().space_before = true;
        }
        assert_eq!(
            doc.to_string().unwrap(),
            "# top\n\na: 1 # one\n\n# before b\nb:\n  - 2\n\n# end\n"
        );
    }

    #[test]
    fn test_props_and_aliases() {
        let mut doc = Document::new(&Value::from(json!({"base": {"x": 1}})), &Options::default()).unwrap();
        let alias = doc.create_alias(&["base".into()], Some("b")).unwrap();
        doc.set("copy", alias).unwrap();
        let Some(Node::Map(map)) = &mut doc.contents else {
            panic!("map expected");
        };
        let mut tagged = Scalar::new("v");
        tagged.meta.tag = Some("!custom".to_owned());
        map.items.push(Pair::new("t", tagged));
        assert_eq!(
            doc.to_string().unwrap(),
            "base: &b\n  x: 1\ncopy: *b\nt: !custom v\n"
        );
    }

    #[test]
    fn test_non_default_tags_are_written() {
        let mut set = YamlMap::new();
        set.kind = MapKind::Set;
        set.items.push(Pair {
            key: Some(Node::from("a")),
            value: None,
        });
        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Map(set));
        assert_eq!(doc.to_string().unwrap(), "!!set\n? a\n");

        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Scalar(Scalar::new(ScalarValue::Binary(b"hi".to_vec()))));
        assert_eq!(doc.to_string().unwrap(), "!!binary |-\naGk=\n");
    }

    #[test]
    fn test_directives() {
        let options = Options::default().with_version(Version::V1_1);
        let mut doc = Document::new(&Value::from(json!({"a": 1})), &options).unwrap();
        doc.directives.yaml.explicit = true;
        assert_eq!(doc.to_string().unwrap(), "%YAML 1.1\n---\na: 1\n");
        doc.options.directives = Some(false);
        assert_eq!(doc.to_string().unwrap(), "a: 1\n");

        let mut doc = Document::new(&Value::from(json!("text\n")), &Options::default()).unwrap();
        doc.directives.doc_start = true;
        doc.directives.doc_end = true;
        assert_eq!(doc.to_string().unwrap(), "--- |\ntext\n...\n");
    }

    #[test]
    fn test_block_scalar_sequence_item() {
        let mut seq = YamlSeq::new();
        seq.items.push(Node::Scalar(Scalar::new("  lead\n").with_style(ScalarStyle::BlockLiteral)));
        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Seq(seq));
        assert_eq!(doc.to_string().unwrap(), "- |2\n    lead\n");
    }

    #[test]
    fn test_refuses_broken_documents() {
        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.errors
            .push(YamlError::new(ErrorCode::BadIndent, span(0, 1), "Bad indentation"));
        assert!(matches!(doc.to_string(), Err(StringifyError::DocumentHasErrors(_))));

        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Alias(Alias::new("missing")));
        assert_eq!(
            doc.to_string(),
            Err(StringifyError::UnresolvedAlias("missing".to_owned()))
        );

        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.options.indent = 0;
        assert!(matches!(doc.to_string(), Err(StringifyError::Options(_))));
    }

    #[test]
    fn test_comment_helpers() {
        assert_eq!(stringify_comment(" a\n\n b"), "# a\n\n# b");
        assert_eq!(stringify_comment(" "), "#");
        assert_eq!(indent_comment("# a\n# b", "  "), "  # a\n  # b");
        assert_eq!(indent_comment("\n\n", "  "), "\n");
        assert_eq!(line_comment("x", "", "# c"), " # c");
        assert_eq!(line_comment("x ", "", "# c"), "# c");
        assert_eq!(line_comment("x", "  ", "# c\n# d"), "\n  # c\n  # d");
    }
}
