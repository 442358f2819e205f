// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Conversion of a document to plain [`Value`]s.

use std::collections::HashMap;

use ordermap::OrderMap;

use super::{Document, Node, SeqKind, YamlMap, is_merge_key, walk};
use crate::error::{ErrorCode, YamlError};
use crate::span::span;
use crate::value::Value;

/// Per-anchor bookkeeping, keyed by the anchored node's address.
#[derive(Default)]
struct AnchorData {
    /// Converted value, once the anchored node is complete.
    res: Option<Value>,
    /// Times the anchor was used, counting the anchor itself.
    count: i64,
    /// Largest alias fan-out found inside the anchored node.
    alias_count: i64,
}

struct Converter<'d> {
    doc: &'d Document,
    anchors: HashMap<*const Node, AnchorData>,
}

fn node_error(node: &Node, code: ErrorCode, message: impl Into<String>) -> YamlError {
    let [start, end, _] = node.meta().range.unwrap_or_default();
    YamlError::new(code, span(start, end), message)
}

pub(super) fn to_native(doc: &Document) -> Result<Value, YamlError> {
    let Some(contents) = &doc.contents else {
        return Ok(Value::Null);
    };
    let mut anchors = HashMap::new();
    walk(contents, &mut |node| {
        if node.anchor().is_some() && !node.is_alias() {
            anchors.insert(
                std::ptr::from_ref(node),
                AnchorData {
                    count: 1,
                    ..AnchorData::default()
                },
            );
        }
        true
    });
    let mut converter = Converter { doc, anchors };
    converter.convert(contents)
}

impl<'d> Converter<'d> {
    fn convert(&mut self, node: &'d Node) -> Result<Value, YamlError> {
        let value = match node {
            Node::Scalar(scalar) => Value::from(scalar.value.clone()),
            Node::Alias(alias) => return self.convert_alias(node, alias),
            Node::Seq(seq) if seq.kind == SeqKind::OMap => {
                let mut map = OrderMap::new();
                for item in &seq.items {
                    match item {
                        Node::Map(pairs) => self.add_pairs(&mut map, pairs)?,
                        other => {
                            let key = self.key_string(other)?;
                            map.insert(key, Value::Null);
                        }
                    }
                }
                Value::Map(map)
            }
            Node::Seq(seq) => Value::Seq(
                seq.items
                    .iter()
                    .map(|item| self.convert(item))
                    .collect::<Result<_, _>>()?,
            ),
            Node::Map(map) => {
                let mut out = OrderMap::new();
                self.add_pairs(&mut out, map)?;
                Value::Map(out)
            }
        };
        if let Some(data) = self.anchors.get_mut(&std::ptr::from_ref(node)) {
            data.res = Some(value.clone());
        }
        Ok(value)
    }

    fn convert_alias(&mut self, node: &'d Node, alias: &super::Alias) -> Result<Value, YamlError> {
        let Some(source) = self.doc.resolve_alias(alias) else {
            return Err(node_error(
                node,
                ErrorCode::BadAlias,
                format!(
                    "Unresolved alias (the anchor must be set before the alias): {}",
                    alias.source
                ),
            ));
        };
        let max = self.doc.options.max_alias_count;
        let key = std::ptr::from_ref(source);
        let alias_count = if max >= 0 && self.anchors.get(&key).is_some_and(|d| d.alias_count == 0) {
            self.alias_count(source)
        } else {
            0
        };
        let Some(data) = self.anchors.get_mut(&key) else {
            return Err(node_error(node, ErrorCode::BadAlias, "Alias anchor was not registered"));
        };
        let Some(res) = data.res.clone() else {
            return Err(node_error(
                node,
                ErrorCode::BadAlias,
                format!("Circular alias cannot be converted: {}", alias.source),
            ));
        };
        if max >= 0 {
            data.count += 1;
            if data.alias_count == 0 {
                data.alias_count = alias_count;
            }
            if data.count.saturating_mul(data.alias_count) > max {
                log::warn!(
                    "alias *{} expanded {} times, over the limit of {max}",
                    alias.source,
                    data.count
                );
                return Err(node_error(
                    node,
                    ErrorCode::ExcessiveAliasCount,
                    "Excessive alias count indicates a resource exhaustion attack",
                ));
            }
        }
        Ok(res)
    }

    /// The largest product of anchor use counts reachable through `node`.
    fn alias_count(&self, node: &Node) -> i64 {
        match node {
            Node::Alias(alias) => self
                .doc
                .resolve_alias(alias)
                .and_then(|source| self.anchors.get(&std::ptr::from_ref(source)))
                .map_or(0, |data| data.count.saturating_mul(data.alias_count)),
            Node::Seq(seq) => seq
                .items
                .iter()
                .map(|item| self.alias_count(item))
                .max()
                .unwrap_or(0),
            Node::Map(map) => map
                .items
                .iter()
                .flat_map(|pair| [pair.key.as_ref(), pair.value.as_ref()])
                .flatten()
                .map(|item| self.alias_count(item))
                .max()
                .unwrap_or(0),
            Node::Scalar(_) => 1,
        }
    }

    fn add_pairs(&mut self, out: &mut OrderMap<String, Value>, map: &'d YamlMap) -> Result<(), YamlError> {
        for pair in &map.items {
            if let Some(key) = &pair.key
                && is_merge_key(&self.doc.schema, key)
            {
                if let Some(value) = &pair.value {
                    self.merge(out, value)?;
                }
                continue;
            }
            let key = match &pair.key {
                Some(key) => self.key_string(key)?,
                None => String::new(),
            };
            let value = match &pair.value {
                Some(value) => self.convert(value)?,
                None => Value::Null,
            };
            out.insert(key, value);
        }
        Ok(())
    }

    /// Add the entries of `<<` sources that `out` does not have yet.
    fn merge(&mut self, out: &mut OrderMap<String, Value>, value: &'d Node) -> Result<(), YamlError> {
        let sources: Vec<&'d Node> = match value {
            Node::Seq(seq) => seq.items.iter().collect(),
            other => vec![other],
        };
        for source in sources {
            let target = match source {
                Node::Alias(alias) => self.doc.resolve_alias(alias),
                other => Some(other),
            };
            let Some(Node::Map(target)) = target else {
                return Err(node_error(
                    source,
                    ErrorCode::BadCollectionType,
                    "Merge sources must be maps or map aliases",
                ));
            };
            let mut entries = OrderMap::new();
            self.add_pairs(&mut entries, target)?;
            for (key, value) in entries {
                out.entry(key).or_insert(value);
            }
        }
        Ok(())
    }

    fn key_string(&mut self, key: &'d Node) -> Result<String, YamlError> {
        match self.convert(key)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::BigInt(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(crate::schema::float_to_string(f)),
            value @ (Value::Binary(_) | Value::Timestamp(_)) => Ok(serde_json::to_value(&value)
                .ok()
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default()),
            value @ (Value::Seq(_) | Value::Map(_)) => {
                log::warn!("collection map key stringified as JSON");
                serde_json::to_string(&value)
                    .map_err(|err| node_error(key, ErrorCode::NonStringKey, err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::{Alias, Scalar};
    use crate::options::{Options, Version};

    fn seq_with_aliases(count: usize) -> Document {
        let mut doc = Document::new(&Value::from(json!([[1, 2]])), &Options::default()).unwrap();
        let Some(Node::Seq(root)) = &mut doc.contents else {
            panic!("seq expected");
        };
        root.items[0].meta_mut().anchor = Some("a".into());
        for _ in 0..count {
            root.items.push(Node::Alias(Alias::new("a")));
        }
        doc
    }

    #[test]
    fn test_aliases_expand() {
        let doc = seq_with_aliases(2);
        let value = serde_json::to_value(doc.to_native().unwrap()).unwrap();
        assert_eq!(value, json!([[1, 2], [1, 2], [1, 2]]));
    }

    #[test]
    fn test_alias_limit() {
        let mut doc = seq_with_aliases(5);
        doc.options.max_alias_count = 3;
        let err = doc.to_native().unwrap_err();
        assert_eq!(err.code, ErrorCode::ExcessiveAliasCount);

        doc.options.max_alias_count = -1;
        assert!(doc.to_native().is_ok());
    }

    #[test]
    fn test_unresolved_alias() {
        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Alias(Alias::new("nope")));
        let err = doc.to_native().unwrap_err();
        assert_eq!(err.code, ErrorCode::BadAlias);
    }

    #[test]
    fn test_merge_keeps_explicit_keys() {
        let options = Options::default().with_version(Version::V1_1);
        let mut doc = Document::new(&Value::Null, &options).unwrap();
        let mut base = YamlMap::new();
        base.set("x".into(), Node::from(1));
        base.set("y".into(), Node::from(1));
        base.meta.anchor = Some("base".into());
        let mut derived = YamlMap::new();
        derived.set("x".into(), Node::from(2));
        derived.set("<<".into(), Node::Alias(Alias::new("base")));
        derived.set("z".into(), Node::from(3));
        let mut root = YamlMap::new();
        root.set("base".into(), Node::Map(base));
        root.set("derived".into(), Node::Map(derived));
        doc.contents = Some(Node::Map(root));

        let value = serde_json::to_value(doc.to_native().unwrap()).unwrap();
        assert_eq!(value["derived"], json!({"x": 2, "y": 1, "z": 3}));
    }

    #[test]
    fn test_bad_merge_source() {
        let options = Options::default().with_version(Version::V1_1);
        let mut doc = Document::new(&Value::Null, &options).unwrap();
        let mut map = YamlMap::new();
        map.set("<<".into(), Node::Scalar(Scalar::new(1)));
        doc.contents = Some(Node::Map(map));
        let err = doc.to_native().unwrap_err();
        assert_eq!(err.code, ErrorCode::BadCollectionType);
    }

    #[test]
    fn test_scalar_keys_become_strings() {
        let mut map = YamlMap::new();
        map.set(1.into(), Node::from("one"));
        map.set(true.into(), Node::from("yes"));
        map.set(crate::document::ScalarValue::Null, Node::from("nothing"));
        let mut doc = Document::new(&Value::Null, &Options::default()).unwrap();
        doc.contents = Some(Node::Map(map));
        let value = serde_json::to_value(doc.to_native().unwrap()).unwrap();
        assert_eq!(value, json!({"1": "one", "true": "yes", "": "nothing"}));
    }
}
