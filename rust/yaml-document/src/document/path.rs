// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Key and index paths into a document.

use std::fmt;

use super::{Document, Node, Scalar, ScalarValue, YamlMap, YamlSeq, is_merge_key};
use crate::error::PathError;

/// Merge sources nest at most this deep during lookup.
const MAX_MERGE_DEPTH: usize = 32;

/// One step of a path: a map key or a sequence index.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Key(ScalarValue),
    Index(usize),
}

impl PathSegment {
    fn as_key(&self) -> ScalarValue {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(idx) => ScalarValue::Int(i64::try_from(*idx).unwrap_or(i64::MAX)),
        }
    }

    /// Sequences also accept integer keys and numeric strings.
    fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(idx) => Some(*idx),
            Self::Key(ScalarValue::Int(i)) => usize::try_from(*i).ok(),
            Self::Key(ScalarValue::Str(s)) => s.parse().ok(),
            Self::Key(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(&key.to_key_string()),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.into())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::Key(value.into())
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<ScalarValue> for PathSegment {
    fn from(value: ScalarValue) -> Self {
        Self::Key(value)
    }
}

fn join(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

fn not_a_collection(path: &[PathSegment], depth: usize) -> PathError {
    PathError::NotACollection {
        at: join(&path[..depth]),
        remaining: join(&path[depth..]),
    }
}

fn child<'n>(node: &'n Node, segment: &PathSegment) -> Option<&'n Node> {
    match node {
        Node::Map(map) => map.get(&segment.as_key()),
        Node::Seq(seq) => segment.as_index().and_then(|idx| seq.items.get(idx)),
        Node::Scalar(_) | Node::Alias(_) => None,
    }
}

fn child_mut<'n>(node: &'n mut Node, segment: &PathSegment) -> Option<&'n mut Node> {
    match node {
        Node::Map(map) => map.get_mut(&segment.as_key()),
        Node::Seq(seq) => segment.as_index().and_then(|idx| seq.items.get_mut(idx)),
        Node::Scalar(_) | Node::Alias(_) => None,
    }
}

/// Set `segment` of a collection. Sequences are padded with nulls up to the
/// index.
fn set_child(node: &mut Node, segment: &PathSegment, value: Node) -> bool {
    match node {
        Node::Map(map) => {
            map.set(segment.as_key(), value);
            true
        }
        Node::Seq(seq) => {
            let Some(idx) = segment.as_index() else {
                return false;
            };
            if idx < seq.items.len() {
                seq.items[idx] = value;
            } else {
                seq.items
                    .resize_with(idx, || Node::Scalar(Scalar::null()));
                seq.items.push(value);
            }
            true
        }
        Node::Scalar(_) | Node::Alias(_) => false,
    }
}

fn delete_child(node: &mut Node, segment: &PathSegment) -> bool {
    match node {
        Node::Map(map) => map.remove(&segment.as_key()).is_some(),
        Node::Seq(seq) => match segment.as_index() {
            Some(idx) if idx < seq.items.len() => {
                seq.items.remove(idx);
                true
            }
            _ => false,
        },
        Node::Scalar(_) | Node::Alias(_) => false,
    }
}

/// Append to a sequence, or merge another map's pairs into a map.
fn add_to(node: &mut Node, value: Node) -> Result<(), PathError> {
    match (node, value) {
        (Node::Seq(seq), value) => {
            seq.items.push(value);
            Ok(())
        }
        (Node::Map(map), Node::Map(other)) => {
            for pair in other.items {
                match pair.key {
                    Some(Node::Scalar(key)) => {
                        let value = pair.value.unwrap_or_else(|| Node::Scalar(Scalar::null()));
                        match map.position(&key.value) {
                            Some(idx) => map.items[idx].value = Some(value),
                            None => map.items.push(super::Pair {
                                key: Some(Node::Scalar(key)),
                                value: Some(value),
                            }),
                        }
                    }
                    key => map.items.push(super::Pair {
                        key,
                        value: pair.value,
                    }),
                }
            }
            Ok(())
        }
        (Node::Map(_), _) => Err(PathError::CannotAdd("a non-map value for a map")),
        (Node::Scalar(_), _) => Err(PathError::CannotAdd("a scalar")),
        (Node::Alias(_), _) => Err(PathError::CannotAdd("an alias")),
    }
}

/// Nested collections holding `value` at `path`: an index builds a
/// sequence, anything else a map.
fn collection_from_path(path: &[PathSegment], value: Node) -> Node {
    path.iter().rev().fold(value, |inner, segment| match segment {
        PathSegment::Index(idx) => {
            let mut items: Vec<Node> = (0..*idx).map(|_| Node::Scalar(Scalar::null())).collect();
            items.push(inner);
            Node::Seq(YamlSeq {
                items,
                ..YamlSeq::default()
            })
        }
        PathSegment::Key(key) => {
            let mut map = YamlMap::new();
            map.set(key.clone(), inner);
            Node::Map(map)
        }
    })
}

impl Document {
    /// The value at `key` of the root collection.
    #[must_use]
    pub fn get(&self, key: impl Into<PathSegment>) -> Option<&Node> {
        self.get_in(&[key.into()])
    }

    /// The node at `path`. An empty path gives the root. With merge keys
    /// enabled, map lookups fall back to `<<` sources.
    #[must_use]
    pub fn get_in(&self, path: &[PathSegment]) -> Option<&Node> {
        let mut node = self.contents.as_ref()?;
        for segment in path {
            node = match node {
                Node::Map(map) => self.map_lookup(map, &segment.as_key(), 0)?,
                other => child(other, segment)?,
            };
        }
        Some(node)
    }

    /// Mutable access to the node at `path`. Merge keys are not followed.
    pub fn get_in_mut(&mut self, path: &[PathSegment]) -> Option<&mut Node> {
        let mut node = self.contents.as_mut()?;
        for segment in path {
            node = child_mut(node, segment)?;
        }
        Some(node)
    }

    fn map_lookup<'d>(&'d self, map: &'d YamlMap, key: &ScalarValue, depth: usize) -> Option<&'d Node> {
        if let Some(found) = map.get(key) {
            return Some(found);
        }
        if depth >= MAX_MERGE_DEPTH {
            return None;
        }
        let merge_values = map
            .items
            .iter()
            .filter(|pair| pair.key.as_ref().is_some_and(|k| is_merge_key(&self.schema, k)))
            .filter_map(|pair| pair.value.as_ref());
        for value in merge_values {
            let sources: Vec<&Node> = match value {
                Node::Seq(seq) => seq.items.iter().collect(),
                other => vec![other],
            };
            for source in sources {
                let source = match source {
                    Node::Alias(alias) => match self.resolve_alias(alias) {
                        Some(target) => target,
                        None => continue,
                    },
                    other => other,
                };
                if let Node::Map(source) = source
                    && let Some(found) = self.map_lookup(source, key, depth + 1)
                {
                    return Some(found);
                }
            }
        }
        None
    }

    #[must_use]
    pub fn has(&self, key: impl Into<PathSegment>) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn has_in(&self, path: &[PathSegment]) -> bool {
        self.get_in(path).is_some()
    }

    /// Set `key` of the root collection, creating a root map if the document
    /// is empty.
    pub fn set(&mut self, key: impl Into<PathSegment>, value: Node) -> Result<(), PathError> {
        self.set_in(&[key.into()], value)
    }

    /// Set the node at `path`, creating missing intermediate collections.
    /// An empty path replaces the root.
    pub fn set_in(&mut self, path: &[PathSegment], value: Node) -> Result<(), PathError> {
        let Some((last, parents)) = path.split_last() else {
            self.contents = Some(value);
            return Ok(());
        };
        let Some(mut node) = self.contents.as_mut() else {
            self.contents = Some(collection_from_path(path, value));
            return Ok(());
        };
        for (depth, segment) in parents.iter().enumerate() {
            if child(node, segment).is_none() {
                if !node.is_collection() {
                    return Err(not_a_collection(path, depth));
                }
                let created = collection_from_path(&path[depth + 1..], value);
                if set_child(node, segment, created) {
                    return Ok(());
                }
                return Err(not_a_collection(path, depth));
            }
            node = child_mut(node, segment).ok_or_else(|| not_a_collection(path, depth))?;
        }
        if set_child(node, last, value) {
            Ok(())
        } else {
            Err(not_a_collection(path, parents.len()))
        }
    }

    /// Add `value` to the root collection.
    pub fn add(&mut self, value: Node) -> Result<(), PathError> {
        self.add_in(&[], value)
    }

    /// Add `value` to the collection at `path`. A missing final collection
    /// is created by setting `value` there directly.
    pub fn add_in(&mut self, path: &[PathSegment], value: Node) -> Result<(), PathError> {
        if path.is_empty() {
            return match &mut self.contents {
                Some(root) => add_to(root, value),
                None => Err(PathError::CannotAdd("an empty document")),
            };
        }
        match self.get_in_mut(path) {
            Some(target) => add_to(target, value),
            None => self.set_in(path, value),
        }
    }

    /// Remove `key` from the root collection.
    pub fn delete(&mut self, key: impl Into<PathSegment>) -> bool {
        self.delete_in(&[key.into()])
    }

    /// Remove the node at `path`. An empty path clears the document.
    pub fn delete_in(&mut self, path: &[PathSegment]) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return self.contents.take().is_some();
        };
        self.get_in_mut(parents)
            .is_some_and(|parent| delete_child(parent, last))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::options::{Options, Version};
    use crate::value::Value;

    fn doc(value: serde_json::Value) -> Document {
        Document::new(&Value::from(value), &Options::default()).unwrap()
    }

    fn int(node: Option<&Node>) -> Option<i64> {
        match node.and_then(Node::scalar_value) {
            Some(ScalarValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    #[test]
    fn test_get_in() {
        let doc = doc(json!({"a": [10, {"b": 20}], "c": null}));
        assert_eq!(int(doc.get_in(&["a".into(), 0_usize.into()])), Some(10));
        assert_eq!(int(doc.get_in(&["a".into(), 1_usize.into(), "b".into()])), Some(20));
        assert_eq!(int(doc.get_in(&["a".into(), "1".into(), "b".into()])), Some(20));
        assert!(doc.get_in(&["a".into(), 5_usize.into()]).is_none());
        assert!(doc.get_in(&["c".into(), "x".into()]).is_none());
        assert!(doc.has("c"));
        assert!(!doc.has("d"));
        assert!(doc.get_in(&[]).is_some_and(Node::is_collection));
    }

    #[test]
    fn test_set_in_creates_collections() {
        let mut doc = doc(json!({}));
        doc.set_in(&["a".into(), "b".into()], Node::from(1)).unwrap();
        doc.set_in(&["list".into(), 2_usize.into()], Node::from(3)).unwrap();
        assert_eq!(int(doc.get_in(&["a".into(), "b".into()])), Some(1));
        let list = doc.get("list").and_then(Node::as_seq).unwrap();
        assert_eq!(list.items.len(), 3);
        assert!(list.items[0].scalar_value().is_some_and(ScalarValue::is_null));

        doc.set_in(&["list".into(), 0_usize.into()], Node::from(7)).unwrap();
        assert_eq!(int(doc.get_in(&["list".into(), 0_usize.into()])), Some(7));

        let mut empty = Document::new(&Value::Null, &Options::default()).unwrap();
        empty.contents = None;
        empty.set("k", Node::from("v")).unwrap();
        assert!(empty.get("k").is_some());
    }

    #[test]
    fn test_set_in_through_scalar_fails() {
        let mut doc = doc(json!({"a": 1}));
        let err = doc
            .set_in(&["a".into(), "b".into(), "c".into()], Node::from(2))
            .unwrap_err();
        assert_eq!(
            err,
            PathError::NotACollection {
                at: "a".into(),
                remaining: "b.c".into()
            }
        );
    }

    #[test]
    fn test_add_and_delete() {
        let mut doc = doc(json!({"seq": [1], "map": {"x": 1}}));
        doc.add_in(&["seq".into()], Node::from(2)).unwrap();
        assert_eq!(doc.get("seq").and_then(Node::as_seq).map(|s| s.items.len()), Some(2));

        let extra = Node::from(&Value::from(json!({"x": 5, "y": 6})));
        doc.add_in(&["map".into()], extra).unwrap();
        assert_eq!(int(doc.get_in(&["map".into(), "x".into()])), Some(5));
        assert_eq!(int(doc.get_in(&["map".into(), "y".into()])), Some(6));
        assert!(doc.add_in(&["map".into(), "x".into()], Node::from(1)).is_err());

        assert!(doc.delete_in(&["seq".into(), 0_usize.into()]));
        assert_eq!(int(doc.get_in(&["seq".into(), 0_usize.into()])), Some(2));
        assert!(doc.delete("map"));
        assert!(!doc.delete("map"));
        assert!(doc.delete_in(&[]));
        assert!(doc.contents.is_none());
    }

    #[test]
    fn test_get_through_merge_key() {
        let options = Options::default().with_version(Version::V1_1);
        let mut doc = Document::new(&Value::Null, &options).unwrap();
        let mut base = YamlMap::new();
        base.set("x".into(), Node::from(1));
        base.meta.anchor = Some("base".into());
        let mut derived = YamlMap::new();
        derived.set("<<".into(), Node::Alias(crate::document::Alias::new("base")));
        derived.set("y".into(), Node::from(2));
        let mut root = YamlMap::new();
        root.set("base".into(), Node::Map(base));
        root.set("derived".into(), Node::Map(derived));
        doc.contents = Some(Node::Map(root));

        assert_eq!(int(doc.get_in(&["derived".into(), "x".into()])), Some(1));
        assert_eq!(int(doc.get_in(&["derived".into(), "y".into()])), Some(2));
    }
}
