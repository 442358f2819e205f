// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Collection tags: `map`, `seq` and the 1.1 `set`, `omap` and `pairs`.

use super::{Resolver, TagDefinition, yaml_tag};
use crate::document::{MapKind, Node, Pair, SeqKind, YamlMap, YamlSeq};

fn collection_tag(name: &str, resolve: Resolver) -> TagDefinition {
    TagDefinition {
        tag: yaml_tag(name),
        default: true,
        key_only: false,
        format: None,
        test: None,
        resolve,
        identify: None,
        stringify: None,
    }
}

#[must_use]
pub fn map_tag() -> TagDefinition {
    collection_tag("map", Resolver::Map(|map, _| Node::Map(map)))
}

#[must_use]
pub fn seq_tag() -> TagDefinition {
    collection_tag("seq", Resolver::Seq(|seq, _| Node::Seq(seq)))
}

fn resolve_set(mut map: YamlMap, on_error: &mut dyn FnMut(String)) -> Node {
    if !map.has_all_null_values() {
        on_error("Set items must all have null values".to_owned());
    }
    map.kind = MapKind::Set;
    Node::Map(map)
}

/// Turn every item into a single-pair map.
fn resolve_pairs(mut seq: YamlSeq, on_error: &mut dyn FnMut(String)) -> YamlSeq {
    for item in &mut seq.items {
        match item {
            Node::Map(map) => {
                if map.items.len() > 1 {
                    on_error("Each pair must have its own sequence indicator".to_owned());
                }
                if map.items.is_empty() {
                    map.items.push(Pair {
                        key: Some(Node::from(crate::document::ScalarValue::Null)),
                        value: None,
                    });
                }
            }
            other => {
                let key = std::mem::replace(other, Node::from(crate::document::ScalarValue::Null));
                *other = Node::Map(YamlMap {
                    items: vec![Pair {
                        key: Some(key),
                        value: None,
                    }],
                    ..YamlMap::default()
                });
            }
        }
    }
    seq
}

fn resolve_pairs_tag(seq: YamlSeq, on_error: &mut dyn FnMut(String)) -> Node {
    let mut seq = resolve_pairs(seq, on_error);
    seq.kind = SeqKind::Pairs;
    Node::Seq(seq)
}

fn resolve_omap(seq: YamlSeq, on_error: &mut dyn FnMut(String)) -> Node {
    let mut seq = resolve_pairs(seq, on_error);
    let mut seen: Vec<&Node> = Vec::new();
    let mut duplicates = Vec::new();
    for pair in seq.items.iter().filter_map(Node::as_map).filter_map(|m| m.items.first()) {
        let Some(key) = &pair.key else { continue };
        if seen.iter().any(|k| k.value_eq(key)) {
            let name = key
                .scalar_value()
                .map_or_else(|| "[object]".to_owned(), |v| v.to_key_string());
            duplicates.push(name);
        } else {
            seen.push(key);
        }
    }
    for name in duplicates {
        on_error(format!("Ordered maps must not include duplicate keys: {name}"));
    }
    seq.kind = SeqKind::OMap;
    Node::Seq(seq)
}

#[must_use]
pub fn set_tag() -> TagDefinition {
    TagDefinition {
        default: false,
        ..collection_tag("set", Resolver::Map(resolve_set))
    }
}

#[must_use]
pub fn omap_tag() -> TagDefinition {
    TagDefinition {
        default: false,
        ..collection_tag("omap", Resolver::Seq(resolve_omap))
    }
}

#[must_use]
pub fn pairs_tag() -> TagDefinition {
    TagDefinition {
        default: false,
        ..collection_tag("pairs", Resolver::Seq(resolve_pairs_tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Scalar, ScalarValue};

    fn single(key: &str, value: i64) -> Node {
        Node::Map(YamlMap {
            items: vec![Pair::new(key, value)],
            ..YamlMap::default()
        })
    }

    fn apply_seq(tag: &TagDefinition, seq: YamlSeq) -> (Node, Vec<String>) {
        let Resolver::Seq(resolve) = tag.resolve else {
            panic!("seq tag expected");
        };
        let mut errors = Vec::new();
        let node = resolve(seq, &mut |msg| errors.push(msg));
        (node, errors)
    }

    #[test]
    fn test_set_requires_null_values() {
        let Resolver::Map(resolve) = set_tag().resolve else {
            panic!("map tag expected");
        };
        let mut map = YamlMap::new();
        map.items.push(Pair {
            key: Some(Node::from("a")),
            value: None,
        });
        map.items.push(Pair {
            key: Some(Node::from("b")),
            value: Some(Node::Scalar(Scalar::null())),
        });
        let mut errors = Vec::new();
        let node = resolve(map.clone(), &mut |msg| errors.push(msg));
        assert!(errors.is_empty());
        assert_eq!(node.as_map().map(|m| m.kind), Some(MapKind::Set));

        map.set("c".into(), Node::from(1));
        resolve(map, &mut |msg| errors.push(msg));
        assert_eq!(errors, vec!["Set items must all have null values".to_owned()]);
    }

    #[test]
    fn test_omap_duplicate_keys() {
        let seq = YamlSeq {
            items: vec![single("a", 1), single("b", 2), single("a", 3)],
            ..YamlSeq::default()
        };
        let (node, errors) = apply_seq(&omap_tag(), seq);
        assert_eq!(
            errors,
            vec!["Ordered maps must not include duplicate keys: a".to_owned()]
        );
        assert_eq!(node.as_seq().map(|s| s.kind), Some(SeqKind::OMap));
    }

    #[test]
    fn test_pairs_normalise_items() {
        let mut two = YamlMap::new();
        two.set("a".into(), Node::from(1));
        two.set("b".into(), Node::from(2));
        let seq = YamlSeq {
            items: vec![Node::Map(two), Node::from("plain")],
            ..YamlSeq::default()
        };
        let (node, errors) = apply_seq(&pairs_tag(), seq);
        assert_eq!(
            errors,
            vec!["Each pair must have its own sequence indicator".to_owned()]
        );
        let seq = node.as_seq().unwrap();
        let wrapped = seq.items[1].as_map().unwrap();
        assert_eq!(
            wrapped.items[0].key_value(),
            Some(&ScalarValue::Str("plain".into()))
        );
        assert!(wrapped.items[0].value.is_none());
    }
}
