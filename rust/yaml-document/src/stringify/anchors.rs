// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Anchor pass run before output.
//!
//! A name defined a second time is renamed to the next free `<name>N`, and
//! each alias is pointed at the name of the anchor it resolved to. The output
//! then has one definition per anchor name.

use std::collections::{HashMap, HashSet};

use crate::document::{Node, find_new_anchor};
use crate::error::StringifyError;
use crate::schema::pattern_test;

pattern_test!(invalid_anchor, r"[\x00-\x19\s,\[\]{}]");

struct AnchorState {
    taken: HashSet<String>,
    defined: HashSet<String>,
    /// Name in the source to the name it is written as.
    current: HashMap<String, String>,
}

fn check_name(name: &str) -> Result<(), StringifyError> {
    if name.is_empty() || invalid_anchor(name) {
        return Err(StringifyError::InvalidAnchor(
            serde_json::Value::String(name.to_owned()).to_string(),
        ));
    }
    Ok(())
}

pub(super) fn prepare_anchors(root: &mut Node) -> Result<(), StringifyError> {
    let mut taken = HashSet::new();
    crate::document::walk(root, &mut |node| {
        if let Some(anchor) = node.anchor() {
            taken.insert(anchor.to_owned());
        }
        true
    });
    let mut state = AnchorState {
        taken,
        defined: HashSet::new(),
        current: HashMap::new(),
    };
    prepare(root, &mut state)
}

fn prepare(node: &mut Node, state: &mut AnchorState) -> Result<(), StringifyError> {
    if let Node::Alias(alias) = node {
        check_name(&alias.source)?;
        return match state.current.get(&alias.source) {
            Some(name) => {
                alias.source.clone_from(name);
                Ok(())
            }
            None => Err(StringifyError::UnresolvedAlias(alias.source.clone())),
        };
    }
    if let Some(anchor) = node.meta().anchor.clone() {
        check_name(&anchor)?;
        let name = if state.defined.insert(anchor.clone()) {
            anchor.clone()
        } else {
            let renamed = find_new_anchor(&anchor, &state.taken);
            log::debug!("anchor &{anchor} defined again, written as &{renamed}");
            state.taken.insert(renamed.clone());
            node.meta_mut().anchor = Some(renamed.clone());
            renamed
        };
        state.current.insert(anchor, name);
    }
    match node {
        Node::Map(map) => {
            for pair in &mut map.items {
                if let Some(key) = &mut pair.key {
                    prepare(key, state)?;
                }
                if let Some(value) = &mut pair.value {
                    prepare(value, state)?;
                }
            }
        }
        Node::Seq(seq) => {
            for item in &mut seq.items {
                prepare(item, state)?;
            }
        }
        Node::Scalar(_) | Node::Alias(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Alias, Scalar, YamlSeq};

    fn anchored(value: i64, anchor: &str) -> Node {
        let mut node = Node::from(value);
        node.meta_mut().anchor = Some(anchor.to_owned());
        node
    }

    fn names(seq: &Node) -> Vec<String> {
        seq.as_seq()
            .map(|seq| {
                seq.items
                    .iter()
                    .map(|item| match item {
                        Node::Alias(alias) => format!("*{}", alias.source),
                        other => format!("&{}", other.anchor().unwrap_or_default()),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_repeated_anchor_renamed() {
        let mut seq = YamlSeq::new();
        seq.items = vec![
            anchored(1, "x"),
            Node::Alias(Alias::new("x")),
            anchored(2, "x"),
            Node::Alias(Alias::new("x")),
        ];
        let mut root = Node::Seq(seq);
        prepare_anchors(&mut root).unwrap();
        assert_eq!(names(&root), vec!["&x", "*x", "&x1", "*x1"]);
    }

    #[test]
    fn test_unresolved_alias() {
        let mut seq = YamlSeq::new();
        seq.items = vec![Node::Alias(Alias::new("x")), anchored(1, "x")];
        let mut root = Node::Seq(seq);
        assert_eq!(
            prepare_anchors(&mut root),
            Err(StringifyError::UnresolvedAlias("x".to_owned()))
        );
    }

    #[test]
    fn test_invalid_anchor_names() {
        for name in ["a b", "a,b", "[a", "", "a\u{1}"] {
            let mut root = Node::Scalar(Scalar::new(1));
            root.meta_mut().anchor = Some(name.to_owned());
            assert!(
                matches!(prepare_anchors(&mut root), Err(StringifyError::InvalidAnchor(_))),
                "{name:?}"
            );
        }
    }
}
