// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Depth-first traversal with in-place edits.

use super::{Document, Node};

/// Where a visited node sits in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKey {
    Root,
    /// Sequence item index.
    Index(usize),
    /// Key of the map pair at this index.
    Key(usize),
    /// Value of the map pair at this index.
    Value(usize),
}

/// What the traversal does after a node has been visited.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitControl {
    /// Go on into the node's children.
    Continue,
    /// Do not visit the node's children.
    Skip,
    /// Stop the traversal.
    Break,
    /// Remove the node. A removed map key or value removes its whole pair.
    Remove,
    /// Put this node in place of the visited one, then visit it.
    Replace(Node),
    /// Visit the node's children, then continue the parent's items from
    /// this index.
    SetNextIndex(usize),
}

enum Step {
    Next,
    Goto(usize),
    Break,
    Remove,
}

/// Visit every node of `doc` in document order, keys before values.
///
/// The visitor gets the node's position, the node, and the positions of
/// its ancestors from the root down.
pub fn visit<F>(doc: &mut Document, visitor: &mut F)
where
    F: FnMut(VisitKey, &mut Node, &[VisitKey]) -> VisitControl,
{
    let mut path = Vec::new();
    if let Some(root) = &mut doc.contents
        && matches!(visit_node(VisitKey::Root, root, &mut path, visitor), Step::Remove)
    {
        doc.contents = None;
    }
}

fn visit_node<F>(key: VisitKey, node: &mut Node, path: &mut Vec<VisitKey>, visitor: &mut F) -> Step
where
    F: FnMut(VisitKey, &mut Node, &[VisitKey]) -> VisitControl,
{
    let after = loop {
        match visitor(key, node, path) {
            VisitControl::Replace(replacement) => *node = replacement,
            VisitControl::Continue => break Step::Next,
            VisitControl::SetNextIndex(idx) => break Step::Goto(idx),
            VisitControl::Skip => return Step::Next,
            VisitControl::Break => return Step::Break,
            VisitControl::Remove => return Step::Remove,
        }
    };
    path.push(key);
    let children = match node {
        Node::Seq(seq) => visit_items(&mut seq.items, path, visitor),
        Node::Map(map) => visit_pairs(&mut map.items, path, visitor),
        Node::Scalar(_) | Node::Alias(_) => Step::Next,
    };
    path.pop();
    match children {
        Step::Break => Step::Break,
        _ => after,
    }
}

fn visit_items<F>(items: &mut Vec<Node>, path: &mut Vec<VisitKey>, visitor: &mut F) -> Step
where
    F: FnMut(VisitKey, &mut Node, &[VisitKey]) -> VisitControl,
{
    let mut idx = 0;
    while idx < items.len() {
        match visit_node(VisitKey::Index(idx), &mut items[idx], path, visitor) {
            Step::Next => idx += 1,
            Step::Goto(next) => idx = next,
            Step::Break => return Step::Break,
            Step::Remove => {
                items.remove(idx);
            }
        }
    }
    Step::Next
}

fn visit_pairs<F>(pairs: &mut Vec<super::Pair>, path: &mut Vec<VisitKey>, visitor: &mut F) -> Step
where
    F: FnMut(VisitKey, &mut Node, &[VisitKey]) -> VisitControl,
{
    let mut idx = 0;
    while idx < pairs.len() {
        let mut next = idx + 1;
        let mut removed = false;
        let pair = &mut pairs[idx];
        for (key, node) in [
            (VisitKey::Key(idx), pair.key.as_mut()),
            (VisitKey::Value(idx), pair.value.as_mut()),
        ] {
            let Some(node) = node else {
                continue;
            };
            match visit_node(key, node, path, visitor) {
                Step::Next => {}
                Step::Goto(target) => next = target,
                Step::Break => return Step::Break,
                Step::Remove => {
                    removed = true;
                    break;
                }
            }
        }
        if removed {
            pairs.remove(idx);
        } else {
            idx = next;
        }
    }
    Step::Next
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::{Scalar, ScalarValue};
    use crate::options::Options;
    use crate::value::Value;

    fn doc(value: serde_json::Value) -> Document {
        Document::new(&Value::from(value), &Options::default()).unwrap()
    }

    fn native(doc: &Document) -> serde_json::Value {
        serde_json::to_value(doc.to_native().unwrap()).unwrap()
    }

    #[test]
    fn test_visit_order_and_paths() {
        let mut doc = doc(json!({"a": [1, 2], "b": 3}));
        let mut seen = Vec::new();
        visit(&mut doc, &mut |key, node, path| {
            if let Some(value) = node.scalar_value() {
                seen.push((key, value.to_key_string(), path.to_vec()));
            }
            VisitControl::Continue
        });
        assert_eq!(
            seen,
            vec![
                (VisitKey::Key(0), "a".to_owned(), vec![VisitKey::Root]),
                (
                    VisitKey::Index(0),
                    "1".to_owned(),
                    vec![VisitKey::Root, VisitKey::Value(0)]
                ),
                (
                    VisitKey::Index(1),
                    "2".to_owned(),
                    vec![VisitKey::Root, VisitKey::Value(0)]
                ),
                (VisitKey::Key(1), "b".to_owned(), vec![VisitKey::Root]),
                (VisitKey::Value(1), "3".to_owned(), vec![VisitKey::Root]),
            ]
        );
    }

    #[test]
    fn test_remove_and_replace() {
        let mut doc = doc(json!({"keep": [1, null, 2, null], "drop": null, "s": "x"}));
        visit(&mut doc, &mut |key, node, _| match node.scalar_value() {
            Some(ScalarValue::Null) => VisitControl::Remove,
            Some(ScalarValue::Str(s)) if s == "x" && matches!(key, VisitKey::Value(_)) => {
                VisitControl::Replace(Node::Scalar(Scalar::new("X")))
            }
            _ => VisitControl::Continue,
        });
        assert_eq!(native(&doc), json!({"keep": [1, 2], "s": "X"}));
    }

    #[test]
    fn test_skip_and_break() {
        let mut doc = doc(json!([[1, 2], 3, 4]));
        let mut visited = Vec::new();
        visit(&mut doc, &mut |key, node, _| {
            visited.push(key);
            match node.scalar_value() {
                _ if key == VisitKey::Index(0) && node.is_collection() => VisitControl::Skip,
                Some(ScalarValue::Int(3)) => VisitControl::Break,
                _ => VisitControl::Continue,
            }
        });
        assert_eq!(
            visited,
            vec![VisitKey::Root, VisitKey::Index(0), VisitKey::Index(1)]
        );
    }

    #[test]
    fn test_set_next_index_revisits() {
        let mut doc = doc(json!([1, 2, 3]));
        let mut count = 0;
        let mut rewound = false;
        visit(&mut doc, &mut |key, _, _| {
            count += 1;
            if key == VisitKey::Index(2) && !rewound {
                rewound = true;
                return VisitControl::SetNextIndex(0);
            }
            VisitControl::Continue
        });
        assert_eq!(count, 1 + 3 + 3);
    }

    #[test]
    fn test_remove_root() {
        let mut doc = doc(json!("only"));
        visit(&mut doc, &mut |_, _, _| VisitControl::Remove);
        assert!(doc.contents.is_none());
    }
}
