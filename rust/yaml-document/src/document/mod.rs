// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! The mutable document model.
//!
//! A [`Document`] owns one root [`Node`] together with the directives,
//! schema and options it was composed with, and the diagnostics collected
//! on the way. Aliases hold only the name of their anchor and are resolved
//! by looking up the closest preceding anchored node in document order, so
//! the tree never holds a reference cycle.

mod native;
mod node;
mod path;
mod visit;

use std::collections::HashSet;

pub use node::{
    Alias, MapKind, Node, NodeMeta, NumberFormat, Pair, Scalar, ScalarStyle, ScalarValue, SeqKind,
    Timestamp, YamlMap, YamlSeq,
};
pub use path::PathSegment;
pub use visit::{VisitControl, VisitKey, visit};

use crate::directives::Directives;
use crate::error::{OptionsError, YamlError};
use crate::options::{Options, SchemaName, Version};
use crate::schema::{Schema, yaml_tag};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Document {
    pub contents: Option<Node>,
    pub directives: Directives,
    pub schema: Schema,
    pub options: Options,
    pub errors: Vec<YamlError>,
    pub warnings: Vec<YamlError>,
    /// Comment lines before the document contents.
    pub comment_before: Option<String>,
    /// Comment lines after the document contents.
    pub comment: Option<String>,
    /// `[start, value_end, node_end]` byte offsets in the source.
    pub range: [usize; 3],
}

impl Document {
    /// A document holding `value`.
    pub fn new(value: &Value, options: &Options) -> Result<Self, OptionsError> {
        options.validate()?;
        let schema = Schema::new(options)?;
        let mut doc = Self::from_parts(
            Directives::for_version(options.version),
            options.clone(),
            schema,
        );
        doc.contents = Some(doc.create_node(value));
        Ok(doc)
    }

    pub(crate) fn from_parts(directives: Directives, options: Options, schema: Schema) -> Self {
        Self {
            contents: None,
            directives,
            schema,
            options,
            errors: Vec::new(),
            warnings: Vec::new(),
            comment_before: None,
            comment: None,
            range: [0, 0, 0],
        }
    }

    /// Build a node for `value`. Strings that would read back as another
    /// type keep their string value; the stringifier quotes them.
    #[must_use]
    pub fn create_node(&self, value: &Value) -> Node {
        Node::from(value)
    }

    #[must_use]
    pub fn create_pair(&self, key: &Value, value: &Value) -> Pair {
        Pair {
            key: Some(self.create_node(key)),
            value: Some(self.create_node(value)),
        }
    }

    /// An alias to the node at `path`, giving that node an anchor first if
    /// it has none. `name` is used for a new anchor when given and free.
    pub fn create_alias(&mut self, path: &[PathSegment], name: Option<&str>) -> Option<Node> {
        let taken = self.anchor_names();
        let target = self.get_in_mut(path)?;
        if target.is_alias() {
            return None;
        }
        let anchor = match target.anchor() {
            Some(anchor) => anchor.to_owned(),
            None => {
                let anchor = match name {
                    Some(name) if !taken.contains(name) => name.to_owned(),
                    _ => find_new_anchor(name.unwrap_or("a"), &taken),
                };
                target.meta_mut().anchor = Some(anchor.clone());
                anchor
            }
        };
        Some(Node::Alias(Alias::new(anchor)))
    }

    /// Every anchor name used in the document.
    #[must_use]
    pub fn anchor_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        if let Some(contents) = &self.contents {
            walk(contents, &mut |node| {
                if let Some(anchor) = node.anchor() {
                    names.insert(anchor.to_owned());
                }
                true
            });
        }
        names
    }

    /// The last node in document order anchored as `name`.
    #[must_use]
    pub fn find_anchor(&self, name: &str) -> Option<&Node> {
        let mut found = None;
        if let Some(contents) = &self.contents {
            walk(contents, &mut |node| {
                if node.anchor() == Some(name) {
                    found = Some(node);
                }
                true
            });
        }
        found
    }

    /// The node `alias` refers to: the closest anchored node before it.
    #[must_use]
    pub fn resolve_alias(&self, alias: &Alias) -> Option<&Node> {
        let mut found = None;
        if let Some(contents) = &self.contents {
            walk(contents, &mut |node| {
                if let Node::Alias(other) = node
                    && std::ptr::eq(other, alias)
                {
                    return false;
                }
                if node.anchor() == Some(alias.source.as_str()) {
                    found = Some(node);
                }
                true
            });
        }
        found
    }

    /// Switch the document to another YAML version, and with it the schema.
    pub fn set_schema(&mut self, version: Version, schema: Option<SchemaName>) -> Result<(), OptionsError> {
        self.options.version = version;
        self.options.schema = schema;
        self.schema = Schema::new(&self.options)?;
        self.directives.yaml.version = version;
        self.directives.yaml.explicit = version == Version::V1_1;
        log::debug!("document schema set to {}", self.schema.name.as_str());
        Ok(())
    }

    /// The contents as plain data, with aliases and merge keys expanded.
    pub fn to_native(&self) -> Result<Value, YamlError> {
        native::to_native(self)
    }
}

/// Next free `{prefix}N` anchor name, counting from 1.
pub(crate) fn find_new_anchor(prefix: &str, taken: &HashSet<String>) -> String {
    (1..)
        .map(|i| format!("{prefix}{i}"))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| prefix.to_owned())
}

/// Whether `key` is a `<<` merge key under `schema`.
pub(crate) fn is_merge_key(schema: &Schema, key: &Node) -> bool {
    let Node::Scalar(scalar) = key else {
        return false;
    };
    if scalar.value.as_str() != Some("<<") {
        return false;
    }
    match scalar.meta.tag.as_deref() {
        Some(tag) => tag == yaml_tag("merge"),
        None => schema.merge && scalar.style.is_none_or(|style| style == ScalarStyle::Plain),
    }
}

/// Pre-order walk, keys before values. Returning `false` from `f` stops the
/// walk.
pub(crate) fn walk<'a>(node: &'a Node, f: &mut impl FnMut(&'a Node) -> bool) -> bool {
    if !f(node) {
        return false;
    }
    match node {
        Node::Map(map) => map.items.iter().all(|pair| {
            pair.key.as_ref().is_none_or(|key| walk(key, f))
                && pair.value.as_ref().is_none_or(|value| walk(value, f))
        }),
        Node::Seq(seq) => seq.items.iter().all(|item| walk(item, f)),
        Node::Scalar(_) | Node::Alias(_) => true,
    }
}
