// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Tag registry and the built-in schemas.
//!
//! A [`Schema`] is an ordered list of [`TagDefinition`]s. Untagged plain
//! scalars are resolved by the first default tag whose `test` accepts the
//! source text; explicitly tagged nodes are looked up by tag name, falling
//! back to the schema's known tags.

mod collections;
mod core;
mod yaml11;

use ordermap::OrderMap;

use crate::document::{NumberFormat, Scalar, ScalarStyle, ScalarValue, YamlMap, YamlSeq};
use crate::error::OptionsError;
use crate::options::{CustomTags, Options, SchemaName};

pub use self::collections::{map_tag, omap_tag, pairs_tag, seq_tag, set_tag};
pub use self::core::{float_to_string, string_tag};
pub use self::yaml11::{binary_tag, merge_tag, timestamp_tag};

/// Prefix shared by every built-in tag.
pub const TAG_PREFIX: &str = crate::directives::YAML_TAG_PREFIX;

macro_rules! pattern_test {
    ($name:ident, $re:literal) => {
        fn $name(source: &str) -> bool {
            static RE: std::sync::LazyLock<Option<regex::Regex>> =
                std::sync::LazyLock::new(|| regex::Regex::new($re).ok());
            RE.as_ref().is_some_and(|re| re.is_match(source))
        }
    };
}
pub(crate) use pattern_test;

/// Full name of a built-in tag, e.g. `tag:yaml.org,2002:str` for `str`.
#[must_use]
pub fn yaml_tag(name: &str) -> String {
    format!("{TAG_PREFIX}{name}")
}

/// Which kind of node a tag applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Map,
    Seq,
}

/// Turns tag input into a node value.
#[derive(Debug, Clone, Copy)]
pub enum Resolver {
    /// Resolve scalar source text. An `Err` is reported as a resolution
    /// failure and the text is kept as a string.
    Scalar(fn(&str, &Options) -> Result<Scalar, String>),
    /// Validate or convert a composed map. Problems go to the callback.
    Map(fn(YamlMap, &mut dyn FnMut(String)) -> crate::document::Node),
    /// Validate or convert a composed sequence.
    Seq(fn(YamlSeq, &mut dyn FnMut(String)) -> crate::document::Node),
}

/// A tag the schema knows how to resolve and stringify.
#[derive(Debug, Clone)]
pub struct TagDefinition {
    /// Full tag name. Empty for the json schema's catch-all.
    pub tag: String,
    /// Participates in resolving untagged plain scalars through `test`.
    pub default: bool,
    /// Only applies to plain scalars in key position.
    pub key_only: bool,
    pub format: Option<NumberFormat>,
    pub test: Option<fn(&str) -> bool>,
    pub resolve: Resolver,
    /// Recognise native values this tag stringifies.
    pub identify: Option<fn(&ScalarValue) -> bool>,
    /// Scalar text for output; `None` means the value is written as a string.
    pub stringify: Option<fn(&Scalar, &TagContext<'_>) -> TagOutput>,
}

/// What a tag's stringify sees of the output position.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    pub options: &'a Options,
    /// Width of the current indentation.
    pub indent: usize,
}

/// Result of a tag's stringify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutput {
    /// Final scalar text, written as is.
    Text(String),
    /// A string still to be quoted or folded, preferring the given style.
    Str(String, ScalarStyle),
}

impl TagDefinition {
    /// A scalar tag without default matching.
    #[must_use]
    pub fn scalar(tag: impl Into<String>, resolve: fn(&str, &Options) -> Result<Scalar, String>) -> Self {
        Self {
            tag: tag.into(),
            default: false,
            key_only: false,
            format: None,
            test: None,
            resolve: Resolver::Scalar(resolve),
            identify: None,
            stringify: None,
        }
    }

    #[must_use]
    pub fn with_test(mut self, test: fn(&str) -> bool) -> Self {
        self.default = true;
        self.test = Some(test);
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn with_identify(mut self, identify: fn(&ScalarValue) -> bool) -> Self {
        self.identify = Some(identify);
        self
    }

    #[must_use]
    pub fn with_stringify(mut self, stringify: fn(&Scalar, &TagContext<'_>) -> TagOutput) -> Self {
        self.stringify = Some(stringify);
        self
    }

    #[must_use]
    pub const fn collection(&self) -> Option<CollectionKind> {
        match self.resolve {
            Resolver::Scalar(_) => None,
            Resolver::Map(_) => Some(CollectionKind::Map),
            Resolver::Seq(_) => Some(CollectionKind::Seq),
        }
    }

    /// Whether this default tag accepts the plain scalar `source`.
    #[must_use]
    pub fn matches(&self, source: &str) -> bool {
        self.test.is_some_and(|test| test(source))
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub name: SchemaName,
    /// Tags in resolution order.
    pub tags: Vec<TagDefinition>,
    /// Tags resolvable when named explicitly, but never used by default.
    pub known_tags: OrderMap<String, TagDefinition>,
    /// `<<` merge keys are active.
    pub merge: bool,
}

impl Schema {
    pub fn new(options: &Options) -> Result<Self, OptionsError> {
        let name = options.schema_name();
        let builtin = match name {
            SchemaName::Failsafe => vec![map_tag(), seq_tag(), string_tag()],
            SchemaName::Json => self::core::json_tags(),
            SchemaName::Core => self::core::core_tags(),
            SchemaName::Yaml11 => self::yaml11::yaml11_tags(),
        };
        let mut tags = match &options.custom_tags {
            CustomTags::None => builtin,
            CustomTags::Append(custom) => builtin.into_iter().chain(custom.iter().cloned()).collect(),
            CustomTags::Replace(custom) => {
                // Replacing still keeps the failsafe collection tags
                let mut tags = vec![map_tag(), seq_tag()];
                tags.extend(custom.iter().cloned());
                tags
            }
        };
        if !tags.iter().any(|t| t.tag == yaml_tag("str")) {
            tags.push(string_tag());
        }
        let merge = options.merge_enabled();
        if merge {
            tags.push(merge_tag());
        }
        let known_tags = [
            binary_tag(),
            merge_tag(),
            omap_tag(),
            pairs_tag(),
            set_tag(),
            timestamp_tag(),
        ]
        .into_iter()
        .map(|tag| (tag.tag.clone(), tag))
        .collect();
        log::debug!("schema {} with {} tags", name.as_str(), tags.len());
        Ok(Self {
            name,
            tags,
            known_tags,
            merge,
        })
    }

    /// Definition for an explicit tag name, from the schema's own tags first.
    #[must_use]
    pub fn resolve_tag(&self, name: &str) -> Option<&TagDefinition> {
        self.tags
            .iter()
            .find(|t| t.tag == name)
            .or_else(|| self.known_tags.get(name))
    }

    /// Collection tags applying to `kind`, schema tags first.
    pub fn tags_for_collection_kind(
        &self,
        kind: CollectionKind,
    ) -> impl Iterator<Item = &TagDefinition> {
        self.tags
            .iter()
            .chain(self.known_tags.values())
            .filter(move |t| t.collection() == Some(kind))
    }

    /// The tag resolving an untagged plain scalar.
    #[must_use]
    pub fn default_scalar_tag_for(&self, source: &str, at_key: bool) -> &TagDefinition {
        self.tags
            .iter()
            .find(|t| {
                t.collection().is_none() && t.default && (!t.key_only || at_key) && t.matches(source)
            })
            .unwrap_or_else(|| self.string_tag())
    }

    /// Scalar tag for an explicit tag name, using `source` to pick among
    /// several definitions of the same tag (e.g. `!!int` in hex or octal).
    #[must_use]
    pub fn scalar_tag_by_name(&self, name: &str, source: &str) -> Option<&TagDefinition> {
        let mut with_test = Vec::new();
        for tag in self.tags.iter().filter(|t| t.collection().is_none() && t.tag == name) {
            if tag.default && tag.test.is_some() {
                with_test.push(tag);
            } else {
                return Some(tag);
            }
        }
        with_test
            .iter()
            .find(|t| t.matches(source))
            .copied()
            .or_else(|| {
                self.known_tags
                    .get(name)
                    .filter(|t| t.collection().is_none())
            })
    }

    /// The schema's string tag.
    #[must_use]
    pub fn string_tag(&self) -> &TagDefinition {
        static FALLBACK: std::sync::LazyLock<TagDefinition> = std::sync::LazyLock::new(string_tag);
        let str_tag = yaml_tag("str");
        self.tags.iter().find(|t| t.tag == str_tag).unwrap_or(&FALLBACK)
    }

    /// The tag used to stringify a scalar: by its explicit tag and format,
    /// otherwise by identifying its value.
    #[must_use]
    pub fn tag_for_scalar(&self, scalar: &Scalar) -> Option<&TagDefinition> {
        let all = || self.tags.iter().chain(self.known_tags.values());
        if let Some(tag) = scalar.meta.tag.as_deref() {
            let named: Vec<&TagDefinition> = all().filter(|t| t.tag == tag).collect();
            if let Some(first) = named.first() {
                return named
                    .iter()
                    .find(|t| t.format == scalar.format)
                    .copied()
                    .or(Some(*first));
            }
        }
        let identifies = |t: &&TagDefinition| t.identify.is_some_and(|identify| identify(&scalar.value));
        let mut identified: Vec<&TagDefinition> = self.tags.iter().filter(identifies).collect();
        if identified.is_empty() {
            identified = self.known_tags.values().filter(identifies).collect();
        }
        if identified.len() > 1 && identified.iter().any(|t| t.test.is_some()) {
            identified.retain(|t| t.test.is_some());
        }
        identified
            .iter()
            .find(|t| t.format.is_some() && t.format == scalar.format)
            .or_else(|| identified.iter().find(|t| t.format.is_none()))
            .copied()
    }

    /// Whether values stringified through `tag` can leave the tag out.
    #[must_use]
    pub fn is_implicit(&self, tag: &TagDefinition) -> bool {
        tag.default && self.tags.iter().any(|t| t.tag == tag.tag)
    }

    /// Whether `source` written as a plain scalar would resolve to something
    /// other than a string.
    #[must_use]
    pub fn plain_resolves_as_non_string(&self, source: &str, at_key: bool) -> bool {
        let tag = self.default_scalar_tag_for(source, at_key);
        tag.tag != yaml_tag("str")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Version;

    fn resolve(schema: &Schema, source: &str) -> (String, ScalarValue) {
        let tag = schema.default_scalar_tag_for(source, false);
        let Resolver::Scalar(resolve) = tag.resolve else {
            panic!("scalar tag expected");
        };
        let value = resolve(source, &Options::default()).map_or(ScalarValue::Str(source.into()), |s| s.value);
        (tag.tag.clone(), value)
    }

    #[test]
    fn test_core_schema() {
        let schema = Schema::new(&Options::default()).unwrap();
        let test_cases = [
            ("", ScalarValue::Null),
            ("~", ScalarValue::Null),
            ("True", ScalarValue::Bool(true)),
            ("yes", ScalarValue::Str("yes".into())),
            ("0o17", ScalarValue::Int(15)),
            ("0x1F", ScalarValue::Int(31)),
            ("-12", ScalarValue::Int(-12)),
            ("1.5", ScalarValue::Float(1.5)),
            ("1e3", ScalarValue::Float(1000.0)),
            ("-.inf", ScalarValue::Float(f64::NEG_INFINITY)),
            ("012", ScalarValue::Int(12)),
            ("1_000", ScalarValue::Str("1_000".into())),
        ];
        for (source, expected) in test_cases {
            assert_eq!(resolve(&schema, source).1, expected, "{source:?}");
        }
    }

    #[test]
    fn test_yaml11_schema() {
        let schema = Schema::new(&Options::default().with_version(Version::V1_1)).unwrap();
        assert!(schema.merge);
        let test_cases = [
            ("yes", ScalarValue::Bool(true)),
            ("Off", ScalarValue::Bool(false)),
            ("0b101", ScalarValue::Int(5)),
            ("012", ScalarValue::Int(10)),
            ("1_000", ScalarValue::Int(1000)),
            ("190:20:30", ScalarValue::Int(685_230)),
            ("0x_1F", ScalarValue::Int(31)),
        ];
        for (source, expected) in test_cases {
            assert_eq!(resolve(&schema, source).1, expected, "{source:?}");
        }
        let (tag, value) = resolve(&schema, "2001-12-14");
        assert_eq!(tag, yaml_tag("timestamp"));
        assert!(matches!(value, ScalarValue::Timestamp(_)));
    }

    #[test]
    fn test_json_schema() {
        let options = Options::default().with_schema(SchemaName::Json);
        let schema = Schema::new(&options).unwrap();
        assert_eq!(resolve(&schema, "null").1, ScalarValue::Null);
        assert_eq!(resolve(&schema, "true").1, ScalarValue::Bool(true));
        assert_eq!(resolve(&schema, "-0.5e2").1, ScalarValue::Float(-50.0));
        let tag = schema.default_scalar_tag_for("True", false);
        assert!(tag.tag.is_empty());
        let Resolver::Scalar(resolve) = tag.resolve else {
            panic!("scalar tag expected");
        };
        assert_eq!(
            resolve("True", &options).unwrap_err(),
            "Unresolved plain scalar \"True\""
        );
    }

    #[test]
    fn test_failsafe_schema() {
        let options = Options::default().with_schema(SchemaName::Failsafe);
        let schema = Schema::new(&options).unwrap();
        assert_eq!(resolve(&schema, "123").1, ScalarValue::Str("123".into()));
        assert_eq!(schema.tags.len(), 3);
    }

    #[test]
    fn test_scalar_tag_by_name() {
        let schema = Schema::new(&Options::default()).unwrap();
        let tag = schema.scalar_tag_by_name(&yaml_tag("int"), "0x10").unwrap();
        assert_eq!(tag.format, Some(NumberFormat::Hex));
        let tag = schema.scalar_tag_by_name(&yaml_tag("binary"), "aGk=").unwrap();
        assert_eq!(tag.tag, yaml_tag("binary"));
        assert!(schema.scalar_tag_by_name("!custom", "x").is_none());
    }

    #[test]
    fn test_custom_tags() {
        fn resolve_upper(source: &str, _: &Options) -> Result<Scalar, String> {
            Ok(Scalar::new(source.to_uppercase()))
        }
        let options = Options {
            custom_tags: CustomTags::Append(vec![TagDefinition::scalar("!upper", resolve_upper)]),
            ..Options::default()
        };
        let schema = Schema::new(&options).unwrap();
        assert!(schema.resolve_tag("!upper").is_some());
        let options = Options {
            custom_tags: CustomTags::Replace(vec![TagDefinition::scalar("!upper", resolve_upper)]),
            ..Options::default()
        };
        let schema = Schema::new(&options).unwrap();
        assert!(schema.resolve_tag(&yaml_tag("int")).is_none());
        assert!(schema.resolve_tag(&yaml_tag("str")).is_some());
    }

    #[test]
    fn test_tag_for_scalar() {
        let schema = Schema::new(&Options::default()).unwrap();
        let hex = Scalar::new(31i64).with_format(NumberFormat::Hex);
        assert_eq!(schema.tag_for_scalar(&hex).unwrap().format, Some(NumberFormat::Hex));
        let plain = Scalar::new(31i64);
        assert_eq!(schema.tag_for_scalar(&plain).unwrap().format, None);
        assert!(schema.tag_for_scalar(&Scalar::new("text")).is_some());
    }
}
