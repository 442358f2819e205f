// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Parse and stringify options.
//!
//! [`Options`] can be built in code or deserialized from JSON:
//!
//! ```
//! let options: yaml_document::Options =
//!     serde_json::from_str(r#"{"version": "1.1", "lineWidth": 40}"#).unwrap();
//! assert_eq!(options.line_width, 40);
//! ```

use crate::document::{Node, ScalarStyle};
use crate::error::OptionsError;
use crate::schema::TagDefinition;

/// The YAML language version a document follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
pub enum Version {
    #[serde(rename = "1.1")]
    V1_1,
    #[default]
    #[serde(rename = "1.2")]
    V1_2,
}

impl Version {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1_1 => "1.1",
            Self::V1_2 => "1.2",
        }
    }
}

impl TryFrom<&str> for Version {
    type Error = OptionsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "1.1" => Ok(Self::V1_1),
            "1.2" => Ok(Self::V1_2),
            other => Err(OptionsError::UnsupportedVersion(other.to_owned())),
        }
    }
}

/// Built-in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub enum SchemaName {
    #[serde(rename = "failsafe")]
    Failsafe,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "core")]
    Core,
    #[serde(rename = "yaml-1.1")]
    Yaml11,
}

impl SchemaName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Failsafe => "failsafe",
            Self::Json => "json",
            Self::Core => "core",
            Self::Yaml11 => "yaml-1.1",
        }
    }
}

impl TryFrom<&str> for SchemaName {
    type Error = OptionsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "failsafe" => Ok(Self::Failsafe),
            "json" => Ok(Self::Json),
            "core" => Ok(Self::Core),
            "yaml-1.1" => Ok(Self::Yaml11),
            other => Err(OptionsError::UnknownSchema(other.to_owned())),
        }
    }
}

/// Map key uniqueness policy.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(from = "bool")]
pub enum UniqueKeys {
    Off,
    /// Keys are equal when their values are equal.
    #[default]
    ByValue,
    Custom(fn(&Node, &Node) -> bool),
}

impl From<bool> for UniqueKeys {
    fn from(value: bool) -> Self {
        if value { Self::ByValue } else { Self::Off }
    }
}

/// How custom tags combine with the schema's built-in tags.
#[derive(Debug, Clone, Default)]
pub enum CustomTags {
    #[default]
    None,
    /// Added after the built-in tags.
    Append(Vec<TagDefinition>),
    /// Used instead of the built-in tags.
    Replace(Vec<TagDefinition>),
}

/// Which block scalar styles the stringifier may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockQuote {
    Off,
    Literal,
    Folded,
    #[default]
    Both,
}

/// Forced collection layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStyle {
    /// Keep each collection's own `flow` flag.
    #[default]
    Any,
    Block,
    Flow,
}

/// Options for parsing, composing and stringifying.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    // Parsing and composing
    pub version: Version,
    /// Defaults to `core` for 1.2 and `yaml-1.1` for 1.1.
    pub schema: Option<SchemaName>,
    #[serde(skip)]
    pub custom_tags: CustomTags,
    pub int_as_big_int: bool,
    pub unique_keys: UniqueKeys,
    /// Enable `<<` merge keys. Defaults to on for the yaml-1.1 schema.
    pub merge: Option<bool>,
    /// Limit on alias expansions when converting to native values. Negative
    /// disables the check.
    pub max_alias_count: i64,
    /// Deepest collection nesting the composer descends into. Deeper
    /// collections are reported and composed as null.
    pub max_depth: usize,
    /// Report multi-line and over-long implicit keys as errors rather than
    /// warnings, and make [`parse`](crate::parse) fail on the first error.
    pub strict: bool,
    /// Fill in line/column positions on diagnostics.
    pub pretty_errors: bool,
    pub keep_source_tokens: bool,

    // Stringifying
    pub line_width: usize,
    pub min_content_width: usize,
    pub indent: usize,
    /// Indent block sequences inside maps.
    pub indent_seq: bool,
    pub default_string_type: ScalarStyle,
    pub default_key_type: Option<ScalarStyle>,
    pub block_quote: BlockQuote,
    pub collection_style: CollectionStyle,
    pub flow_collection_padding: bool,
    pub null_str: String,
    pub true_str: String,
    pub false_str: String,
    pub double_quoted_as_json: bool,
    pub double_quoted_min_multiline_length: usize,
    /// Prefer single quotes (`Some(true)`), never use them (`Some(false)`),
    /// or pick by content (`None`).
    pub single_quote: Option<bool>,
    /// Keys must be single-line scalars.
    pub simple_keys: bool,
    /// Force (`Some(true)`) or suppress (`Some(false)`) the directives
    /// section and `---` marker.
    pub directives: Option<bool>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            version: Version::V1_2,
            schema: None,
            custom_tags: CustomTags::None,
            int_as_big_int: false,
            unique_keys: UniqueKeys::ByValue,
            merge: None,
            max_alias_count: 100,
            max_depth: 64,
            strict: true,
            pretty_errors: true,
            keep_source_tokens: false,
            line_width: 80,
            min_content_width: 20,
            indent: 2,
            indent_seq: true,
            default_string_type: ScalarStyle::Plain,
            default_key_type: None,
            block_quote: BlockQuote::Both,
            collection_style: CollectionStyle::Any,
            flow_collection_padding: true,
            null_str: "null".to_owned(),
            true_str: "true".to_owned(),
            false_str: "false".to_owned(),
            double_quoted_as_json: false,
            double_quoted_min_multiline_length: 40,
            single_quote: None,
            simple_keys: false,
            directives: None,
        }
    }
}

impl Options {
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: SchemaName) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The schema in effect, falling back to the version default.
    #[must_use]
    pub fn schema_name(&self) -> SchemaName {
        self.schema.unwrap_or(match self.version {
            Version::V1_1 => SchemaName::Yaml11,
            Version::V1_2 => SchemaName::Core,
        })
    }

    /// Whether `<<` merge keys are active.
    #[must_use]
    pub fn merge_enabled(&self) -> bool {
        self.merge
            .unwrap_or(self.schema_name() == SchemaName::Yaml11)
    }

    /// Check stringify-related values.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.indent == 0 {
            return Err(OptionsError::InvalidIndent(self.indent));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.schema_name(), SchemaName::Core);
        assert!(!options.merge_enabled());
        assert!(options.validate().is_ok());
        let options = Options::default().with_version(Version::V1_1);
        assert_eq!(options.schema_name(), SchemaName::Yaml11);
        assert!(options.merge_enabled());
    }

    #[test]
    fn test_deserialize() {
        let options: Options = serde_json::from_str(
            r#"{"version": "1.1", "schema": "json", "uniqueKeys": false, "lineWidth": 0,
                "defaultStringType": "QUOTE_DOUBLE", "blockQuote": "literal"}"#,
        )
        .unwrap();
        assert_eq!(options.version, Version::V1_1);
        assert_eq!(options.schema_name(), SchemaName::Json);
        assert!(matches!(options.unique_keys, UniqueKeys::Off));
        assert_eq!(options.line_width, 0);
        assert_eq!(options.default_string_type, ScalarStyle::QuoteDouble);
        assert_eq!(options.block_quote, BlockQuote::Literal);
        assert_eq!(options.indent, 2);
    }

    #[test]
    fn test_try_from_str() {
        assert_eq!(SchemaName::try_from("yaml-1.1"), Ok(SchemaName::Yaml11));
        assert!(matches!(
            SchemaName::try_from("yaml-1.3"),
            Err(OptionsError::UnknownSchema(_))
        ));
        assert_eq!(Version::try_from("1.1"), Ok(Version::V1_1));
        assert!(Version::try_from("2.0").is_err());
    }

    #[test]
    fn test_validate_indent() {
        let options = Options {
            indent: 0,
            ..Options::default()
        };
        assert_eq!(options.validate(), Err(OptionsError::InvalidIndent(0)));
    }
}
