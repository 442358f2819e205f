// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Document model node types.

use num_bigint::BigInt;

/// Presentation style of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarStyle {
    Plain,
    QuoteSingle,
    QuoteDouble,
    BlockLiteral,
    BlockFolded,
}

impl ScalarStyle {
    #[must_use]
    pub const fn is_block(self) -> bool {
        matches!(self, Self::BlockLiteral | Self::BlockFolded)
    }
}

/// Number presentation preserved from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    Bin,
    Oct,
    Hex,
    /// Sexagesimal `1:30:00`.
    Time,
    /// Exponential `1e3`.
    Exp,
}

/// A point in time with millisecond precision, stored as UTC epoch millis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub epoch_millis: i64,
}

impl Timestamp {
    #[must_use]
    pub const fn new(epoch_millis: i64) -> Self {
        Self { epoch_millis }
    }

    /// Build a timestamp from UTC calendar fields.
    #[must_use]
    pub fn from_parts(year: i64, month: u32, day: u32, hour: u32, min: u32, sec: u32, millis: u32) -> Self {
        let days = days_from_civil(year, month, day);
        let secs = days * 86_400 + i64::from(hour) * 3600 + i64::from(min) * 60 + i64::from(sec);
        Self::new(secs * 1000 + i64::from(millis))
    }

    /// ISO 8601 rendering, dropping a zero time part and zero millis.
    #[must_use]
    pub fn to_iso(&self) -> String {
        let millis = self.epoch_millis.rem_euclid(1000);
        let secs = self.epoch_millis.div_euclid(1000);
        let days = secs.div_euclid(86_400);
        let sod = secs.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);
        let (hour, min, sec) = (sod / 3600, (sod % 3600) / 60, sod % 60);
        let date = format!("{year:04}-{month:02}-{day:02}");
        match (sod, millis) {
            (0, 0) => date,
            (_, 0) => format!("{date}T{hour:02}:{min:02}:{sec:02}"),
            _ => format!("{date}T{hour:02}:{min:02}:{sec:02}.{millis:03}Z"),
        }
    }
}

fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = i64::from(month);
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// The resolved value of a scalar node.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Str(String),
    Binary(Vec<u8>),
    Timestamp(Timestamp),
}

impl ScalarValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Rendering used when a scalar becomes the key of a native map.
    #[must_use]
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::BigInt(i) => i.to_string(),
            Self::Float(f) => crate::schema::float_to_string(*f),
            Self::Str(s) => s.clone(),
            Self::Binary(bytes) => {
                use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
                B64.encode(bytes)
            }
            Self::Timestamp(ts) => ts.to_iso(),
        }
    }

    /// Loose equality used for map key lookup: integers compare equal to
    /// floats of the same value.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
                #[allow(clippy::cast_precision_loss, reason = "lookup only")]
                let a = *a as f64;
                a == *b
            }
            (Self::Int(a), Self::BigInt(b)) | (Self::BigInt(b), Self::Int(a)) => {
                BigInt::from(*a) == *b
            }
            _ => self == other,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Properties shared by every node kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMeta {
    pub anchor: Option<String>,
    /// Fully resolved tag name, e.g. `tag:yaml.org,2002:str`.
    pub tag: Option<String>,
    /// Comment on the same line as the node, or after it.
    pub comment: Option<String>,
    /// Comment lines directly before the node.
    pub comment_before: Option<String>,
    /// A blank line precedes the node.
    pub space_before: bool,
    /// `[start, value_end, node_end]` byte offsets in the source.
    pub range: Option<[usize; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: ScalarValue,
    pub style: Option<ScalarStyle>,
    pub format: Option<NumberFormat>,
    pub min_fraction_digits: Option<usize>,
    /// Source text after escape processing, as seen by the tag resolver.
    pub source: Option<String>,
    /// Raw CST source, kept when `keep_source_tokens` is set.
    pub src_token: Option<String>,
    pub meta: NodeMeta,
}

impl Scalar {
    #[must_use]
    pub fn new(value: impl Into<ScalarValue>) -> Self {
        Self {
            value: value.into(),
            style: None,
            format: None,
            min_fraction_digits: None,
            source: None,
            src_token: None,
            meta: NodeMeta::default(),
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self::new(ScalarValue::Null)
    }

    #[must_use]
    pub fn with_style(mut self, style: ScalarStyle) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Specialised map semantics selected by a collection tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapKind {
    #[default]
    Map,
    /// `!!set`: every value is null.
    Set,
}

/// Specialised sequence semantics selected by a collection tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeqKind {
    #[default]
    Seq,
    /// `!!omap`: single-pair maps with unique keys.
    OMap,
    /// `!!pairs`: single-pair maps, duplicates allowed.
    Pairs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub key: Option<Node>,
    pub value: Option<Node>,
}

impl Pair {
    #[must_use]
    pub fn new(key: impl Into<Node>, value: impl Into<Node>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    /// The key's scalar value, if the key is a scalar.
    #[must_use]
    pub fn key_value(&self) -> Option<&ScalarValue> {
        match &self.key {
            Some(Node::Scalar(s)) => Some(&s.value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlMap {
    pub items: Vec<Pair>,
    pub flow: bool,
    pub kind: MapKind,
    pub meta: NodeMeta,
}

impl YamlMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the last pair whose scalar key equals `key`.
    #[must_use]
    pub fn position(&self, key: &ScalarValue) -> Option<usize> {
        self.items
            .iter()
            .rposition(|pair| pair.key_value().is_some_and(|k| k.loose_eq(key)))
    }

    #[must_use]
    pub fn get(&self, key: &ScalarValue) -> Option<&Node> {
        self.position(key)
            .and_then(|idx| self.items[idx].value.as_ref())
    }

    pub fn get_mut(&mut self, key: &ScalarValue) -> Option<&mut Node> {
        let idx = self.position(key)?;
        self.items[idx].value.as_mut()
    }

    /// Set the value for `key`, replacing an existing pair's value in place.
    pub fn set(&mut self, key: ScalarValue, value: Node) {
        match self.position(&key) {
            Some(idx) => self.items[idx].value = Some(value),
            None => self.items.push(Pair {
                key: Some(Node::Scalar(Scalar::new(key))),
                value: Some(value),
            }),
        }
    }

    pub fn remove(&mut self, key: &ScalarValue) -> Option<Pair> {
        self.position(key).map(|idx| self.items.remove(idx))
    }

    /// True when every pair's value is absent or a bare null scalar.
    #[must_use]
    pub fn has_all_null_values(&self) -> bool {
        self.items
            .iter()
            .all(|pair| pair.value.as_ref().is_none_or(Node::is_plain_null))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlSeq {
    pub items: Vec<Node>,
    pub flow: bool,
    pub kind: SeqKind,
    pub meta: NodeMeta,
}

impl YamlSeq {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// A reference to the closest preceding node anchored as `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub source: String,
    pub meta: NodeMeta,
}

impl Alias {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            meta: NodeMeta::default(),
        }
    }
}

/// A node of the document model.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Map(YamlMap),
    Seq(YamlSeq),
    Alias(Alias),
}

impl Node {
    #[must_use]
    pub const fn meta(&self) -> &NodeMeta {
        match self {
            Self::Scalar(s) => &s.meta,
            Self::Map(m) => &m.meta,
            Self::Seq(s) => &s.meta,
            Self::Alias(a) => &a.meta,
        }
    }

    pub const fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            Self::Scalar(s) => &mut s.meta,
            Self::Map(m) => &mut m.meta,
            Self::Seq(s) => &mut s.meta,
            Self::Alias(a) => &mut a.meta,
        }
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Map(_) | Self::Seq(_))
    }

    #[must_use]
    pub const fn is_alias(&self) -> bool {
        matches!(self, Self::Alias(_))
    }

    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        self.meta().anchor.as_deref()
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.meta().tag.as_deref()
    }

    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&YamlMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_seq(&self) -> Option<&YamlSeq> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// The scalar value, if this is a scalar.
    #[must_use]
    pub fn scalar_value(&self) -> Option<&ScalarValue> {
        self.as_scalar().map(|s| &s.value)
    }

    /// True for a scalar null without any properties or comments.
    #[must_use]
    pub fn is_plain_null(&self) -> bool {
        match self {
            Self::Scalar(s) => {
                s.value.is_null()
                    && s.meta.tag.is_none()
                    && s.meta.anchor.is_none()
                    && s.meta.comment.is_none()
                    && s.meta.comment_before.is_none()
            }
            _ => false,
        }
    }

    /// Structural equality of values, ignoring comments, ranges, styles and
    /// anchors.
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a.value == b.value,
            (Self::Alias(a), Self::Alias(b)) => a.source == b.source,
            (Self::Seq(a), Self::Seq(b)) => {
                a.items.len() == b.items.len()
                    && a.items.iter().zip(&b.items).all(|(x, y)| x.value_eq(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.items.len() == b.items.len()
                    && a.items.iter().zip(&b.items).all(|(x, y)| {
                        opt_value_eq(x.key.as_ref(), y.key.as_ref())
                            && opt_value_eq(x.value.as_ref(), y.value.as_ref())
                    })
            }
            _ => false,
        }
    }
}

fn opt_value_eq(a: Option<&Node>, b: Option<&Node>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.value_eq(b),
        (None, None) => true,
        (Some(n), None) | (None, Some(n)) => n.is_plain_null(),
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<YamlMap> for Node {
    fn from(value: YamlMap) -> Self {
        Self::Map(value)
    }
}

impl From<YamlSeq> for Node {
    fn from(value: YamlSeq) -> Self {
        Self::Seq(value)
    }
}

impl From<Alias> for Node {
    fn from(value: Alias) -> Self {
        Self::Alias(value)
    }
}

impl From<ScalarValue> for Node {
    fn from(value: ScalarValue) -> Self {
        Self::Scalar(Scalar::new(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::new(value))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::new(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::new(value))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::new(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_iso() {
        let test_cases = [
            (Timestamp::from_parts(2001, 12, 14, 0, 0, 0, 0), "2001-12-14"),
            (
                Timestamp::from_parts(2001, 12, 14, 21, 59, 43, 0),
                "2001-12-14T21:59:43",
            ),
            (
                Timestamp::from_parts(2001, 12, 15, 2, 59, 43, 100),
                "2001-12-15T02:59:43.100Z",
            ),
            (Timestamp::from_parts(1970, 1, 1, 0, 0, 0, 0), "1970-01-01"),
            (Timestamp::from_parts(1969, 12, 31, 23, 0, 0, 0), "1969-12-31T23:00:00"),
        ];
        for (ts, expected) in test_cases {
            assert_eq!(ts.to_iso(), expected);
        }
        assert_eq!(Timestamp::from_parts(1970, 1, 2, 0, 0, 0, 0).epoch_millis, 86_400_000);
    }

    #[test]
    fn test_map_set_get_remove() {
        let mut map = YamlMap::new();
        map.set("a".into(), Node::from(1));
        map.set("b".into(), Node::from(2));
        map.set("a".into(), Node::from(3));
        assert_eq!(map.items.len(), 2);
        assert_eq!(map.get(&"a".into()).and_then(Node::scalar_value), Some(&ScalarValue::Int(3)));
        assert!(map.remove(&"b".into()).is_some());
        assert!(map.get(&"b".into()).is_none());
    }

    #[test]
    fn test_loose_key_equality() {
        let mut map = YamlMap::new();
        map.set(ScalarValue::Int(1), Node::from("one"));
        assert!(map.get(&ScalarValue::Float(1.0)).is_some());
        assert!(map.get(&ScalarValue::Str("1".into())).is_none());
    }

    #[test]
    fn test_value_eq_ignores_presentation() {
        let mut a = Scalar::new("x").with_style(ScalarStyle::QuoteDouble);
        a.meta.comment = Some("note".into());
        let b = Scalar::new("x");
        assert!(Node::from(a).value_eq(&Node::from(b)));
        assert!(!Node::from(1).value_eq(&Node::from("1")));
    }
}
