// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! YAML 1.1 types: extra boolean spellings, `0b` and legacy octal integers,
//! sexagesimal numbers, timestamps, binary data and merge keys.

use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use num_bigint::BigInt;
use regex::Regex;

use super::collections::{map_tag, omap_tag, pairs_tag, seq_tag, set_tag};
use super::core::{
    exp_output, fixed_width_int, float_nan_tag, is_float, is_int, null_tag, parse_float, parse_int,
    radix_output, resolve_float_exp, stringify_number, string_tag,
};
use super::{TagContext, TagDefinition, TagOutput, pattern_test, yaml_tag};
use crate::document::{NumberFormat, Scalar, ScalarStyle, ScalarValue, Timestamp};
use crate::options::Options;

pattern_test!(is_true, r"^(?:Y|y|[Yy]es|YES|[Tt]rue|TRUE|[Oo]n|ON)$");
pattern_test!(is_false, r"^(?:N|n|[Nn]o|NO|[Ff]alse|FALSE|[Oo]ff|OFF)$");
pattern_test!(is_bin, r"^[-+]?0b[0-1_]+$");
pattern_test!(is_oct, r"^[-+]?0[0-7_]+$");
pattern_test!(is_int_dec, r"^[-+]?[0-9][0-9_]*$");
pattern_test!(is_hex, r"^[-+]?0x[0-9a-fA-F_]+$");
pattern_test!(is_exp, r"^[-+]?(?:[0-9][0-9_]*)?(?:\.[0-9_]*)?[eE][-+]?[0-9]+$");
pattern_test!(is_float_dec, r"^[-+]?(?:[0-9][0-9_]*)?\.[0-9_]*$");
pattern_test!(is_int_time, r"^[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+$");
pattern_test!(is_float_time, r"^[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*$");
pattern_test!(is_merge, r"^<<$");

static TIMESTAMP: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})",
        r"(?:(?:t|T|[ \t]+)",
        r"([0-9]{1,2}):([0-9]{1,2}):([0-9]{1,2}(\.[0-9]+)?)",
        r"(?:[ \t]*(Z|[-+][012]?[0-9](?::[0-9]{2})?))?",
        r")?$",
    ))
    .ok()
});

fn is_timestamp(source: &str) -> bool {
    TIMESTAMP.as_ref().is_some_and(|re| re.is_match(source))
}

fn bool_output(scalar: &Scalar, ctx: &TagContext<'_>) -> TagOutput {
    let ScalarValue::Bool(value) = scalar.value else {
        return TagOutput::Text(stringify_number(scalar));
    };
    let keeps = if value { is_true } else { is_false };
    if let Some(source) = scalar.source.as_deref()
        && keeps(source)
    {
        return TagOutput::Text(source.to_owned());
    }
    TagOutput::Text(if value { &ctx.options.true_str } else { &ctx.options.false_str }.clone())
}

fn resolve_true(_: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(true))
}

fn resolve_false(_: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(false))
}

/// Signed radix rendering: `-0b101` rather than `0b-101`.
fn signed_radix_output(scalar: &Scalar, radix: u32, prefix: &str) -> TagOutput {
    let negated = match &scalar.value {
        ScalarValue::Int(value) if *value < 0 => value.checked_neg().map(ScalarValue::Int),
        ScalarValue::BigInt(value) if value.sign() == num_bigint::Sign::Minus => {
            Some(ScalarValue::BigInt(-value.clone()))
        }
        _ => None,
    };
    TagOutput::Text(match negated {
        Some(positive) => {
            let positive = Scalar {
                value: positive,
                ..scalar.clone()
            };
            format!("-{}", radix_output(&positive, radix, prefix))
        }
        None => radix_output(scalar, radix, prefix),
    })
}

/// Parse `[-+]a:b:c` as `((a * 60) + b) * 60 + c`.
fn parse_sexagesimal(source: &str, options: &Options) -> Result<ScalarValue, String> {
    let (negative, unsigned) = match source.as_bytes().first() {
        Some(b'-') => (true, &source[1..]),
        Some(b'+') => (false, &source[1..]),
        _ => (false, source),
    };
    let cleaned: String = unsigned.chars().filter(|&ch| ch != '_').collect();
    let mut total = BigInt::from(0);
    for part in cleaned.split(':') {
        let part: BigInt = part
            .parse()
            .map_err(|_| format!("Invalid sexagesimal number {source}"))?;
        total = total * 60 + part;
    }
    if negative {
        total = -total;
    }
    Ok(if options.int_as_big_int {
        ScalarValue::BigInt(total)
    } else {
        fixed_width_int(&total)
    })
}

fn parse_sexagesimal_float(source: &str) -> f64 {
    let (negative, unsigned) = match source.as_bytes().first() {
        Some(b'-') => (true, &source[1..]),
        Some(b'+') => (false, &source[1..]),
        _ => (false, source),
    };
    let total = unsigned
        .split(':')
        .fold(0.0, |total, part| total * 60.0 + parse_float(part));
    if negative { -total } else { total }
}

fn resolve_int_time(source: &str, options: &Options) -> Result<Scalar, String> {
    parse_sexagesimal(source, options).map(Scalar::new)
}

fn resolve_float_time(source: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(parse_sexagesimal_float(source)))
}

/// Base-60 rendering with at least one `:`.
fn sexagesimal_output(scalar: &Scalar, _: &TagContext<'_>) -> TagOutput {
    let (negative, parts) = match &scalar.value {
        ScalarValue::Int(value) => {
            let mut rest = value.unsigned_abs();
            let seconds = rest % 60;
            let mut parts = vec![seconds.to_string()];
            rest /= 60;
            parts.push((rest % 60).to_string());
            if rest >= 60 {
                parts.push((rest / 60).to_string());
            }
            (*value < 0, parts)
        }
        ScalarValue::Float(value) if value.is_finite() => {
            let abs = value.abs();
            let seconds = abs % 60.0;
            let mut rest = ((abs - seconds) / 60.0).round();
            let mut parts = vec![format!("{seconds}")];
            parts.push(format!("{}", rest % 60.0));
            rest = ((rest - rest % 60.0) / 60.0).round();
            if rest > 0.0 {
                parts.push(format!("{rest}"));
            }
            (*value < 0.0, parts)
        }
        _ => return TagOutput::Text(stringify_number(scalar)),
    };
    let body = parts
        .iter()
        .rev()
        .map(|part| {
            if part.split('.').next().is_some_and(|int| int.len() < 2) {
                format!("0{part}")
            } else {
                part.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(":");
    TagOutput::Text(if negative { format!("-{body}") } else { body })
}

fn resolve_timestamp(source: &str, _: &Options) -> Result<Scalar, String> {
    let captures = TIMESTAMP
        .as_ref()
        .and_then(|re| re.captures(source))
        .ok_or_else(|| format!("Invalid timestamp {source}"))?;
    let num = |idx: usize| -> u32 {
        captures
            .get(idx)
            .and_then(|m| m.as_str().split('.').next().and_then(|int| int.parse().ok()))
            .unwrap_or(0)
    };
    let year: i64 = captures
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1970);
    let millis = captures.get(7).map_or(0, |fraction| {
        let digits: String = fraction.as_str()[1..].chars().chain("00".chars()).take(3).collect();
        digits.parse().unwrap_or(0)
    });
    let mut ts = Timestamp::from_parts(year, num(2), num(3), num(4), num(5), num(6), millis);
    if let Some(tz) = captures.get(8).map(|m| m.as_str())
        && tz != "Z"
    {
        let mut offset = parse_sexagesimal_float(tz);
        if offset.abs() < 30.0 {
            offset *= 60.0;
        }
        #[allow(clippy::cast_possible_truncation, reason = "minute offsets are small")]
        let offset_millis = (offset * 60_000.0) as i64;
        ts.epoch_millis -= offset_millis;
    }
    Ok(Scalar::new(ScalarValue::Timestamp(ts)))
}

fn timestamp_output(scalar: &Scalar, _: &TagContext<'_>) -> TagOutput {
    TagOutput::Text(match &scalar.value {
        ScalarValue::Timestamp(ts) => ts.to_iso(),
        other => other.to_key_string(),
    })
}

fn resolve_binary(source: &str, _: &Options) -> Result<Scalar, String> {
    let cleaned: String = source.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
    B64.decode(cleaned)
        .map(|bytes| Scalar::new(ScalarValue::Binary(bytes)))
        .map_err(|err| format!("Invalid base64 in binary scalar: {err}"))
}

/// Base64 text cut into lines that fit the output width.
fn binary_output(scalar: &Scalar, ctx: &TagContext<'_>) -> TagOutput {
    let ScalarValue::Binary(bytes) = &scalar.value else {
        return TagOutput::Text(scalar.value.to_key_string());
    };
    let encoded = B64.encode(bytes);
    let style = scalar.style.unwrap_or(ScalarStyle::BlockLiteral);
    if style == ScalarStyle::QuoteDouble {
        return TagOutput::Str(encoded, style);
    }
    let width = ctx
        .options
        .line_width
        .saturating_sub(ctx.indent)
        .max(ctx.options.min_content_width)
        .max(1);
    let lines: Vec<&str> = encoded
        .as_bytes()
        .chunks(width)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    let separator = if style == ScalarStyle::BlockLiteral { "\n" } else { " " };
    TagOutput::Str(lines.join(separator), style)
}

fn resolve_merge(_: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new("<<"))
}

#[must_use]
pub fn binary_tag() -> TagDefinition {
    TagDefinition::scalar(yaml_tag("binary"), resolve_binary)
        .with_identify(|value| matches!(value, ScalarValue::Binary(_)))
        .with_stringify(binary_output)
}

#[must_use]
pub fn timestamp_tag() -> TagDefinition {
    TagDefinition::scalar(yaml_tag("timestamp"), resolve_timestamp)
        .with_test(is_timestamp)
        .with_identify(|value| matches!(value, ScalarValue::Timestamp(_)))
        .with_stringify(timestamp_output)
}

/// The `<<` merge key, recognised only in key position.
#[must_use]
pub fn merge_tag() -> TagDefinition {
    TagDefinition {
        key_only: true,
        ..TagDefinition::scalar(yaml_tag("merge"), resolve_merge)
            .with_test(is_merge)
            .with_identify(|value| value.as_str() == Some("<<"))
            .with_stringify(|_, _| TagOutput::Text("<<".to_owned()))
    }
}

fn int(
    resolve: fn(&str, &Options) -> Result<Scalar, String>,
    test: fn(&str) -> bool,
    format: Option<NumberFormat>,
    stringify: fn(&Scalar, &TagContext<'_>) -> TagOutput,
) -> TagDefinition {
    let tag = TagDefinition::scalar(yaml_tag("int"), resolve)
        .with_test(test)
        .with_identify(is_int)
        .with_stringify(stringify);
    match format {
        Some(format) => tag.with_format(format),
        None => tag,
    }
}

pub(super) fn yaml11_tags() -> Vec<TagDefinition> {
    vec![
        map_tag(),
        seq_tag(),
        string_tag(),
        null_tag(),
        TagDefinition::scalar(yaml_tag("bool"), resolve_true)
            .with_test(is_true)
            .with_identify(|value| matches!(value, ScalarValue::Bool(true)))
            .with_stringify(bool_output),
        TagDefinition::scalar(yaml_tag("bool"), resolve_false)
            .with_test(is_false)
            .with_identify(|value| matches!(value, ScalarValue::Bool(false)))
            .with_stringify(bool_output),
        int(
            |source, options| parse_int(source, 2, 2, options).map(Scalar::new),
            is_bin,
            Some(NumberFormat::Bin),
            |scalar, _| signed_radix_output(scalar, 2, "0b"),
        ),
        int(
            |source, options| parse_int(source, 1, 8, options).map(Scalar::new),
            is_oct,
            Some(NumberFormat::Oct),
            |scalar, _| signed_radix_output(scalar, 8, "0"),
        ),
        int(
            |source, options| parse_int(source, 0, 10, options).map(Scalar::new),
            is_int_dec,
            None,
            |scalar, _| TagOutput::Text(stringify_number(scalar)),
        ),
        int(
            |source, options| parse_int(source, 2, 16, options).map(Scalar::new),
            is_hex,
            Some(NumberFormat::Hex),
            |scalar, _| signed_radix_output(scalar, 16, "0x"),
        ),
        float_nan_tag(),
        TagDefinition::scalar(yaml_tag("float"), resolve_float_exp)
            .with_test(is_exp)
            .with_format(NumberFormat::Exp)
            .with_identify(is_float)
            .with_stringify(exp_output),
        TagDefinition::scalar(yaml_tag("float"), |source, _| {
            let mut scalar = Scalar::new(parse_float(source));
            if let Some((_, fraction)) = source.split_once('.') {
                let fraction: String = fraction.chars().filter(|&ch| ch != '_').collect();
                if fraction.ends_with('0') {
                    scalar.min_fraction_digits = Some(fraction.len());
                }
            }
            Ok(scalar)
        })
        .with_test(is_float_dec)
        .with_identify(is_float)
        .with_stringify(|scalar, _| TagOutput::Text(stringify_number(scalar))),
        binary_tag(),
        omap_tag(),
        pairs_tag(),
        set_tag(),
        int(
            resolve_int_time,
            is_int_time,
            Some(NumberFormat::Time),
            sexagesimal_output,
        ),
        TagDefinition::scalar(yaml_tag("float"), resolve_float_time)
            .with_test(is_float_time)
            .with_format(NumberFormat::Time)
            .with_identify(is_float)
            .with_stringify(sexagesimal_output),
        timestamp_tag(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(options: &Options) -> TagContext<'_> {
        TagContext { options, indent: 0 }
    }

    #[test]
    fn test_sexagesimal() {
        let options = Options::default();
        assert_eq!(
            parse_sexagesimal("190:20:30", &options).unwrap(),
            ScalarValue::Int(685_230)
        );
        assert_eq!(parse_sexagesimal("-1:00", &options).unwrap(), ScalarValue::Int(-60));
        assert!((parse_sexagesimal_float("190:20:30.15") - 685_230.15).abs() < 1e-6);

        let scalar = Scalar::new(685_230i64).with_format(NumberFormat::Time);
        assert_eq!(
            sexagesimal_output(&scalar, &ctx(&options)),
            TagOutput::Text("190:20:30".into())
        );
        let scalar = Scalar::new(45i64);
        assert_eq!(
            sexagesimal_output(&scalar, &ctx(&options)),
            TagOutput::Text("00:45".into())
        );
    }

    #[test]
    fn test_timestamps() {
        let options = Options::default();
        let test_cases = [
            ("2001-12-14", "2001-12-14"),
            ("2001-12-14t21:59:43.10-05:00", "2001-12-15T02:59:43.100Z"),
            ("2001-12-14 21:59:43.10 -5", "2001-12-15T02:59:43.100Z"),
            ("2001-12-15 2:59:43.10", "2001-12-15T02:59:43.100Z"),
            ("2002-12-14T10:00:00Z", "2002-12-14T10:00:00"),
        ];
        for (source, expected) in test_cases {
            assert!(is_timestamp(source), "{source}");
            let scalar = resolve_timestamp(source, &options).unwrap();
            let ScalarValue::Timestamp(ts) = scalar.value else {
                panic!("timestamp expected for {source}");
            };
            assert_eq!(ts.to_iso(), expected, "{source}");
        }
        assert!(!is_timestamp("2001-12-14 junk"));
    }

    #[test]
    fn test_binary() {
        let options = Options::default();
        let scalar = resolve_binary("R0lG\nODlh\n", &options).unwrap();
        assert_eq!(scalar.value, ScalarValue::Binary(b"GIF89a".to_vec()));
        assert!(resolve_binary("!!!", &options).is_err());

        let options = Options {
            line_width: 4,
            min_content_width: 4,
            ..Options::default()
        };
        let out = binary_output(&scalar, &ctx(&options));
        assert_eq!(
            out,
            TagOutput::Str("R0lG\nODlh".into(), ScalarStyle::BlockLiteral)
        );
    }

    #[test]
    fn test_signed_radix() {
        let options = Options::default();
        let scalar = Scalar::new(-5i64);
        assert_eq!(
            signed_radix_output(&scalar, 2, "0b"),
            TagOutput::Text("-0b101".into())
        );
        let scalar = Scalar::new(8i64);
        assert_eq!(signed_radix_output(&scalar, 8, "0"), TagOutput::Text("010".into()));
        let _ = ctx(&options);
    }

    #[test]
    fn test_bool_keeps_matching_source() {
        let options = Options::default();
        let mut scalar = Scalar::new(true);
        scalar.source = Some("on".into());
        assert_eq!(bool_output(&scalar, &ctx(&options)), TagOutput::Text("on".into()));
        scalar.source = Some("off".into());
        assert_eq!(bool_output(&scalar, &ctx(&options)), TagOutput::Text("true".into()));
    }
}
