// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Scalar tags of the core and json schemas, plus the shared string tag.

use num_bigint::BigInt;

use super::collections::{map_tag, seq_tag};
use super::{TagContext, TagDefinition, TagOutput, pattern_test, yaml_tag};
use crate::document::{NumberFormat, Scalar, ScalarStyle, ScalarValue};
use crate::options::Options;

pattern_test!(is_core_null, r"^(?:~|[Nn]ull|NULL)?$");
pattern_test!(is_core_bool, r"^(?:[Tt]rue|TRUE|[Ff]alse|FALSE)$");
pattern_test!(is_core_oct, r"^0o[0-7]+$");
pattern_test!(is_core_int, r"^[-+]?[0-9]+$");
pattern_test!(is_core_hex, r"^0x[0-9a-fA-F]+$");
pattern_test!(is_float_nan, r"^(?:[-+]?\.(?:inf|Inf|INF)|\.nan|\.NaN|\.NAN)$");
pattern_test!(is_core_exp, r"^[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)[eE][-+]?[0-9]+$");
pattern_test!(is_core_float, r"^[-+]?(?:\.[0-9]+|[0-9]+\.[0-9]*)$");

pattern_test!(is_json_null, r"^null$");
pattern_test!(is_json_bool, r"^(?:true|false)$");
pattern_test!(is_json_int, r"^-?(?:0|[1-9][0-9]*)$");
pattern_test!(is_json_float, r"^-?(?:0|[1-9][0-9]*)(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?$");

pub(super) fn is_null(value: &ScalarValue) -> bool {
    value.is_null()
}

pub(super) fn is_bool(value: &ScalarValue) -> bool {
    matches!(value, ScalarValue::Bool(_))
}

pub(super) fn is_int(value: &ScalarValue) -> bool {
    matches!(value, ScalarValue::Int(_) | ScalarValue::BigInt(_))
}

pub(super) fn is_float(value: &ScalarValue) -> bool {
    matches!(value, ScalarValue::Float(_))
}

fn is_str(value: &ScalarValue) -> bool {
    matches!(value, ScalarValue::Str(_))
}

fn always(_: &str) -> bool {
    true
}

/// Render a float so that it reads back as a float.
#[must_use]
pub fn float_to_string(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_owned()
    } else if value.is_infinite() {
        (if value < 0.0 { "-.inf" } else { ".inf" }).to_owned()
    } else {
        format!("{value:?}")
    }
}

/// Parse an integer literal. `offset` skips a radix prefix after any sign;
/// underscores are ignored. Values outside `i64` become big integers only
/// with `int_as_big_int`, and floats otherwise.
pub(super) fn parse_int(
    source: &str,
    offset: usize,
    radix: u32,
    options: &Options,
) -> Result<ScalarValue, String> {
    let (negative, unsigned) = match source.as_bytes().first() {
        Some(b'-') => (true, &source[1..]),
        Some(b'+') => (false, &source[1..]),
        _ => (false, source),
    };
    let digits: String = unsigned
        .get(offset..)
        .unwrap_or_default()
        .chars()
        .filter(|&ch| ch != '_')
        .collect();
    if !options.int_as_big_int
        && let Ok(value) = i64::from_str_radix(&digits, radix)
    {
        return Ok(ScalarValue::Int(if negative { -value } else { value }));
    }
    let big = BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| format!("Invalid integer {source}"))?;
    let big = if negative { -big } else { big };
    Ok(if options.int_as_big_int {
        ScalarValue::BigInt(big)
    } else {
        fixed_width_int(&big)
    })
}

/// `Int` when the value fits in `i64`, else the nearest `Float`.
pub(super) fn fixed_width_int(value: &BigInt) -> ScalarValue {
    match i64::try_from(value) {
        Ok(value) => ScalarValue::Int(value),
        Err(_) => ScalarValue::Float(value.to_string().parse().unwrap_or(f64::NAN)),
    }
}

/// Parse a float, ignoring underscores. Unparseable input is NaN.
pub(super) fn parse_float(source: &str) -> f64 {
    let cleaned: String = source.chars().filter(|&ch| ch != '_').collect();
    cleaned.parse().unwrap_or(f64::NAN)
}

/// Plain number rendering shared by the numeric tags.
pub(super) fn stringify_number(scalar: &Scalar) -> String {
    match &scalar.value {
        ScalarValue::Int(value) => value.to_string(),
        ScalarValue::BigInt(value) => value.to_string(),
        ScalarValue::Float(value) => {
            let mut text = float_to_string(*value);
            let float_tag = yaml_tag("float");
            if let Some(min) = scalar.min_fraction_digits
                && scalar.format.is_none()
                && scalar.meta.tag.as_deref().is_none_or(|tag| tag == float_tag)
                && text.trim_start_matches('-').starts_with(|ch: char| ch.is_ascii_digit())
                && !text.contains(['e', 'E'])
            {
                let dot = text.find('.').unwrap_or_else(|| {
                    text.push('.');
                    text.len() - 1
                });
                let have = text.len() - dot - 1;
                text.push_str(&"0".repeat(min.saturating_sub(have)));
            }
            text
        }
        other => other.to_key_string(),
    }
}

fn number_output(scalar: &Scalar, _: &TagContext<'_>) -> TagOutput {
    TagOutput::Text(stringify_number(scalar))
}

/// Non-negative integers with a radix prefix; anything else as decimal.
pub(super) fn radix_output(scalar: &Scalar, radix: u32, prefix: &str) -> String {
    let digits = match &scalar.value {
        ScalarValue::Int(value) if *value >= 0 => match radix {
            2 => format!("{value:b}"),
            8 => format!("{value:o}"),
            _ => format!("{value:x}"),
        },
        ScalarValue::BigInt(value) if value.sign() != num_bigint::Sign::Minus => {
            value.to_str_radix(radix)
        }
        _ => return stringify_number(scalar),
    };
    format!("{prefix}{digits}")
}

fn null_output(scalar: &Scalar, ctx: &TagContext<'_>) -> TagOutput {
    TagOutput::Text(match scalar.source.as_deref() {
        Some(source) if is_core_null(source) => source.to_owned(),
        _ => ctx.options.null_str.clone(),
    })
}

fn bool_output(scalar: &Scalar, ctx: &TagContext<'_>) -> TagOutput {
    let ScalarValue::Bool(value) = scalar.value else {
        return TagOutput::Text(stringify_number(scalar));
    };
    if let Some(source) = scalar.source.as_deref()
        && is_core_bool(source)
        && source.starts_with(['t', 'T']) == value
    {
        return TagOutput::Text(source.to_owned());
    }
    TagOutput::Text(if value { &ctx.options.true_str } else { &ctx.options.false_str }.clone())
}

fn resolve_core_null(_: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::null())
}

fn resolve_core_bool(source: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(source.starts_with(['t', 'T'])))
}

fn resolve_core_oct(source: &str, options: &Options) -> Result<Scalar, String> {
    parse_int(source, 2, 8, options).map(Scalar::new)
}

fn resolve_core_int(source: &str, options: &Options) -> Result<Scalar, String> {
    parse_int(source, 0, 10, options).map(Scalar::new)
}

fn resolve_core_hex(source: &str, options: &Options) -> Result<Scalar, String> {
    parse_int(source, 2, 16, options).map(Scalar::new)
}

pub(super) fn resolve_float_nan(source: &str, _: &Options) -> Result<Scalar, String> {
    let value = if source.to_ascii_lowercase().ends_with("nan") {
        f64::NAN
    } else if source.starts_with('-') {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    };
    Ok(Scalar::new(value))
}

pub(super) fn resolve_float_exp(source: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(parse_float(source)))
}

fn resolve_core_float(source: &str, _: &Options) -> Result<Scalar, String> {
    let mut scalar = Scalar::new(parse_float(source));
    if let Some(dot) = source.find('.')
        && source.ends_with('0')
    {
        scalar.min_fraction_digits = Some(source.len() - dot - 1);
    }
    Ok(scalar)
}

/// `1.5e+3` style exponent, or the plain form for non-finite values.
pub(super) fn exp_output(scalar: &Scalar, _: &TagContext<'_>) -> TagOutput {
    let value = match scalar.value {
        ScalarValue::Float(value) => value,
        ScalarValue::Int(value) => {
            #[allow(clippy::cast_precision_loss, reason = "exponent rendering")]
            let value = value as f64;
            value
        }
        _ => return TagOutput::Text(stringify_number(scalar)),
    };
    if !value.is_finite() {
        return TagOutput::Text(stringify_number(scalar));
    }
    let text = format!("{value:e}");
    TagOutput::Text(match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    })
}

fn resolve_str(source: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(source))
}

/// The failsafe string tag. Strings are written by the string stringifier.
#[must_use]
pub fn string_tag() -> TagDefinition {
    TagDefinition {
        default: true,
        ..TagDefinition::scalar(yaml_tag("str"), resolve_str)
    }
    .with_identify(is_str)
}

pub(super) fn null_tag() -> TagDefinition {
    TagDefinition::scalar(yaml_tag("null"), resolve_core_null)
        .with_test(is_core_null)
        .with_identify(is_null)
        .with_stringify(null_output)
}

pub(super) fn float_nan_tag() -> TagDefinition {
    TagDefinition::scalar(yaml_tag("float"), resolve_float_nan)
        .with_test(is_float_nan)
        .with_identify(is_float)
        .with_stringify(number_output)
}

fn int_oct_output(scalar: &Scalar, _: &TagContext<'_>) -> TagOutput {
    TagOutput::Text(radix_output(scalar, 8, "0o"))
}

fn int_hex_output(scalar: &Scalar, _: &TagContext<'_>) -> TagOutput {
    TagOutput::Text(radix_output(scalar, 16, "0x"))
}

pub(super) fn core_tags() -> Vec<TagDefinition> {
    vec![
        map_tag(),
        seq_tag(),
        string_tag(),
        null_tag(),
        TagDefinition::scalar(yaml_tag("bool"), resolve_core_bool)
            .with_test(is_core_bool)
            .with_identify(is_bool)
            .with_stringify(bool_output),
        TagDefinition::scalar(yaml_tag("int"), resolve_core_oct)
            .with_test(is_core_oct)
            .with_format(NumberFormat::Oct)
            .with_identify(is_int)
            .with_stringify(int_oct_output),
        TagDefinition::scalar(yaml_tag("int"), resolve_core_int)
            .with_test(is_core_int)
            .with_identify(is_int)
            .with_stringify(number_output),
        TagDefinition::scalar(yaml_tag("int"), resolve_core_hex)
            .with_test(is_core_hex)
            .with_format(NumberFormat::Hex)
            .with_identify(is_int)
            .with_stringify(int_hex_output),
        float_nan_tag(),
        TagDefinition::scalar(yaml_tag("float"), resolve_float_exp)
            .with_test(is_core_exp)
            .with_format(NumberFormat::Exp)
            .with_identify(is_float)
            .with_stringify(exp_output),
        TagDefinition::scalar(yaml_tag("float"), resolve_core_float)
            .with_test(is_core_float)
            .with_identify(is_float)
            .with_stringify(number_output),
    ]
}

fn json_output(scalar: &Scalar, _: &TagContext<'_>) -> TagOutput {
    let text = match &scalar.value {
        ScalarValue::Null => "null".to_owned(),
        ScalarValue::Bool(value) => value.to_string(),
        ScalarValue::Int(value) => value.to_string(),
        ScalarValue::BigInt(value) => value.to_string(),
        ScalarValue::Float(value) if value.is_finite() => float_to_string(*value),
        ScalarValue::Float(_) => "null".to_owned(),
        other => serde_json::Value::String(other.to_key_string()).to_string(),
    };
    TagOutput::Text(text)
}

fn resolve_json_bool(source: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(source == "true"))
}

fn resolve_json_float(source: &str, _: &Options) -> Result<Scalar, String> {
    Ok(Scalar::new(parse_float(source)))
}

fn resolve_unresolved(source: &str, _: &Options) -> Result<Scalar, String> {
    Err(format!(
        "Unresolved plain scalar {}",
        serde_json::Value::String(source.to_owned())
    ))
}

pub(super) fn json_tags() -> Vec<TagDefinition> {
    vec![
        map_tag(),
        seq_tag(),
        string_tag().with_stringify(|scalar, _| {
            let ScalarValue::Str(value) = &scalar.value else {
                return TagOutput::Text(stringify_number(scalar));
            };
            TagOutput::Str(value.clone(), ScalarStyle::QuoteDouble)
        }),
        TagDefinition::scalar(yaml_tag("null"), resolve_core_null)
            .with_test(is_json_null)
            .with_identify(is_null)
            .with_stringify(json_output),
        TagDefinition::scalar(yaml_tag("bool"), resolve_json_bool)
            .with_test(is_json_bool)
            .with_identify(is_bool)
            .with_stringify(json_output),
        TagDefinition::scalar(yaml_tag("int"), resolve_core_int)
            .with_test(is_json_int)
            .with_identify(is_int)
            .with_stringify(json_output),
        TagDefinition::scalar(yaml_tag("float"), resolve_json_float)
            .with_test(is_json_float)
            .with_identify(is_float)
            .with_stringify(json_output),
        // Catch-all: any other plain scalar is an error
        TagDefinition::scalar("", resolve_unresolved).with_test(always),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(options: &Options) -> TagContext<'_> {
        TagContext { options, indent: 0 }
    }

    #[test]
    fn test_parse_int() {
        let options = Options::default();
        let test_cases = [
            ("42", 0, 10, ScalarValue::Int(42)),
            ("-42", 0, 10, ScalarValue::Int(-42)),
            ("+7", 0, 10, ScalarValue::Int(7)),
            ("0o17", 2, 8, ScalarValue::Int(15)),
            ("-0x_ff", 2, 16, ScalarValue::Int(-255)),
        ];
        for (source, offset, radix, expected) in test_cases {
            assert_eq!(parse_int(source, offset, radix, &options).unwrap(), expected, "{source}");
        }
        assert_eq!(
            parse_int("99999999999999999999", 0, 10, &options).unwrap(),
            ScalarValue::Float(1e20)
        );
        assert_eq!(
            parse_int("-0x10000000000000000", 2, 16, &options).unwrap(),
            ScalarValue::Float(-18_446_744_073_709_551_616.0)
        );

        let options = Options {
            int_as_big_int: true,
            ..Options::default()
        };
        assert_eq!(
            parse_int("12", 0, 10, &options).unwrap(),
            ScalarValue::BigInt(BigInt::from(12))
        );
        let big = parse_int("123456789012345678901234567890", 0, 10, &options).unwrap();
        assert_eq!(
            big,
            ScalarValue::BigInt("123456789012345678901234567890".parse().unwrap())
        );
    }

    #[test]
    fn test_float_rendering() {
        let test_cases = [
            (1.5, "1.5"),
            (1.0, "1.0"),
            (f64::NAN, ".nan"),
            (f64::NEG_INFINITY, "-.inf"),
            (1e21, "1e21"),
        ];
        for (value, expected) in test_cases {
            assert_eq!(float_to_string(value), expected);
        }
    }

    #[test]
    fn test_min_fraction_digits() {
        let scalar = resolve_core_float("1.50", &Options::default()).unwrap();
        assert_eq!(scalar.min_fraction_digits, Some(2));
        assert_eq!(stringify_number(&scalar), "1.50");
        let scalar = resolve_core_float("1.5", &Options::default()).unwrap();
        assert_eq!(stringify_number(&scalar), "1.5");
        let scalar = resolve_core_float("-2.50", &Options::default()).unwrap();
        assert_eq!(stringify_number(&scalar), "-2.50");
    }

    #[test]
    fn test_negative_zero_stays_float() {
        let options = Options::default();
        let text = stringify_number(&Scalar::new(-0.0_f64));
        assert_eq!(text, "-0.0");
        let ScalarValue::Float(value) = resolve_core_float(&text, &options).unwrap().value else {
            panic!("float expected");
        };
        assert!(value == 0.0 && value.is_sign_negative());

        let scalar = resolve_core_float("-0.00", &options).unwrap();
        assert_eq!(stringify_number(&scalar), "-0.00");
    }

    #[test]
    fn test_radix_and_exp_output() {
        let options = Options::default();
        let hex = Scalar::new(255i64);
        assert_eq!(int_hex_output(&hex, &ctx(&options)), TagOutput::Text("0xff".into()));
        let negative = Scalar::new(-8i64);
        assert_eq!(int_oct_output(&negative, &ctx(&options)), TagOutput::Text("-8".into()));
        let exp = Scalar::new(1000.0);
        assert_eq!(exp_output(&exp, &ctx(&options)), TagOutput::Text("1e+3".into()));
        let small = Scalar::new(0.00015);
        assert_eq!(exp_output(&small, &ctx(&options)), TagOutput::Text("1.5e-4".into()));
    }

    #[test]
    fn test_null_and_bool_keep_source() {
        let options = Options::default();
        let mut null = Scalar::null();
        assert_eq!(null_output(&null, &ctx(&options)), TagOutput::Text("null".into()));
        null.source = Some("~".into());
        assert_eq!(null_output(&null, &ctx(&options)), TagOutput::Text("~".into()));

        let mut yes = Scalar::new(true);
        yes.source = Some("TRUE".into());
        assert_eq!(bool_output(&yes, &ctx(&options)), TagOutput::Text("TRUE".into()));
        yes.value = ScalarValue::Bool(false);
        assert_eq!(bool_output(&yes, &ctx(&options)), TagOutput::Text("false".into()));
    }
}
