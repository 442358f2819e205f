// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! End-to-end properties of parsing and stringifying.

use yaml_document::{
    ErrorCode, Node, Options, ParseError, ScalarValue, SchemaName, Value, parse, parse_document,
    stringify,
};

fn restringify(src: &str) -> String {
    let doc = parse_document(src, &Options::default()).unwrap();
    assert!(doc.errors.is_empty(), "{src:?}: {:?}", doc.errors);
    doc.to_string().unwrap()
}

const SAMPLES: [&str; 9] = [
    "a: 1\nb: [x,   y]\nc: {d: e}\n",
    "- one\n-   two\n- - nested\n  -   deeper\n",
    "key:   'quoted value'\nother: \"with \\t tab\"\n",
    "folded: >\n  some folded\n  text\n\n  next paragraph\n",
    "anchors:\n  base: &base {x: 1}\n  copy: *base\n",
    "# head comment\nlist:\n  # item comment\n  - 1 # trailing\n",
    "? complex key\n: value\nempty:\n",
    "%YAML 1.1\n---\nbool: yes\nint: 0o17\n",
    "x: 1.0\ny: -0.0\n",
];

#[test]
fn test_round_trip_preserves_values() {
    for src in SAMPLES {
        let before = parse(src, &Options::default()).unwrap();
        let after = parse(&restringify(src), &Options::default()).unwrap();
        assert_eq!(before, after, "{src:?}");
    }
}

#[test]
fn test_canonical_sources_are_byte_identical() {
    let test_cases = [
        "a: 1\nb:\n  - x\n  - y\n",
        "[ 1, 2, 3 ]\n",
        "key: 'single'\n",
        "lit: |\n  one\n  two\n",
        "a: &x 1\nb: *x\n",
        "- !!str text\n",
    ];
    for src in test_cases {
        assert_eq!(restringify(src), src);
    }
}

#[test]
fn test_stringify_is_idempotent() {
    for src in SAMPLES {
        let once = restringify(src);
        let twice = restringify(&once);
        assert_eq!(once, twice, "{src:?}");
    }
}

#[test]
fn test_alias_resolves_to_anchored_value() {
    let doc = parse_document("a: &x 1\nb: *x\n", &Options::default()).unwrap();
    assert!(doc.errors.is_empty());
    let Some(Node::Alias(alias)) = doc.get("b") else {
        panic!("alias expected");
    };
    let target = doc.resolve_alias(alias).and_then(Node::scalar_value);
    assert_eq!(target, Some(&ScalarValue::Int(1)));
    assert_eq!(doc.get("a").and_then(Node::scalar_value), target);

    let native = doc.to_native().unwrap();
    assert_eq!(native.get("b"), Some(&Value::Int(1)));
    assert_eq!(native.get("a"), native.get("b"));
}

#[test]
fn test_alias_before_anchor_is_an_error() {
    let doc = parse_document("a: *x\nb: &x 1\n", &Options::default()).unwrap();
    assert!(doc.errors.iter().any(|error| error.code == ErrorCode::BadAlias));
    let Err(ParseError::Yaml(error)) = parse("a: *x\nb: &x 1\n", &Options::default()) else {
        panic!("forward alias should not produce a value");
    };
    assert_eq!(error.code, ErrorCode::BadAlias);
}

#[test]
fn test_duplicate_keys() {
    let doc = parse_document("{a: 1, a: 2}", &Options::default()).unwrap();
    assert_eq!(doc.errors.len(), 1);
    assert_eq!(doc.errors[0].code, ErrorCode::DuplicateKey);
    assert_eq!(doc.get("a").and_then(Node::scalar_value), Some(&ScalarValue::Int(2)));
}

#[test]
fn test_long_scalars_fold() {
    let options = Options {
        line_width: 20,
        ..Options::default()
    };
    let test_cases = ["x".repeat(200), "xxxxxxxxx ".repeat(20).trim_end().to_owned()];
    for text in test_cases {
        let out = stringify(&Value::String(text.clone()), &options).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.len() > 1, "{out:?}");
        assert!(lines.iter().all(|line| line.chars().count() <= 20), "{out:?}");
        assert_eq!(parse(&out, &Options::default()).unwrap(), Value::String(text));
    }
}

#[test]
fn test_negative_zero_stays_float() {
    let out = stringify(&Value::Float(-0.0), &Options::default()).unwrap();
    assert_eq!(out, "-0.0\n");
    let Value::Float(value) = parse(&out, &Options::default()).unwrap() else {
        panic!("float expected from {out:?}");
    };
    assert!(value == 0.0 && value.is_sign_negative());

    let once = restringify("y: -0.0\n");
    assert_eq!(once, "y: -0.0\n");
    let Some(Value::Float(_)) = parse(&once, &Options::default()).unwrap().get("y").cloned() else {
        panic!("float expected from {once:?}");
    };
}

#[test]
fn test_integers_beyond_i64() {
    let src = "a: 99999999999999999999\n";
    let value = parse(src, &Options::default()).unwrap();
    assert_eq!(value.get("a"), Some(&Value::Float(1e20)));

    let options = Options {
        int_as_big_int: true,
        ..Options::default()
    };
    let value = parse(src, &options).unwrap();
    let expected: num_bigint::BigInt = "99999999999999999999".parse().unwrap();
    assert_eq!(value.get("a"), Some(&Value::BigInt(expected)));
}

#[test]
fn test_schema_decides_plain_resolution() {
    let core = parse("yes", &Options::default()).unwrap();
    assert_eq!(core, Value::String("yes".to_owned()));

    let yaml11 = Options::default().with_schema(SchemaName::Yaml11);
    assert_eq!(parse("yes", &yaml11).unwrap(), Value::Bool(true));
}

#[test]
fn test_merge_key() {
    let options = Options {
        merge: Some(true),
        ..Options::default()
    };
    let value = parse("{<<: {a: 1}, b: 2}", &options).unwrap();
    let expected = Value::from(serde_json::json!({"a": 1, "b": 2}));
    assert_eq!(value, expected);

    // without merge the key is an ordinary string
    let value = parse("{<<: {a: 1}, b: 2}", &Options::default()).unwrap();
    assert!(value.get("<<").is_some());
}
