// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Public entry points and options.

use serde_json::json;
use yaml_document::{
    CustomTags, ErrorCode, Node, Options, OptionsError, Scalar, ScalarValue, SchemaName,
    TagDefinition, TokenKind, UniqueKeys, Value, VisitControl, VisitKey, cst, parse,
    parse_all_documents, parse_cst, parse_document, stringify, tokenize, visit,
};

#[test]
fn test_parse_all_documents() {
    let docs = parse_all_documents("a: 1\n---\n- x\n...\n--- text\n", &Options::default()).unwrap();
    assert_eq!(docs.len(), 3);
    assert!(docs.iter().all(|doc| doc.errors.is_empty()));
    assert!(docs[1].directives.doc_end);
    let natives: Vec<Value> = docs.iter().map(|doc| doc.to_native().unwrap()).collect();
    assert_eq!(
        natives,
        [
            Value::from(json!({"a": 1})),
            Value::from(json!(["x"])),
            Value::from(json!("text")),
        ]
    );
}

#[test]
fn test_stringify_options() {
    let value = Value::from(json!({"a": {"b": [1, null]}}));
    let test_cases = [
        (Options::default(), "a:\n  b:\n    - 1\n    - null\n"),
        (
            Options {
                indent: 4,
                ..Options::default()
            },
            "a:\n    b:\n        - 1\n        - null\n",
        ),
        (
            Options {
                indent_seq: false,
                null_str: "~".to_owned(),
                ..Options::default()
            },
            "a:\n  b:\n  - 1\n  - ~\n",
        ),
        (
            Options {
                directives: Some(true),
                ..Options::default()
            },
            "---\na:\n  b:\n    - 1\n    - null\n",
        ),
    ];
    for (options, expected) in test_cases {
        assert_eq!(stringify(&value, &options).unwrap(), expected);
    }
}

#[test]
fn test_options_from_json() {
    let options: Options =
        serde_json::from_str(r#"{"version": "1.1", "indent": 4, "lineWidth": 40, "uniqueKeys": false}"#)
            .unwrap();
    assert_eq!(options.indent, 4);
    assert_eq!(options.line_width, 40);
    assert_eq!(options.schema_name(), SchemaName::Yaml11);
    assert!(matches!(options.unique_keys, UniqueKeys::Off));

    let doc = parse_document("a: 1\na: 2\n", &options).unwrap();
    assert!(doc.errors.is_empty());

    assert!(serde_json::from_str::<Options>(r#"{"schema": "nope"}"#).is_err());
    assert_eq!(
        SchemaName::try_from("nope"),
        Err(OptionsError::UnknownSchema("nope".to_owned()))
    );
}

#[test]
fn test_named_schemas() {
    let failsafe = Options::default().with_schema(SchemaName::Failsafe);
    assert_eq!(parse("a: 1", &failsafe).unwrap(), Value::from(json!({"a": "1"})));

    let json_schema = Options::default().with_schema(SchemaName::Json);
    assert_eq!(
        parse(r#"{"a": 1, "b": true}"#, &json_schema).unwrap(),
        Value::from(json!({"a": 1, "b": true}))
    );
    let doc = parse_document("a: yes", &json_schema).unwrap();
    assert!(doc.errors.iter().any(|error| error.code == ErrorCode::TagResolveFailed));
}

#[test]
fn test_custom_tag() {
    let upper = TagDefinition::scalar("!upper", |source, _| Ok(Scalar::new(source.to_uppercase())));
    let options = Options {
        custom_tags: CustomTags::Append(vec![upper]),
        ..Options::default()
    };
    let value = parse("v: !upper abc\n", &options).unwrap();
    assert_eq!(value.get("v").and_then(Value::as_str), Some("ABC"));
}

#[test]
fn test_visit_edits_values() {
    let mut doc = parse_document("a: x\nb: [y]\nc: drop\n", &Options::default()).unwrap();
    visit(&mut doc, &mut |key, node, _path| {
        let Node::Scalar(scalar) = node else {
            return VisitControl::Continue;
        };
        match (&mut scalar.value, key) {
            (ScalarValue::Str(text), VisitKey::Value(_)) if text.as_str() == "drop" => VisitControl::Remove,
            (ScalarValue::Str(text), VisitKey::Value(_)) => {
                *text = text.to_uppercase();
                VisitControl::Continue
            }
            _ => VisitControl::Continue,
        }
    });
    assert_eq!(
        doc.to_native().unwrap(),
        Value::from(json!({"a": "X", "b": ["y"]}))
    );
}

#[test]
fn test_pretty_error() {
    let src = "a: 1\na: 2\n";
    let doc = parse_document(src, &Options::default()).unwrap();
    let pretty = doc.errors[0].pretty(src);
    assert!(pretty.starts_with("DUPLICATE_KEY: Map keys must be unique at line 2, column 1"));
    assert!(pretty.ends_with("a: 2\n^\n"), "{pretty}");
}

#[test]
fn test_lossless_cst() {
    let src = "# head\nkey: [unterminated\nother: 'x' # c\n";
    let rebuilt: String = parse_cst(src).iter().map(cst::source).collect();
    assert_eq!(rebuilt, src);

    let kinds: Vec<TokenKind> = tokenize("a: 1").map(|token| token.kind).collect();
    assert!(kinds.contains(&TokenKind::MapValueInd));
    assert!(kinds.contains(&TokenKind::Scalar));
}
