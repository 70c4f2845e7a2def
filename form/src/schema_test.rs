#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

// =============================================================
// Document
// =============================================================

#[test]
fn from_json_reads_header_fields() {
    let schema = FormSchema::from_json(
        r#"{"title": "Foo Configuration", "extensionURL": "https://example.test/ext", "extensionText": "Get it", "options": []}"#,
    )
    .expect("schema");
    assert_eq!(schema.title.as_deref(), Some("Foo Configuration"));
    assert_eq!(schema.extension_url.as_deref(), Some("https://example.test/ext"));
    assert_eq!(schema.extension_text.as_deref(), Some("Get it"));
    assert!(schema.options.is_empty());
}

#[test]
fn from_json_defaults_missing_options() {
    let schema = FormSchema::from_json("{}").expect("schema");
    assert!(schema.options.is_empty());
    assert!(schema.title.is_none());
}

#[test]
fn from_json_rejects_non_array_options() {
    let err = FormSchema::from_json(r#"{"options": {"a": 1}}"#).expect_err("bad shape");
    assert!(matches!(err, SchemaError::Document(_)));
}

#[test]
fn from_json_rejects_garbage() {
    assert!(matches!(FormSchema::from_json("not json"), Err(SchemaError::Document(_))));
}

#[test]
fn from_value_rejects_non_object() {
    let err = FormSchema::from_value(json!([1, 2])).expect_err("array");
    assert!(matches!(err, SchemaError::Document(_)));
}

#[test]
fn malformed_entry_does_not_fail_document() {
    let schema = FormSchema::from_json(r#"{"options": [{"type": "text", "name": "a"}, 42, {"name": "b"}]}"#)
        .expect("document parses");
    assert_eq!(schema.options.len(), 3);
    assert!(OptionSchema::parse(&schema.options[0]).is_ok());
    assert!(matches!(OptionSchema::parse(&schema.options[1]), Err(SchemaError::InvalidOption(_))));
    assert!(matches!(OptionSchema::parse(&schema.options[2]), Err(SchemaError::InvalidOption(_))));
}

#[test]
fn leaves_flattens_groups_and_skips_broken_entries() {
    let schema = FormSchema::from_value(json!({
        "options": [
            {"type": "text", "name": "a"},
            {"type": "group", "name": "", "options": [
                {"type": "bool", "name": "b"},
                {"type": "group", "options": [{"type": "number", "name": "c"}]}
            ]},
            "broken"
        ]
    }))
    .expect("schema");
    let names: Vec<String> = schema.leaves().into_iter().map(|o| o.name).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

// =============================================================
// Option fields
// =============================================================

#[test]
fn option_type_aliases() {
    assert_eq!(OptionType::parse("string"), Ok(OptionType::Text));
    assert_eq!(OptionType::parse("boolean"), Ok(OptionType::Bool));
    assert_eq!(OptionType::parse("slider"), Ok(OptionType::Slider));
    assert_eq!(OptionType::parse("list"), Err(SchemaError::UnknownType("list".into())));
}

#[test]
fn numeric_fields_accept_numeric_strings() {
    let option = OptionSchema::parse(&json!({
        "type": "number", "name": "alertInterval", "min": "1", "max": 5, "inc": "0.5", "default": 4
    }))
    .expect("option");
    assert_eq!(option.min, Some(1.0));
    assert_eq!(option.max, Some(5.0));
    assert_eq!(option.inc, Some(0.5));
    assert_eq!(option.default_value(), Some(Value::Number(4.0)));
}

#[test]
fn numeric_fields_reject_words() {
    let err = OptionSchema::parse(&json!({"type": "number", "name": "n", "min": "low"})).expect_err("bad min");
    assert!(matches!(err, SchemaError::InvalidOption(_)));
}

#[test]
fn show_if_is_camel_case() {
    let option = OptionSchema::parse(&json!({"type": "number", "name": "t", "showIf": "mode == 'manual'"}))
        .expect("option");
    assert_eq!(option.show_if.as_deref(), Some("mode == 'manual'"));
}

#[test]
fn select_entries_bare_and_pairs() {
    let option = OptionSchema::parse(&json!({
        "type": "select", "name": "scene", "values": ["This", 2, ["other", "The Other"]]
    }))
    .expect("option");
    let entries: Vec<(String, String)> =
        option.values.unwrap_or_default().iter().map(SelectEntry::value_and_label).collect();
    assert_eq!(
        entries,
        vec![
            ("This".to_owned(), "This".to_owned()),
            ("2".to_owned(), "2".to_owned()),
            ("other".to_owned(), "The Other".to_owned()),
        ]
    );
}

#[test]
fn display_label_falls_back_to_name() {
    let option = OptionSchema::parse(&json!({"type": "text", "name": "apiKey"})).expect("option");
    assert_eq!(option.display_label(), "apiKey");
    let option = OptionSchema::parse(&json!({"type": "text", "name": "apiKey", "label": "API Key"})).expect("option");
    assert_eq!(option.display_label(), "API Key");
}

#[test]
fn null_default_is_no_default() {
    let option = OptionSchema::parse(&json!({"type": "text", "name": "a", "default": null})).expect("option");
    assert_eq!(option.default_value(), None);
}

#[test]
fn describe_raw_reads_what_it_can() {
    assert_eq!(describe_raw(&json!({"name": "x", "type": 3})), ("x".to_owned(), "x".to_owned()));
    assert_eq!(describe_raw(&json!({"label": "Pretty"})), (String::new(), "Pretty".to_owned()));
    assert_eq!(describe_raw(&json!(42)), (String::new(), String::new()));
}
