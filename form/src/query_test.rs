use std::rc::Rc;

use futures::executor::block_on;
use serde_json::json;

use super::*;
use crate::builder::FormBuilder;
use crate::store::MemoryStore;

fn schema() -> FormSchema {
    FormSchema::from_value(json!({"options": [
        {"type": "text", "name": "greeting", "default": "hello"},
        {"type": "password", "name": "streamPassword"},
        {"type": "bool", "name": "debug", "default": "true"},
        {"type": "number", "name": "interval", "inc": "0.5", "default": 4},
        {"type": "slider", "name": "volume", "min": 0, "max": 100, "inc": 1},
        {"type": "group", "options": [{"type": "select", "name": "scene", "values": ["a", "b"]}]}
    ]}))
    .expect("schema")
}

#[test]
fn encodes_each_type() {
    let sink = QuerySink::from_schema(&schema());
    sink.persist("greeting", &Value::from("hi there & bye"));
    sink.persist("streamPassword", &Value::from("s3cret"));
    sink.persist("debug", &Value::Bool(false));
    sink.persist("interval", &Value::Number(2.5));
    sink.persist("volume", &Value::Number(30.0));
    sink.persist("scene", &Value::from("b"));

    assert_eq!(
        sink.params(),
        vec![
            ("greeting".to_owned(), "hi%20there%20%26%20bye".to_owned()),
            ("streamPassword".to_owned(), "czNjcmV0".to_owned()),
            ("debug".to_owned(), "false".to_owned()),
            ("interval".to_owned(), "2.5".to_owned()),
            ("volume".to_owned(), "30".to_owned()),
            ("scene".to_owned(), "b".to_owned()),
        ]
    );
}

#[test]
fn step_granularity_fixes_decimals() {
    let sink = QuerySink::from_schema(&schema());
    sink.persist("interval", &Value::Number(3.0));
    assert_eq!(sink.query_string(), "interval=3.0");
}

#[test]
fn password_detection_ignores_case() {
    let doc = json!({"options": [{"type": "text", "name": "OBS_PASSWORD"}]});
    let sink = QuerySink::from_schema(&FormSchema::from_value(doc).expect("schema"));
    sink.persist("OBS_PASSWORD", &Value::from("a?b"));
    assert_eq!(sink.query_string(), "OBS_PASSWORD=YT9i");
}

#[test]
fn defaults_are_omitted() {
    let sink = QuerySink::from_schema(&schema());
    sink.persist("greeting", &Value::from("hello"));
    sink.persist("debug", &Value::Bool(true));
    sink.persist("interval", &Value::Number(4.0));
    assert!(sink.params().is_empty());

    sink.persist("interval", &Value::Number(4.5));
    assert_eq!(sink.query_string(), "interval=4.5");
    sink.persist("interval", &Value::Number(4.0));
    assert_eq!(sink.query_string(), "");
}

#[test]
fn undefined_removes_parameter() {
    let sink = QuerySink::from_schema(&schema());
    sink.persist("scene", &Value::from("b"));
    sink.persist("scene", &Value::Undefined);
    assert!(sink.params().is_empty());
}

#[test]
fn url_appends_with_correct_separator() {
    let sink = QuerySink::from_schema(&schema());
    assert_eq!(sink.url("https://overlay.test/index.html"), "https://overlay.test/index.html");
    sink.persist("scene", &Value::from("b"));
    assert_eq!(sink.url("https://overlay.test/index.html"), "https://overlay.test/index.html?scene=b");
    assert_eq!(sink.url("https://overlay.test/?v=2"), "https://overlay.test/?v=2&scene=b");
    assert_eq!(sink.url("https://overlay.test/?"), "https://overlay.test/?scene=b");
}

#[test]
fn generator_form_only_reports_edits() {
    let schema = schema();
    let sink = Rc::new(QuerySink::from_schema(&schema));
    let form = FormBuilder::new().build(&schema, Rc::clone(&sink) as Rc<dyn ChangeSink>);
    block_on(form.load(&MemoryStore::new()));
    assert_eq!(sink.query_string(), "");

    form.widget("volume").expect("volume").commit_text("75").expect("edit");
    form.widget("debug").expect("debug").commit_text("false").expect("toggle");
    assert_eq!(sink.query_string(), "debug=false&volume=75");
}

#[test]
fn repeated_name_keeps_last_declaration() {
    let doc = json!({"options": [
        {"type": "text", "name": "color", "default": "blue"},
        {"type": "text", "name": "accent"},
        {"type": "number", "name": "color", "inc": "0.5", "default": 1}
    ]});
    let schema = FormSchema::from_value(doc).expect("schema");
    let sink = Rc::new(QuerySink::from_schema(&schema));

    sink.persist("color", &Value::Number(2.0));
    sink.persist("accent", &Value::from("red"));
    assert_eq!(sink.query_string(), "accent=red&color=2.0");

    sink.persist("color", &Value::Number(1.0));
    assert_eq!(sink.query_string(), "accent=red");

    let form = FormBuilder::new().build(&schema, Rc::clone(&sink) as Rc<dyn ChangeSink>);
    form.widget("color").expect("color").commit_text("3").expect("edit");
    assert_eq!(sink.query_string(), "accent=red&color=3.0");
}
