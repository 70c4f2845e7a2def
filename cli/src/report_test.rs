use std::rc::Rc;

use configform::{ChangeSink, FormBuilder, FormSchema, MemoryStore, PersistQueue};
use serde_json::json;

use super::*;

fn form() -> Form {
    let schema = FormSchema::from_value(json!({
        "title": "Overlay",
        "options": [
            {"type": "bool", "name": "advanced", "default": "false"},
            {"type": "group", "label": "Tuning", "showIf": "advanced", "options": [
                {"type": "number", "name": "interval", "default": 4}
            ]},
            {"type": "bogus", "name": "broken", "label": "Broken"},
            {"type": "select", "name": "scene", "values": ["a", "b"]}
        ]
    }))
    .expect("schema");
    let (queue, _rx) = PersistQueue::channel();
    FormBuilder::new().build(&schema, Rc::new(queue) as Rc<dyn ChangeSink>)
}

#[test]
fn outline_before_load() {
    let lines = outline(&form());
    assert_eq!(lines[0], "# Overlay");
    assert_eq!(lines[1], "advanced = false [bool]");
    assert_eq!(lines[2], "Tuning/ (hidden)");
    assert_eq!(lines[3], "  interval = <unset> [number]");
    assert!(lines[4].starts_with("! Broken: "), "{}", lines[4]);
    assert_eq!(lines[5], "scene = <unset> [select]");
    assert_eq!(lines.len(), 6);
}

#[tokio::test]
async fn outline_and_values_after_load() {
    let form = form();
    let store = MemoryStore::new();
    store.insert("advanced", "true");
    store.insert("scene", "b");
    form.load(&store).await;

    let lines = outline(&form);
    assert_eq!(lines[2], "Tuning/");
    assert_eq!(lines[3], "  interval = 4 [number]");

    assert_eq!(
        value_table(&form),
        vec!["advanced\ttrue\tvisible", "interval\t4\tvisible", "scene\tb\tvisible"]
    );
}

#[test]
fn check_reports_placeholders_and_rules() {
    let report = check(&form());
    assert_eq!(report.options, 3);
    assert_eq!(report.placeholders, 1);
    assert_eq!(report.duplicates, 0);
    assert!(!report.is_clean());
    assert!(report.lines.iter().any(|line| line.starts_with("placeholder ")));
    assert!(report.lines.iter().any(|line| line.ends_with("if `advanced` (depends on advanced)")));
}

#[test]
fn clean_schema_passes_check() {
    let schema = FormSchema::from_value(json!({"options": [
        {"type": "text", "name": "greeting", "showIf": "missing == 1"}
    ]}))
    .expect("schema");
    let (queue, _rx) = PersistQueue::channel();
    let form = FormBuilder::new().build(&schema, Rc::new(queue) as Rc<dyn ChangeSink>);
    let report = check(&form);
    assert!(report.is_clean());
    assert_eq!(report.lines, vec!["rule input-0-greeting if `missing == 1` (depends on nothing)"]);
}

#[test]
fn names_outside_the_identifier_grammar_are_flagged() {
    let schema = FormSchema::from_value(json!({"options": [
        {"type": "number", "name": "alert-interval"},
        {"type": "text", "name": "größe"},
        {"type": "bool", "name": "debug"}
    ]}))
    .expect("schema");
    let (queue, _rx) = PersistQueue::channel();
    let form = FormBuilder::new().build(&schema, Rc::new(queue) as Rc<dyn ChangeSink>);
    let report = check(&form);
    assert_eq!(report.unreferenceable, 2);
    assert!(report.is_clean());
    assert_eq!(
        report.lines,
        vec![
            "unreferenceable alert-interval: not a showIf identifier",
            "unreferenceable größe: not a showIf identifier",
        ]
    );
}
