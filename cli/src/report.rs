//! Plain-text views of a built form.

use std::rc::Rc;

use configform::expr::is_identifier;
use configform::{Form, Value, Widget};

/// Indented tree of the form: groups end in `/`, placeholders start with `!`.
pub fn outline(form: &Form) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(title) = form.title() {
        lines.push(format!("# {title}"));
    }
    outline_into(form.roots(), 0, &mut lines);
    lines
}

fn outline_into(widgets: &[Rc<Widget>], depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for widget in widgets {
        let hidden = if widget.is_visible() { "" } else { " (hidden)" };
        if widget.is_group() {
            lines.push(format!("{indent}{}/{hidden}", widget.label()));
            outline_into(&widget.children(), depth + 1, lines);
        } else if let Some(message) = widget.error_message() {
            lines.push(format!("{indent}! {}: {message}", widget.label()));
        } else {
            lines.push(format!(
                "{indent}{} = {} [{}]{hidden}",
                widget.name(),
                display_value(&widget.value()),
                widget.kind_name()
            ));
        }
    }
}

/// `name<TAB>value<TAB>visible|hidden` per bound widget.
pub fn value_table(form: &Form) -> Vec<String> {
    form.values()
        .into_iter()
        .map(|(name, value)| {
            let visible = form.widget(&name).is_some_and(|widget| widget.is_visible());
            format!("{name}\t{}\t{}", display_value(&value), if visible { "visible" } else { "hidden" })
        })
        .collect()
}

/// Findings of an offline build.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub lines: Vec<String>,
    pub options: usize,
    pub placeholders: usize,
    pub duplicates: usize,
    /// Bound names no `showIf` can refer to. Reported, not fatal.
    pub unreferenceable: usize,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.placeholders == 0 && self.duplicates == 0
    }
}

pub fn check(form: &Form) -> CheckReport {
    let mut lines = Vec::new();
    let placeholders = form.placeholders();
    for widget in &placeholders {
        lines.push(format!("placeholder {}: {}", widget.id(), widget.error_message().unwrap_or_default()));
    }
    for name in form.duplicates() {
        lines.push(format!("duplicate {name}"));
    }
    let unreferenceable: Vec<&str> = form.names().into_iter().filter(|name| !is_identifier(name)).collect();
    for name in &unreferenceable {
        lines.push(format!("unreferenceable {name}: not a showIf identifier"));
    }
    for rule in form.rules() {
        let dependencies = rule.dependencies(form.registry());
        let on = if dependencies.is_empty() { "nothing".to_owned() } else { dependencies.join(", ") };
        lines.push(format!("rule {} if `{}` (depends on {on})", rule.owner.id(), rule.source()));
    }
    CheckReport {
        lines,
        options: form.names().len(),
        placeholders: placeholders.len(),
        duplicates: form.duplicates().len(),
        unreferenceable: unreferenceable.len(),
    }
}

fn display_value(value: &Value) -> String {
    if value.is_undefined() { "<unset>".to_owned() } else { value.to_wire() }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
