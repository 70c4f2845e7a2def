//! Conditional visibility: `showIf` rules re-evaluated on dependency changes.

use std::rc::{Rc, Weak};

use tracing::trace;

use crate::builder::Registry;
use crate::expr::{CompiledExpr, Context};
use crate::value::Value;
use crate::widget::{Callback, Widget};

/// A compiled `showIf` paired with the widget it controls.
#[derive(Debug, Clone)]
pub struct ConditionalRule {
    pub owner: Rc<Widget>,
    pub expr: Rc<CompiledExpr>,
}

impl ConditionalRule {
    #[must_use]
    pub fn source(&self) -> &str {
        self.expr.source()
    }

    /// Identifiers of the expression that name a registered widget.
    /// Unknown identifiers stay absent from the evaluation context.
    #[must_use]
    pub fn dependencies(&self, registry: &Registry) -> Vec<String> {
        self.expr.identifiers().iter().filter(|name| registry.contains_key(name.as_str())).cloned().collect()
    }
}

/// Subscribe every rule to its dependencies and apply it once.
///
/// Evaluation is synchronous on each dependency value notification. A rule
/// never listens to its own owner.
pub fn wire(registry: &Registry, rules: &[ConditionalRule]) {
    for rule in rules {
        let dependencies: Vec<(String, Weak<Widget>)> = rule
            .dependencies(registry)
            .into_iter()
            .filter_map(|name| registry.get(&name).map(|widget| (name, Rc::downgrade(widget))))
            .collect();
        let evaluator = evaluator(rule, dependencies.clone());

        for (_, dependency) in &dependencies {
            let Some(dependency) = dependency.upgrade() else {
                continue;
            };
            if Rc::ptr_eq(&dependency, &rule.owner) {
                continue;
            }
            dependency.on_value(Rc::clone(&evaluator));
        }
        evaluator(&Value::Undefined);
    }
}

fn evaluator(rule: &ConditionalRule, dependencies: Vec<(String, Weak<Widget>)>) -> Callback {
    let owner = Rc::downgrade(&rule.owner);
    let expr = Rc::clone(&rule.expr);
    Rc::new(move |_: &Value| {
        let Some(owner) = owner.upgrade() else {
            return;
        };
        let mut ctx = Context::new();
        for (name, widget) in &dependencies {
            if let Some(widget) = widget.upgrade() {
                ctx.insert(name.clone(), widget.value());
            }
        }
        let visible = expr.evaluate(&ctx);
        trace!(owner = owner.name(), expr = expr.source(), visible, "showIf evaluated");
        owner.set_visible(visible);
    })
}

#[cfg(test)]
#[path = "visibility_test.rs"]
mod tests;
