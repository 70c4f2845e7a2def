//! Form construction, initial value loading, and persistence wiring.
//!
//! DESIGN
//! ======
//! [`FormBuilder::build`] walks the schema depth first in schema order,
//! threading a [`BuildContext`] through the recursion instead of keeping any
//! ambient state. Every entry is isolated: a parse, type, or `showIf` failure
//! turns that one entry into an error placeholder and the walk continues.
//!
//! Building is synchronous. Values arrive afterwards through [`Form::load`],
//! which reads every bound key concurrently and applies each result as it
//! completes, so visibility rules see dependencies resolve in any order.
//!
//! Rebuilding produces a fresh [`Form`]. Subscriber closures only hold weak
//! references to widgets, so dropping the old form tears it down as a unit.

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::element::Element;
use crate::expr;
use crate::schema::{FormSchema, OptionSchema, OptionType, SchemaError, describe_raw};
use crate::store::{ChangeSink, RemoteStore, StoreError};
use crate::value::Value;
use crate::visibility::{self, ConditionalRule};
use crate::widget::Widget;

/// Name → widget for every registered (bound) widget of one form.
pub type Registry = HashMap<String, Rc<Widget>>;

// =============================================================================
// BUILD
// =============================================================================

/// Element id allocator, scoped to one build.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    /// `input-<n>-<name>`.
    pub fn allocate(&mut self, name: &str) -> String {
        let id = format!("input-{}-{name}", self.next);
        self.next += 1;
        id
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// A registered widget plus what loading needs to know about it.
#[derive(Debug, Clone)]
struct Binding {
    widget: Rc<Widget>,
    default: Option<Value>,
}

/// State shared by every level of one build walk.
struct BuildContext<'a> {
    ids: &'a mut IdAllocator,
    registry: Registry,
    rules: Vec<ConditionalRule>,
    bindings: Vec<Binding>,
    duplicates: Vec<String>,
}

impl BuildContext<'_> {
    /// Register a leaf. A later widget with the same name replaces the
    /// earlier one, which stays rendered but is no longer loaded or persisted.
    fn register(&mut self, widget: &Rc<Widget>, option: &OptionSchema) {
        let name = widget.name().to_owned();
        if let Some(shadowed) = self.registry.insert(name.clone(), Rc::clone(widget)) {
            warn!(name = %name, shadowed = shadowed.id(), "duplicate option name; last one wins");
            self.bindings.retain(|binding| !Rc::ptr_eq(&binding.widget, &shadowed));
            if !self.duplicates.contains(&name) {
                self.duplicates.push(name);
            }
        }
        self.bindings.push(Binding { widget: Rc::clone(widget), default: option.default_value() });
    }
}

/// Builds [`Form`]s from schema documents.
#[derive(Debug, Default)]
pub struct FormBuilder {
    ids: IdAllocator,
}

impl FormBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every widget, register rules, subscribe `sink` to user edits, and
    /// wire visibility. Never fails; broken entries become placeholders.
    pub fn build(&mut self, schema: &FormSchema, sink: Rc<dyn ChangeSink>) -> Form {
        self.ids.reset();
        let mut ctx = BuildContext {
            ids: &mut self.ids,
            registry: Registry::new(),
            rules: Vec::new(),
            bindings: Vec::new(),
            duplicates: Vec::new(),
        };
        let roots = build_nodes(&schema.options, &mut ctx);
        let BuildContext { registry, rules, bindings, duplicates, .. } = ctx;

        for binding in &bindings {
            let sink = Rc::clone(&sink);
            let key = binding.widget.name().to_owned();
            binding.widget.on_change(Rc::new(move |value: &Value| sink.persist(&key, value)));
        }
        visibility::wire(&registry, &rules);

        info!(widgets = bindings.len(), rules = rules.len(), duplicates = duplicates.len(), "form built");
        Form {
            title: schema.title.clone(),
            extension_url: schema.extension_url.clone(),
            extension_text: schema.extension_text.clone(),
            roots,
            registry,
            rules,
            bindings,
            duplicates,
        }
    }
}

fn build_nodes(raw: &[serde_json::Value], ctx: &mut BuildContext<'_>) -> Vec<Rc<Widget>> {
    raw.iter().map(|entry| build_node(entry, ctx)).collect()
}

fn build_node(raw: &serde_json::Value, ctx: &mut BuildContext<'_>) -> Rc<Widget> {
    let (name, label) = describe_raw(raw);
    let id = ctx.ids.allocate(&name);
    let built = OptionSchema::parse(raw).and_then(|option| construct(id.clone(), &option, ctx));
    match built {
        Ok(widget) => {
            debug!(id = widget.id(), kind = widget.kind_name(), "option built");
            widget
        }
        Err(e) => {
            warn!(id = %id, name = %name, error = %e, "option downgraded to placeholder");
            Rc::new(Widget::placeholder(id, name, label, e.to_string()))
        }
    }
}

fn construct(id: String, option: &OptionSchema, ctx: &mut BuildContext<'_>) -> Result<Rc<Widget>, SchemaError> {
    let show_if = option.show_if.as_deref().map(expr::compile).transpose()?;
    let widget = if option.option_type()? == OptionType::Group {
        let children = build_nodes(&option.options, ctx);
        Rc::new(Widget::group(id, option, children))
    } else {
        let widget = Rc::new(Widget::from_schema(id, option)?);
        ctx.register(&widget, option);
        widget
    };
    if let Some(expr) = show_if {
        ctx.rules.push(ConditionalRule { owner: Rc::clone(&widget), expr: Rc::new(expr) });
    }
    Ok(widget)
}

// =============================================================================
// FORM
// =============================================================================

/// How one widget's initial value was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadOutcome {
    Stored,
    Defaulted,
    Unset,
    Failed,
}

/// Tally of one [`Form::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Applied from the store.
    pub stored: usize,
    /// Missing in the store; default applied and persisted.
    pub defaulted: usize,
    /// Missing in the store with no default.
    pub unset: usize,
    /// Transport failures.
    pub failed: usize,
}

/// One built form.
#[derive(Debug)]
pub struct Form {
    title: Option<String>,
    extension_url: Option<String>,
    extension_text: Option<String>,
    roots: Vec<Rc<Widget>>,
    registry: Registry,
    rules: Vec<ConditionalRule>,
    bindings: Vec<Binding>,
    duplicates: Vec<String>,
}

impl Form {
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// `(url, text)` of the header link; the text falls back to the url.
    #[must_use]
    pub fn extension_link(&self) -> Option<(&str, &str)> {
        let url = self.extension_url.as_deref()?;
        Some((url, self.extension_text.as_deref().unwrap_or(url)))
    }

    /// Top-level widgets in schema order.
    #[must_use]
    pub fn roots(&self) -> &[Rc<Widget>] {
        &self.roots
    }

    #[must_use]
    pub fn widget(&self, name: &str) -> Option<Rc<Widget>> {
        self.registry.get(name).cloned()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    /// Names declared more than once, in first-duplicate order.
    #[must_use]
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Bound names in schema order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|binding| binding.widget.name()).collect()
    }

    /// Every error placeholder in the tree, depth first.
    #[must_use]
    pub fn placeholders(&self) -> Vec<Rc<Widget>> {
        let mut out = Vec::new();
        collect_placeholders(&self.roots, &mut out);
        out
    }

    /// Current value of every bound widget, in schema order.
    #[must_use]
    pub fn values(&self) -> Vec<(String, Value)> {
        self.bindings.iter().map(|binding| (binding.widget.name().to_owned(), binding.widget.value())).collect()
    }

    /// Read every bound key concurrently and apply each result as it lands.
    ///
    /// Found values are applied programmatically and never persisted back.
    /// Missing keys with a default apply it and fire a change, which persists
    /// the default through the form's sink. Everything else still emits a
    /// value notification so visibility rules see the unset state.
    pub async fn load<S>(&self, store: &S) -> LoadReport
    where
        S: RemoteStore + ?Sized,
    {
        let loads = self.bindings.iter().map(|binding| async move {
            let result = store.get_value(binding.widget.name()).await;
            apply_loaded(binding, result)
        });
        let mut report = LoadReport::default();
        for outcome in join_all(loads).await {
            match outcome {
                LoadOutcome::Stored => report.stored += 1,
                LoadOutcome::Defaulted => report.defaulted += 1,
                LoadOutcome::Unset => report.unset += 1,
                LoadOutcome::Failed => report.failed += 1,
            }
        }
        info!(
            stored = report.stored,
            defaulted = report.defaulted,
            unset = report.unset,
            failed = report.failed,
            "form loaded"
        );
        report
    }

    /// Render the whole form: header, then one container per top-level option.
    #[must_use]
    pub fn render(&self) -> Element {
        let mut form = Element::new("div").with_class("configForm");
        if let Some(title) = &self.title {
            form.push(Element::new("h1").with_id("title").with_text(title.as_str()));
        }
        if let Some((url, text)) = self.extension_link() {
            form.push(Element::new("a").with_class("extensionLink").with_attr("href", url).with_text(text));
        }
        let mut area = Element::new("div").with_id("configArea");
        for root in &self.roots {
            area.push(root.render());
        }
        form.push(area);
        form
    }
}

fn apply_loaded(binding: &Binding, result: Result<Option<String>, StoreError>) -> LoadOutcome {
    let widget = &binding.widget;
    match result {
        Ok(Some(raw)) => {
            debug!(name = widget.name(), value = %raw, "stored value loaded");
            if !widget.set_value(Value::Text(raw)) {
                widget.notify_value();
            }
            LoadOutcome::Stored
        }
        Ok(None) => {
            let applied = binding.default.clone().is_some_and(|default| widget.set_value(default));
            if applied {
                debug!(name = widget.name(), "default applied");
                widget.fire_change();
                LoadOutcome::Defaulted
            } else {
                widget.notify_value();
                LoadOutcome::Unset
            }
        }
        Err(e) => {
            warn!(name = widget.name(), error = %e, "value load failed");
            widget.notify_value();
            LoadOutcome::Failed
        }
    }
}

fn collect_placeholders(widgets: &[Rc<Widget>], out: &mut Vec<Rc<Widget>>) {
    for widget in widgets {
        if widget.is_placeholder() {
            out.push(Rc::clone(widget));
        }
        collect_placeholders(&widget.children(), out);
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
