//! Widgets: the stateful, renderable binding of one option to a live value.
//!
//! DESIGN
//! ======
//! Variants form a closed set ([`WidgetKind`]) picked once, by option type,
//! when the widget is constructed. Every variant shares the same capability
//! surface on [`Widget`]: render, read and write the value, and two ordered
//! subscriber lists.
//!
//! - Value subscribers hear every value transition, programmatic or
//!   interactive. Visibility rules hang off these.
//! - Change subscribers hear interactive commits only. Persistence hangs off
//!   these, so loading a stored value never writes it straight back.
//!
//! Widgets are shared as `Rc<Widget>` inside a single-threaded form; all
//! mutable state sits behind `RefCell`/`Cell`. Subscriber lists are cloned
//! before dispatch so a callback can read (or even subscribe to) any widget,
//! including the one that is notifying.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::element::{Element, HIDDEN_CLASS};
use crate::schema::{OptionSchema, OptionType, SchemaError};
use crate::value::{Value, format_number, parse_flag, parse_number};

/// Subscriber callback. Receives the widget's value at notification time.
pub type Callback = Rc<dyn Fn(&Value)>;

// =============================================================================
// INPUT
// =============================================================================

/// Interactive input, as the host translates DOM events.
#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    /// Committed text edit (text, password, number, slider readout).
    Edit(String),
    /// Checkbox toggled.
    Toggle(bool),
    /// Select option chosen, by option value.
    Choose(String),
    /// File picked, by file name. An empty name clears the pick.
    Pick(String),
    /// Slider dragged to a position. Preview only, nothing is committed.
    Slide(f64),
    /// Slider released; commits the current position.
    Release,
}

impl UserInput {
    fn name(&self) -> &'static str {
        match self {
            Self::Edit(_) => "edit",
            Self::Toggle(_) => "toggle",
            Self::Choose(_) => "choose",
            Self::Pick(_) => "pick",
            Self::Slide(_) => "slide",
            Self::Release => "release",
        }
    }
}

/// Rejected interactive input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("`{widget}` does not accept {input} input")]
    UnsupportedInput { widget: String, input: &'static str },
    #[error("`{widget}` has no option `{value}`")]
    UnknownChoice { widget: String, value: String },
    #[error("`{widget}` expects a number, got `{text}`")]
    InvalidNumber { widget: String, text: String },
    #[error("`{widget}` expects true or false, got `{text}`")]
    InvalidFlag { widget: String, text: String },
}

// =============================================================================
// VARIANTS
// =============================================================================

/// One selectable entry of a select widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Persistence key.
    pub value: String,
    /// Display text only.
    pub label: String,
}

/// Variant state.
#[derive(Debug, Clone)]
pub enum WidgetKind {
    Text {
        text: String,
    },
    Password {
        text: String,
    },
    /// Raw input text; the value is its float parse.
    Number {
        text: String,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    /// Range control plus numeric readout, always equal after any interaction.
    Slider {
        position: f64,
        readout: f64,
        min: f64,
        max: f64,
        step: Option<f64>,
    },
    Bool {
        checked: bool,
    },
    /// The picked file cannot be set programmatically.
    File {
        accept: Option<String>,
        picked: Option<String>,
    },
    Select {
        choices: Vec<Choice>,
        selected: Option<usize>,
    },
    /// A schema entry that failed to construct.
    Error {
        message: String,
    },
    /// Container for nested widgets. Holds no value.
    Group {
        children: Vec<Rc<Widget>>,
    },
}

impl WidgetKind {
    /// Build the initial state for a leaf option.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingField`] for a slider without bounds or a
    /// select without values, and [`SchemaError::InvalidField`] for inverted
    /// bounds or a non-positive step.
    pub fn from_schema(option: &OptionSchema, option_type: OptionType) -> Result<Self, SchemaError> {
        match option_type {
            OptionType::Text => Ok(Self::Text { text: String::new() }),
            OptionType::Password => Ok(Self::Password { text: String::new() }),
            OptionType::Number => {
                check_step(option.inc)?;
                Ok(Self::Number { text: String::new(), min: option.min, max: option.max, step: option.inc })
            }
            OptionType::Slider => {
                let min = option.min.ok_or(SchemaError::MissingField("min"))?;
                let max = option.max.ok_or(SchemaError::MissingField("max"))?;
                if min > max {
                    return Err(SchemaError::InvalidField {
                        field: "max",
                        reason: format!("{} is below min {}", format_number(max), format_number(min)),
                    });
                }
                check_step(option.inc)?;
                Ok(Self::Slider { position: min, readout: min, min, max, step: option.inc })
            }
            OptionType::Bool => Ok(Self::Bool { checked: false }),
            OptionType::File => Ok(Self::File { accept: option.accept.clone(), picked: None }),
            OptionType::Select => {
                let entries = option.values.as_ref().ok_or(SchemaError::MissingField("values"))?;
                let choices: Vec<Choice> = entries
                    .iter()
                    .map(|entry| {
                        let (value, label) = entry.value_and_label();
                        Choice { value, label }
                    })
                    .collect();
                let selected = if choices.is_empty() { None } else { Some(0) };
                Ok(Self::Select { choices, selected })
            }
            OptionType::Group => Ok(Self::Group { children: Vec::new() }),
        }
    }

    /// Short variant name, as used in schema `type` strings.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Password { .. } => "password",
            Self::Number { .. } => "number",
            Self::Slider { .. } => "slider",
            Self::Bool { .. } => "bool",
            Self::File { .. } => "file",
            Self::Select { .. } => "select",
            Self::Error { .. } => "error",
            Self::Group { .. } => "group",
        }
    }

    fn value(&self) -> Value {
        match self {
            Self::Text { text } | Self::Password { text } => Value::Text(text.clone()),
            Self::Number { text, .. } => parse_number(text).map_or(Value::Undefined, Value::Number),
            Self::Slider { readout, .. } => Value::Number(*readout),
            Self::Bool { checked } => Value::Bool(*checked),
            Self::File { picked, .. } => picked.clone().map_or(Value::Undefined, Value::Text),
            Self::Select { choices, selected } => selected
                .and_then(|index| choices.get(index))
                .map_or(Value::Undefined, |choice| Value::Text(choice.value.clone())),
            Self::Error { .. } | Self::Group { .. } => Value::Undefined,
        }
    }

    /// Programmatic write. Returns `false` for variants that cannot be set.
    fn apply(&mut self, value: Value) -> bool {
        match self {
            Self::Text { text } | Self::Password { text } => {
                *text = value.to_wire();
                true
            }
            Self::Number { text, .. } => {
                *text = value.as_number().map_or_else(|| value.to_wire(), format_number);
                true
            }
            Self::Slider { position, readout, min, max, step } => {
                if let Some(number) = value.as_number() {
                    let snapped = snap(number, *min, *max, *step);
                    *position = snapped;
                    *readout = snapped;
                }
                true
            }
            Self::Bool { checked } => {
                *checked = value.as_flag().unwrap_or_else(|| value.truthy());
                true
            }
            Self::Select { choices, selected } => {
                let key = value.to_wire();
                *selected = choices.iter().position(|choice| choice.value == key);
                true
            }
            Self::File { .. } | Self::Error { .. } | Self::Group { .. } => false,
        }
    }

    /// Interactive write. Returns whether the input commits a value.
    fn apply_input(&mut self, widget: &str, input: UserInput) -> Result<bool, WidgetError> {
        match (self, input) {
            (Self::Text { text } | Self::Password { text } | Self::Number { text, .. }, UserInput::Edit(edited)) => {
                *text = edited;
                Ok(true)
            }
            (Self::Slider { position, readout, min, max, step }, UserInput::Edit(edited)) => {
                let Some(number) = parse_number(&edited) else {
                    return Err(WidgetError::InvalidNumber { widget: widget.to_owned(), text: edited });
                };
                let snapped = snap(number, *min, *max, *step);
                *position = snapped;
                *readout = snapped;
                Ok(true)
            }
            (Self::Slider { position, readout, min, max, step }, UserInput::Slide(to)) => {
                if to.is_finite() {
                    let snapped = snap(to, *min, *max, *step);
                    *position = snapped;
                    *readout = snapped;
                }
                Ok(false)
            }
            (Self::Slider { .. }, UserInput::Release) => Ok(true),
            (Self::Bool { checked }, UserInput::Toggle(flag)) => {
                *checked = flag;
                Ok(true)
            }
            (Self::File { picked, .. }, UserInput::Pick(file)) => {
                *picked = if file.is_empty() { None } else { Some(file) };
                Ok(true)
            }
            (Self::Select { choices, selected }, UserInput::Choose(key)) => {
                let Some(index) = choices.iter().position(|choice| choice.value == key) else {
                    return Err(WidgetError::UnknownChoice { widget: widget.to_owned(), value: key });
                };
                *selected = Some(index);
                Ok(true)
            }
            (_, input) => Err(WidgetError::UnsupportedInput { widget: widget.to_owned(), input: input.name() }),
        }
    }
}

fn check_step(step: Option<f64>) -> Result<(), SchemaError> {
    if step.is_some_and(|step| step <= 0.0 || !step.is_finite()) {
        return Err(SchemaError::InvalidField { field: "inc", reason: "must be a positive number".to_owned() });
    }
    if step.is_some_and(|step| !step_scale(step).is_finite()) {
        return Err(SchemaError::InvalidField { field: "inc", reason: "too small to round to".to_owned() });
    }
    Ok(())
}

fn step_scale(step: f64) -> f64 {
    10_f64.powi(decimal_places(step))
}

/// Clamp to `[min, max]` and snap to the step grid anchored at `min`.
///
/// The result is rounded to the step's decimal places so `0.1` steps do not
/// accumulate binary noise. Callers guarantee `min <= max`.
#[must_use]
pub fn snap(value: f64, min: f64, max: f64, step: Option<f64>) -> f64 {
    let clamped = value.clamp(min, max);
    let Some(step) = step else {
        return clamped;
    };
    let steps = ((clamped - min) / step).round();
    let scale = step_scale(step);
    let snapped = ((min + steps * step) * scale).round() / scale;
    if !snapped.is_finite() {
        return clamped;
    }
    snapped.clamp(min, max)
}

/// Number of digits after the decimal point in the shortest form of `step`.
#[must_use]
pub fn decimal_places(step: f64) -> i32 {
    let text = format_number(step);
    text.split_once('.').map_or(0, |(_, fraction)| i32::try_from(fraction.len()).unwrap_or(0))
}

// =============================================================================
// WIDGET
// =============================================================================

/// A live widget bound to one option.
pub struct Widget {
    id: String,
    name: String,
    label: String,
    description: Option<String>,
    kind: RefCell<WidgetKind>,
    visible: Cell<bool>,
    change_subscribers: RefCell<Vec<Callback>>,
    value_subscribers: RefCell<Vec<Callback>>,
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Widget");
        out.field("id", &self.id).field("name", &self.name);
        match self.kind.try_borrow() {
            Ok(kind) => out.field("kind", &*kind),
            Err(_) => out.field("kind", &"<borrowed>"),
        };
        out.field("visible", &self.visible.get()).finish_non_exhaustive()
    }
}

impl Widget {
    #[must_use]
    pub fn new(id: String, name: String, label: String, description: Option<String>, kind: WidgetKind) -> Self {
        Self {
            id,
            name,
            label,
            description,
            kind: RefCell::new(kind),
            visible: Cell::new(true),
            change_subscribers: RefCell::new(Vec::new()),
            value_subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Construct a leaf widget for `option`.
    ///
    /// # Errors
    ///
    /// Propagates [`SchemaError`] from the option type and variant checks.
    pub fn from_schema(id: String, option: &OptionSchema) -> Result<Self, SchemaError> {
        let option_type = option.option_type()?;
        if option_type != OptionType::Group && option.name.is_empty() {
            return Err(SchemaError::MissingField("name"));
        }
        let kind = WidgetKind::from_schema(option, option_type)?;
        Ok(Self::new(id, option.name.clone(), option.display_label().to_owned(), option.description.clone(), kind))
    }

    /// A group container owning `children`.
    #[must_use]
    pub fn group(id: String, option: &OptionSchema, children: Vec<Rc<Widget>>) -> Self {
        Self::new(
            id,
            option.name.clone(),
            option.display_label().to_owned(),
            option.description.clone(),
            WidgetKind::Group { children },
        )
    }

    /// The error placeholder standing in for an entry that failed to construct.
    #[must_use]
    pub fn placeholder(id: String, name: String, label: String, message: String) -> Self {
        Self::new(id, name, label, None, WidgetKind::Error { message })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Persistence key; empty for unnamed groups and placeholders.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.kind.borrow().name()
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(*self.kind.borrow(), WidgetKind::Group { .. })
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(*self.kind.borrow(), WidgetKind::Error { .. })
    }

    /// Failure message of a placeholder.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match &*self.kind.borrow() {
            WidgetKind::Error { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// Nested widgets of a group, in schema order.
    #[must_use]
    pub fn children(&self) -> Vec<Rc<Widget>> {
        match &*self.kind.borrow() {
            WidgetKind::Group { children } => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Current value in the widget's declared type.
    #[must_use]
    pub fn value(&self) -> Value {
        self.kind.borrow().value()
    }

    /// Programmatic write: coerces, then emits the value notification.
    ///
    /// Never emits the change notification. Returns `false`, and notifies
    /// nobody, for variants that cannot be set (file, group, placeholder).
    pub fn set_value(&self, value: Value) -> bool {
        let applied = self.kind.borrow_mut().apply(value);
        if applied {
            self.notify_value();
        }
        applied
    }

    /// Interactive path. Committing inputs emit the value notification
    /// followed by the change notification; slider drags emit nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`WidgetError`] when the input does not fit the variant.
    pub fn handle_input(&self, input: UserInput) -> Result<(), WidgetError> {
        let committed = self.kind.borrow_mut().apply_input(&self.name, input)?;
        if committed {
            self.notify_value();
            self.fire_change();
        }
        Ok(())
    }

    /// Commit `text` as if the operator had typed or picked it.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::InvalidFlag`] for a checkbox given a non-flag
    /// word, and whatever [`Widget::handle_input`] rejects.
    pub fn commit_text(&self, text: &str) -> Result<(), WidgetError> {
        let input = match &*self.kind.borrow() {
            WidgetKind::Bool { .. } => match parse_flag(text) {
                Some(flag) => UserInput::Toggle(flag),
                None => return Err(WidgetError::InvalidFlag { widget: self.name.clone(), text: text.to_owned() }),
            },
            WidgetKind::Select { .. } => UserInput::Choose(text.to_owned()),
            WidgetKind::File { .. } => UserInput::Pick(text.to_owned()),
            _ => UserInput::Edit(text.to_owned()),
        };
        self.handle_input(input)
    }

    /// Subscribe to interactive commits.
    pub fn on_change(&self, callback: Callback) {
        self.change_subscribers.borrow_mut().push(callback);
    }

    /// Subscribe to every value transition.
    pub fn on_value(&self, callback: Callback) {
        self.value_subscribers.borrow_mut().push(callback);
    }

    /// Emit the value notification with the current value.
    pub fn notify_value(&self) {
        let subscribers = self.value_subscribers.borrow().clone();
        dispatch(&subscribers, &self.value());
    }

    /// Emit the change notification with the current value.
    pub fn fire_change(&self) {
        let subscribers = self.change_subscribers.borrow().clone();
        dispatch(&subscribers, &self.value());
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    /// Snapshot the widget into an element tree. No side effects.
    #[must_use]
    pub fn render(&self) -> Element {
        let kind = self.kind.borrow();
        let mut container = match &*kind {
            WidgetKind::Group { .. } => Element::new("fieldset").with_id(&self.id).with_class("configGroup"),
            WidgetKind::Error { .. } => {
                Element::new("div").with_id(&self.id).with_class("configOption").with_class("configError")
            }
            _ => Element::new("div").with_class("configOption"),
        };
        if !self.name.is_empty() {
            container = container.with_attr("data-name", self.name.as_str());
        }
        if !self.is_visible() {
            container = container.with_class(HIDDEN_CLASS);
        }

        match &*kind {
            WidgetKind::Group { children } => {
                if !self.label.is_empty() {
                    container.push(Element::new("legend").with_text(self.label.as_str()));
                }
                if let Some(description) = &self.description {
                    container.push(Element::new("div").with_class("description").with_text(description.as_str()));
                }
                for child in children {
                    container.push(child.render());
                }
            }
            WidgetKind::Error { message } => {
                let subject = if self.label.is_empty() { "unnamed option" } else { self.label.as_str() };
                container.push(Element::new("span").with_class("errorMessage").with_text(format!("{subject}: {message}")));
            }
            leaf => {
                container.push(self.render_label());
                for control in render_controls(&self.id, leaf) {
                    container.push(control);
                }
            }
        }
        container
    }

    fn render_label(&self) -> Element {
        let description = Element::new("div")
            .with_class("description")
            .with_text(self.description.clone().unwrap_or_default());
        Element::new("label")
            .with_attr("for", self.id.as_str())
            .with_text(format!("{}: ", self.label))
            .with_child(description)
    }
}

fn dispatch(subscribers: &[Callback], value: &Value) {
    for callback in subscribers {
        callback(value);
    }
}

fn input(id: &str, input_type: &str) -> Element {
    Element::new("input").with_id(id).with_class("optionInput").with_attr("type", input_type)
}

fn with_bounds(mut element: Element, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Element {
    if let Some(min) = min {
        element = element.with_attr("min", format_number(min));
    }
    if let Some(max) = max {
        element = element.with_attr("max", format_number(max));
    }
    if let Some(step) = step {
        element = element.with_attr("step", format_number(step));
    }
    element
}

fn render_controls(id: &str, kind: &WidgetKind) -> Vec<Element> {
    match kind {
        WidgetKind::Text { text } => vec![input(id, "text").with_attr("value", text.as_str())],
        WidgetKind::Password { text } => vec![input(id, "password").with_attr("value", text.as_str())],
        WidgetKind::Number { text, min, max, step } => {
            vec![with_bounds(input(id, "number"), *min, *max, *step).with_attr("value", text.as_str())]
        }
        WidgetKind::Slider { position, readout, min, max, step } => {
            let range = with_bounds(input(id, "range"), Some(*min), Some(*max), *step)
                .with_attr("value", format_number(*position));
            let readout = with_bounds(
                Element::new("input").with_id(&format!("{id}-readout")).with_class("sliderReadout"),
                Some(*min),
                Some(*max),
                *step,
            )
            .with_attr("type", "number")
            .with_attr("value", format_number(*readout));
            vec![range, readout]
        }
        WidgetKind::Bool { checked } => {
            let checkbox = input(id, "checkbox");
            vec![if *checked { checkbox.with_attr("checked", "checked") } else { checkbox }]
        }
        WidgetKind::File { accept, .. } => {
            let picker = input(id, "file");
            vec![match accept {
                Some(accept) => picker.with_attr("accept", accept.as_str()),
                None => picker,
            }]
        }
        WidgetKind::Select { choices, selected } => {
            let mut select = Element::new("select").with_id(id).with_class("optionInput");
            for (index, choice) in choices.iter().enumerate() {
                let mut option = Element::new("option").with_attr("value", choice.value.as_str()).with_text(choice.label.as_str());
                if *selected == Some(index) {
                    option = option.with_attr("selected", "selected");
                }
                select.push(option);
            }
            vec![select]
        }
        WidgetKind::Error { .. } | WidgetKind::Group { .. } => Vec::new(),
    }
}

#[cfg(test)]
#[path = "widget_test.rs"]
mod tests;
