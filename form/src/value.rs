//! Logical values.
//!
//! Widgets hold typed values (text, number, flag), the remote store only
//! speaks strings, and `showIf` expressions compare across types. [`Value`]
//! is the single closed type all three agree on, with the coercions each side
//! needs kept here in one place.

use std::fmt;

/// A logical value as seen by widgets, expressions, and sinks.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value: an unset widget or an identifier missing from a context.
    #[default]
    Undefined,
    /// Checkbox state or boolean literal.
    Bool(bool),
    /// Floating point number.
    Number(f64),
    /// Free text, select keys, file names.
    Text(String),
}

impl Value {
    /// Convert a schema JSON value (e.g. an option `default`).
    ///
    /// Arrays and objects have no logical counterpart and become their JSON text.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Undefined,
            serde_json::Value::Bool(flag) => Self::Bool(*flag),
            serde_json::Value::Number(number) => number.as_f64().map_or(Self::Undefined, Self::Number),
            serde_json::Value::String(text) => Self::Text(text.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// The string stored on the remote host for this value.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    /// Numeric view. Booleans count as 1/0; text must parse as a finite number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Undefined => None,
            Self::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Self::Number(number) => Some(*number),
            Self::Text(text) => parse_number(text),
        }
    }

    /// Boolean view. Numbers are true when non-zero; text must be a known flag word.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Undefined => None,
            Self::Bool(flag) => Some(*flag),
            Self::Number(number) => Some(*number != 0.0 && !number.is_nan()),
            Self::Text(text) => parse_flag(text),
        }
    }

    /// Truthiness used by `showIf` evaluation.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined => false,
            Self::Bool(flag) => *flag,
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::Text(text) => !text.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => Ok(()),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => f.write_str(&format_number(*number)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Parse user or wire text as a finite number. Surrounding whitespace is ignored.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => Some(number),
        _ => None,
    }
}

/// Parse a flag word (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`), case-insensitive.
#[must_use]
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Shortest decimal form: `4` rather than `4.0`, and never `-0`.
#[must_use]
pub fn format_number(number: f64) -> String {
    if number == 0.0 {
        return "0".to_owned();
    }
    number.to_string()
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
