//! Option schema documents.
//!
//! A schema is `{ title?, extensionURL?, extensionText?, options: [...] }`.
//! Option entries stay as raw JSON inside [`FormSchema`] and are parsed one
//! by one with [`OptionSchema::parse`] while the form is being built, so a
//! single malformed entry costs that entry only.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::expr::ParseError;
use crate::value::{Value, parse_number};

/// Schema-level failures. Everything except [`SchemaError::Document`] is
/// scoped to one option and downgrades it to an error placeholder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema document: {0}")]
    Document(String),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("unknown option type `{0}`")]
    UnknownType(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("invalid showIf expression: {0}")]
    Expression(#[from] ParseError),
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// The top-level schema document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub title: Option<String>,
    /// Optional link shown in the form header.
    #[serde(default, rename = "extensionURL")]
    pub extension_url: Option<String>,
    /// Link text for `extension_url`.
    #[serde(default, rename = "extensionText")]
    pub extension_text: Option<String>,
    /// Raw option entries, parsed lazily.
    #[serde(default)]
    pub options: Vec<serde_json::Value>,
}

impl FormSchema {
    /// Parse a schema document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Document`] when the text is not JSON or the
    /// document shape is wrong (e.g. `options` is not an array).
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Document(e.to_string()))
    }

    /// Parse a schema document from an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`FormSchema::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        if !value.is_object() {
            return Err(SchemaError::Document("top level must be an object".to_owned()));
        }
        serde_json::from_value(value).map_err(|e| SchemaError::Document(e.to_string()))
    }

    /// Every parseable non-group option, depth first in schema order.
    ///
    /// Entries that fail to parse are skipped.
    #[must_use]
    pub fn leaves(&self) -> Vec<OptionSchema> {
        let mut out = Vec::new();
        collect_leaves(&self.options, &mut out);
        out
    }
}

fn collect_leaves(raw: &[serde_json::Value], out: &mut Vec<OptionSchema>) {
    for entry in raw {
        let Ok(option) = OptionSchema::parse(entry) else {
            continue;
        };
        if option.option_type() == Ok(OptionType::Group) {
            collect_leaves(&option.options, out);
        } else {
            out.push(option);
        }
    }
}

// =============================================================================
// OPTION
// =============================================================================

/// Closed set of option types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Text,
    Password,
    Number,
    Slider,
    Bool,
    File,
    Select,
    Group,
}

impl OptionType {
    /// Map a schema `type` string. `string` and `boolean` are accepted aliases.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] for anything else.
    pub fn parse(name: &str) -> Result<Self, SchemaError> {
        match name {
            "text" | "string" => Ok(Self::Text),
            "password" => Ok(Self::Password),
            "number" => Ok(Self::Number),
            "slider" => Ok(Self::Slider),
            "bool" | "boolean" => Ok(Self::Bool),
            "file" => Ok(Self::File),
            "select" => Ok(Self::Select),
            "group" => Ok(Self::Group),
            other => Err(SchemaError::UnknownType(other.to_owned())),
        }
    }
}

/// One option descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSchema {
    /// Persistence key and expression identifier. Empty only for groups.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub default: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub inc: Option<f64>,
    /// File picker filter, e.g. `image/*`.
    pub accept: Option<String>,
    pub values: Option<Vec<SelectEntry>>,
    pub show_if: Option<String>,
    /// Children of a group, raw.
    #[serde(default)]
    pub options: Vec<serde_json::Value>,
}

impl OptionSchema {
    /// Parse one raw option entry.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidOption`] when the entry is not an object
    /// or a field has the wrong JSON type.
    pub fn parse(raw: &serde_json::Value) -> Result<Self, SchemaError> {
        serde_json::from_value(raw.clone()).map_err(|e| SchemaError::InvalidOption(e.to_string()))
    }

    /// # Errors
    ///
    /// See [`OptionType::parse`].
    pub fn option_type(&self) -> Result<OptionType, SchemaError> {
        OptionType::parse(&self.kind)
    }

    /// Label text shown to the operator.
    #[must_use]
    pub fn display_label(&self) -> &str {
        match &self.label {
            Some(label) if !label.is_empty() => label.as_str(),
            _ => self.name.as_str(),
        }
    }

    /// The declared default as a logical value.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(Value::from_json).filter(|value| !value.is_undefined())
    }
}

/// Best-effort `(name, label)` of a raw entry that failed to parse, for diagnostics.
#[must_use]
pub fn describe_raw(raw: &serde_json::Value) -> (String, String) {
    let field = |key: &str| raw.get(key).and_then(serde_json::Value::as_str).unwrap_or_default().to_owned();
    let name = field("name");
    let label = field("label");
    let label = if label.is_empty() { name.clone() } else { label };
    (name, label)
}

/// A select entry: a bare value or a `[value, label]` pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectEntry {
    Pair(serde_json::Value, serde_json::Value),
    Bare(serde_json::Value),
}

impl SelectEntry {
    /// `(value, label)` as display strings. The value is the persistence key.
    #[must_use]
    pub fn value_and_label(&self) -> (String, String) {
        match self {
            Self::Pair(value, label) => (Value::from_json(value).to_wire(), Value::from_json(label).to_wire()),
            Self::Bare(value) => {
                let value = Value::from_json(value).to_wire();
                (value.clone(), value)
            }
        }
    }
}

/// Accept a JSON number or a numeric string such as `"0.5"`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(number)) => Ok(number.as_f64()),
        Some(serde_json::Value::String(text)) => parse_number(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a number, found {text:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected a number, found {other}"))),
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
