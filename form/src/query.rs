//! Generator mode: committed values become query-string parameters.
//!
//! Instead of persisting to a store, a [`QuerySink`] keeps one encoded
//! parameter per option, in schema order, so a settings page can produce the
//! URL of a configured overlay. Parameters equal to their option's encoded
//! default are left out.

use std::cell::RefCell;
use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use crate::schema::{FormSchema, OptionSchema, OptionType};
use crate::store::ChangeSink;
use crate::value::{Value, format_number};
use crate::widget::decimal_places;

/// How one option's value is written into the query string.
#[derive(Debug, Clone)]
struct Param {
    name: String,
    /// Fixed decimals for numeric options that declare `inc`.
    decimals: Option<usize>,
    default: Option<String>,
}

/// Query-string sink for generator mode.
#[derive(Debug, Default)]
pub struct QuerySink {
    params: Vec<Param>,
    values: RefCell<HashMap<String, String>>,
}

impl QuerySink {
    /// Prepare one parameter slot per leaf option of `schema`.
    ///
    /// A repeated name keeps only its last declaration, in that position,
    /// matching the form's registry.
    #[must_use]
    pub fn from_schema(schema: &FormSchema) -> Self {
        let mut params: Vec<Param> = Vec::new();
        for slot in schema.leaves().iter().filter_map(param) {
            params.retain(|earlier| earlier.name != slot.name);
            params.push(slot);
        }
        Self { params, values: RefCell::new(HashMap::new()) }
    }

    /// `(name, encoded value)` pairs in schema order, defaults omitted.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let values = self.values.borrow();
        self.params
            .iter()
            .filter_map(|param| values.get(&param.name).map(|value| (param.name.clone(), value.clone())))
            .collect()
    }

    /// `name=value&...`; names are URI encoded, values already are.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.params()
            .iter()
            .map(|(name, value)| format!("{}={value}", urlencoding::encode(name)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the query string to `base`, respecting an existing `?`.
    #[must_use]
    pub fn url(&self, base: &str) -> String {
        let query = self.query_string();
        if query.is_empty() {
            return base.to_owned();
        }
        let separator = match base.chars().last() {
            Some('?' | '&') => "",
            _ if base.contains('?') => "&",
            _ => "?",
        };
        format!("{base}{separator}{query}")
    }
}

impl ChangeSink for QuerySink {
    fn persist(&self, key: &str, value: &Value) {
        let Some(param) = self.params.iter().find(|param| param.name == key) else {
            warn!(key, "no query parameter for option");
            return;
        };
        let mut values = self.values.borrow_mut();
        match encode(key, value, param.decimals) {
            Some(encoded) if param.default.as_ref() != Some(&encoded) => {
                values.insert(key.to_owned(), encoded);
            }
            _ => {
                values.remove(key);
            }
        }
    }
}

fn param(option: &OptionSchema) -> Option<Param> {
    let Ok(option_type) = option.option_type() else {
        return None;
    };
    let numeric = matches!(option_type, OptionType::Number | OptionType::Slider);
    let decimals =
        option.inc.filter(|_| numeric).map(|inc| usize::try_from(decimal_places(inc)).unwrap_or_default());
    let default = option
        .default_value()
        .map(|value| typed_default(option_type, value))
        .and_then(|value| encode(&option.name, &value, decimals));
    Some(Param { name: option.name.clone(), decimals, default })
}

/// Coerce a declared default to the type the widget would report.
fn typed_default(option_type: OptionType, value: Value) -> Value {
    match option_type {
        OptionType::Number | OptionType::Slider => value.as_number().map_or(value, Value::Number),
        OptionType::Bool => value.as_flag().map_or(value, Value::Bool),
        _ => value,
    }
}

/// Encode one value. `None` means the parameter is absent.
fn encode(key: &str, value: &Value, decimals: Option<usize>) -> Option<String> {
    match value {
        Value::Undefined => None,
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(match decimals {
            Some(decimals) => format!("{number:.decimals$}"),
            None => format_number(*number),
        }),
        Value::Text(text) if key.to_ascii_lowercase().contains("password") => {
            Some(urlencoding::encode(&STANDARD.encode(text)).into_owned())
        }
        Value::Text(text) => Some(urlencoding::encode(text).into_owned()),
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
