//! Flat session data model
//!
//! Submitted step data is normalized into a closed set of value shapes before
//! it reaches the session manager. Persisted data must decode back into the
//! same shapes; anything else is an invariant violation, never coerced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

/// A single answer in a form session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text-like inputs, selects, radios, comboboxes
    Text(String),
    /// Multi-value inputs such as checkbox groups, order preserved
    List(Vec<String>),
    /// Switches
    Bool(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::List(items) => write!(f, "{}", items.join(", ")),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Accumulated answers, keyed by field name
pub type SessionData = BTreeMap<String, FieldValue>;

/// Shallow key-wise override: every key in `incoming` replaces the same key in
/// `existing`; keys absent from `incoming` keep their old value.
pub fn merge_session_data(mut existing: SessionData, incoming: SessionData) -> SessionData {
    existing.extend(incoming);
    existing
}

/// Decode persisted session data, rejecting anything that is not a flat map of
/// supported values.
pub fn session_data_from_json(value: serde_json::Value) -> Result<SessionData> {
    let object = match value {
        serde_json::Value::Object(object) => object,
        other => {
            return Err(Error::InvalidSessionState(format!(
                "session data must be an object, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut data = SessionData::new();
    for (key, raw) in object {
        let kind = json_kind(&raw);
        let value: FieldValue = serde_json::from_value(raw).map_err(|_| {
            Error::InvalidSessionState(format!(
                "field '{}' holds unsupported value of type {}",
                key, kind
            ))
        })?;
        data.insert(key, value);
    }
    Ok(data)
}

/// Decode persisted session data from its stored text form
pub fn session_data_from_str(raw: &str) -> Result<SessionData> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidSessionState(format!("session data is not valid JSON: {}", e)))?;
    session_data_from_json(value)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
