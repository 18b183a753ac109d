//! The stored entry value.
//!
//! An entry's start instant lives in its key, not in the value. The value
//! carries the optional end instant, type label, note, and archive flag, plus
//! an open extension map so ad hoc properties survive round-trips without
//! weakening the known fields.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys;

/// The supplied replacement value is not a well-formed entry record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("entry value must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
    #[error("entry value is not a well-formed record: {message}")]
    InvalidField { message: String },
}

/// One recorded time interval, as stored under a primary key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Type label, used for secondary indexing and filtering.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Free-text note. May contain embedded line breaks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// End instant. Absent while the entry is running.
    #[serde(
        default,
        with = "stamp_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDateTime>,

    /// Archived entries are excluded from scans by default.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub archive: bool,

    /// Open extension: arbitrary user-set properties.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Entry {
    /// Whether the entry is still running.
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// The end used for elapsed-time math: the stored end, or `now` while the
    /// entry is open. An open entry's total therefore grows on each run.
    pub fn effective_end(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.end.unwrap_or(now)
    }

    /// Appends `extra` to the message, newline-joined with any existing text.
    pub fn append_message(&mut self, extra: &str) {
        self.message = Some(match self.message.take() {
            Some(existing) => format!("{existing}\n{extra}"),
            None => extra.to_string(),
        });
    }

    /// Sets a property by name. An empty value deletes the property.
    ///
    /// Only plain properties are handled here; `start`, `end`, and `type`
    /// need key or index migration and are special-cased by the entry store.
    pub fn set_property(&mut self, name: &str, value: &str) {
        match name {
            "message" => {
                self.message = (!value.is_empty()).then(|| value.to_string());
            }
            "archive" => {
                self.archive = matches!(value, "true" | "1");
            }
            _ => {
                if value.is_empty() {
                    self.extra.remove(name);
                } else {
                    self.extra
                        .insert(name.to_string(), serde_json::Value::String(value.to_string()));
                }
            }
        }
    }

    /// Looks up a property by name for display.
    pub fn property(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "type" => self.kind.clone().map(serde_json::Value::String),
            "message" => self.message.clone().map(serde_json::Value::String),
            "end" => self
                .end
                .map(|end| serde_json::Value::String(keys::encode_stamp(end))),
            "archive" => Some(serde_json::Value::Bool(self.archive)),
            _ => self.extra.get(name).cloned(),
        }
    }
}

/// Serde adapter storing the end instant in the sortable stamp format, the
/// same rendering the keys use.
mod stamp_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::keys;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(end) => serializer.serialize_str(&keys::encode_stamp(*end)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|stamp| keys::decode_stamp(&stamp).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Validates and converts an externally supplied JSON value into an entry.
pub fn entry_from_value(value: serde_json::Value) -> Result<Entry, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::NotAnObject {
            kind: json_kind(&value),
        });
    }
    serde_json::from_value(value).map_err(|err| ValidationError::InvalidField {
        message: err.to_string(),
    })
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
