//! Field values and records.

use std::fmt;

/// A single field's value after optional dynamic typing.
///
/// Boolean and numeric coercion only applies when `dynamicTyping` is in
/// effect for the column; otherwise every field is `Str`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Number(f64),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty_str(&self) -> bool {
        matches!(self, FieldValue::Str(s) if s.is_empty())
    }

    /// Attempt dynamic typing coercion on a raw string:
    /// `"true"`/`"TRUE"` (case-insensitive exact match) -> bool; a finite
    /// float literal that isn't a bare sign/dot -> number; else the string.
    pub fn coerce(raw: String) -> FieldValue {
        if raw.eq_ignore_ascii_case("true") {
            return FieldValue::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return FieldValue::Bool(false);
        }
        if is_bare_sign_or_dot(&raw) {
            return FieldValue::Str(raw);
        }
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            if let Ok(n) = raw.parse::<f64>() {
                if n.is_finite() {
                    return FieldValue::Number(n);
                }
            }
        }
        FieldValue::Str(raw)
    }
}

fn is_bare_sign_or_dot(s: &str) -> bool {
    matches!(s, "+" | "-" | ".")
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

/// An ordered sequence of field values: a row before (or without) header
/// interpretation.
pub type Record = Vec<FieldValue>;

/// Key used to reconcile the `__parsed_extra` synthetic column when a row
/// has more fields than the header.
pub const PARSED_EXTRA_KEY: &str = "__parsed_extra";

/// A header-aware view of a row: ordered `(header, value)` pairs, plus any
/// overflow fields beyond the header length.
///
/// Duplicate header names: first occurrence wins the mapping slot; later
/// occurrences of the same name still occupy a position in `meta.fields`
/// (see DESIGN.md, Open Question resolution) but do not overwrite the
/// first value here.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RecordMap {
    pub fields: Vec<(String, FieldValue)>,
    pub extra: Vec<FieldValue>,
}

impl RecordMap {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}
