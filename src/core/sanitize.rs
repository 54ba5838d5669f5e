//! Conversion of upstream cells into JSON-safe primitives.
//!
//! Every record that leaves the crate goes through [`sanitize`], whatever its
//! source, so the wire schema holds only null, integers, finite doubles,
//! strings and booleans.

use super::table::{RawValue, Table};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A JSON-safe scalar. `Float` never holds NaN or an infinity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SafeValue {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl SafeValue {
    /// Finite doubles pass, NaN and infinities become null.
    pub fn float(value: f64) -> Self {
        if value.is_finite() {
            SafeValue::Float(value)
        } else {
            SafeValue::Null
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SafeValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SafeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Text rendering used by table output. Null renders empty.
    pub fn to_display(&self) -> String {
        match self {
            SafeValue::Null => String::new(),
            SafeValue::Int(i) => i.to_string(),
            SafeValue::Float(f) => f.to_string(),
            SafeValue::Str(s) => s.clone(),
            SafeValue::Bool(b) => b.to_string(),
        }
    }
}

/// An ordered field → value mapping with every upstream key present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedRecord {
    fields: Vec<(String, SafeValue)>,
}

impl SanitizedRecord {
    pub fn get(&self, field: &str) -> Option<&SafeValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for SanitizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Converts one cell. Total: never panics and never yields a non-primitive.
pub fn sanitize_value(value: &RawValue) -> SafeValue {
    match value {
        RawValue::Null => SafeValue::Null,
        RawValue::Int(i) => SafeValue::Int(*i),
        RawValue::UInt(u) => i64::try_from(*u)
            .map(SafeValue::Int)
            .unwrap_or_else(|_| SafeValue::float(*u as f64)),
        RawValue::Float(f) => SafeValue::float(*f),
        RawValue::Bool(b) => SafeValue::Bool(*b),
        RawValue::Str(s) => SafeValue::Str(s.clone()),
        RawValue::Date(d) => SafeValue::Str(d.format("%Y-%m-%d").to_string()),
        RawValue::DateTime(dt) => SafeValue::Str(dt.format("%Y-%m-%d").to_string()),
        // Composite values are flattened to their JSON text
        RawValue::Json(v) => serde_json::to_string(v).map_or(SafeValue::Null, SafeValue::Str),
    }
}

pub fn sanitize<'a>(record: impl IntoIterator<Item = (&'a str, &'a RawValue)>) -> SanitizedRecord {
    SanitizedRecord {
        fields: record
            .into_iter()
            .map(|(name, value)| (name.to_string(), sanitize_value(value)))
            .collect(),
    }
}

pub fn sanitize_table(table: &Table) -> Vec<SanitizedRecord> {
    table.records().map(|record| sanitize(record)).collect()
}
