//! Flat entity records
//!
//! Upstream REST payloads are nested JSON. They are flattened into one level
//! of dotted keys (`space.virtual`, `arrays.0.status`) so builders can address
//! any field by a single string and tell "present but null" apart from
//! "never reported".

use std::collections::HashMap;

use serde_json::Value;

use crate::error::CollectorError;

/// Result of one upstream call
pub type CollectResult<T> = Result<T, CollectorError>;

/// Stored value of one record field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Reported by upstream as `null`
    Null,
    /// Numbers and booleans (`true` = 1, `false` = 0)
    Number(f64),
    /// Strings
    Text(String),
}

/// Read view of a record field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    /// No subset ever reported this key
    Absent,
    /// Key present, value null
    Null,
    Number(f64),
    Text(&'a str),
}

impl<'a> Field<'a> {
    /// Numeric value, if the field holds one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text value, if the field holds one
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Field::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

/// One entity as of the scrape instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for canned data
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FieldValue>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Look up a field, distinguishing absent from null
    pub fn get(&self, key: &str) -> Field<'_> {
        match self.fields.get(key) {
            None => Field::Absent,
            Some(FieldValue::Null) => Field::Null,
            Some(FieldValue::Number(n)) => Field::Number(*n),
            Some(FieldValue::Text(s)) => Field::Text(s),
        }
    }

    /// Numeric value or `None` when absent, null or textual
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).as_number()
    }

    /// Label-friendly rendering of a field; absent and null become `""`.
    ///
    /// Numbers are rendered without a fractional part when they have none,
    /// so numeric ids (`uid`, `gid`) read naturally as labels.
    pub fn label(&self, key: &str) -> String {
        match self.get(key) {
            Field::Text(s) => s.to_string(),
            Field::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
            Field::Number(n) => n.to_string(),
            Field::Absent | Field::Null => String::new(),
        }
    }

    /// The entity name, the key most collections are indexed by
    pub fn name(&self) -> Option<&str> {
        self.get("name").as_text()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge another record into this one; overlapping keys take the
    /// incoming value.
    pub fn merge(&mut self, other: Record) {
        self.fields.extend(other.fields);
    }

    /// Flatten a JSON object into a record
    ///
    /// Non-object values are rejected: every listing item upstream is an
    /// object.
    pub fn from_json(value: &Value) -> CollectResult<Self> {
        let Value::Object(map) = value else {
            return Err(CollectorError::JsonParse(format!(
                "expected an object, got {}",
                json_kind(value)
            )));
        };

        let mut record = Record::new();
        for (key, child) in map {
            flatten_into(&mut record.fields, key, child);
        }
        Ok(record)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Number(if v { 1.0 } else { 0.0 })
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

fn flatten_into(fields: &mut HashMap<String, FieldValue>, prefix: &str, value: &Value) {
    match value {
        Value::Null => {
            fields.insert(prefix.to_string(), FieldValue::Null);
        }
        Value::Bool(b) => {
            fields.insert(prefix.to_string(), (*b).into());
        }
        Value::Number(n) => {
            // u64/i64 beyond 2^53 lose precision here, same as any f64 gauge
            let v = n.as_f64().unwrap_or(f64::NAN);
            fields.insert(prefix.to_string(), FieldValue::Number(v));
        }
        Value::String(s) => {
            fields.insert(prefix.to_string(), FieldValue::Text(s.clone()));
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(fields, &format!("{}.{}", prefix, i), item);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(fields, &format!("{}.{}", prefix, key), child);
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a listing body into records
///
/// Accepts the three shapes the REST APIs return: a bare array, an object
/// wrapping its results in `items`, or a single object.
pub fn parse_records(json: &str) -> CollectResult<Vec<Record>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| CollectorError::JsonParse(e.to_string()))?;
    records_from_value(&value)
}

/// Same as [`parse_records`] for an already decoded body
pub fn records_from_value(value: &Value) -> CollectResult<Vec<Record>> {
    match value {
        Value::Array(items) => items.iter().map(Record::from_json).collect(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.iter().map(Record::from_json).collect(),
            _ => Ok(vec![Record::from_json(value)?]),
        },
        other => Err(CollectorError::JsonParse(format!(
            "unexpected listing body: {}",
            json_kind(other)
        ))),
    }
}
