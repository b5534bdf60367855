//! Typed tree model for untrusted runtime values.
//!
//! Inputs arrive as recursively nested trees: scalars at the leaves,
//! ordered arrays and ordered key/value maps as containers. The engine
//! consumes these read-only; ownership transfers to the object store on
//! insertion.

use serde::Serialize;

/// An untrusted runtime value.
///
/// Maps preserve submission order, which fixes leaf iteration order during
/// matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Map(_)) && !matches!(self, Value::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_))
    }

    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a direct child of a map by key. First occurrence wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Render a scalar as the string candidate handed to match operators.
    ///
    /// Strings longer than `max_string_length` are truncated at a char
    /// boundary. Containers and nulls have no scalar form.
    pub fn to_scalar_string(&self, max_string_length: usize) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Signed(i) => Some(i.to_string()),
            Value::Unsigned(u) => Some(u.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => {
                if s.len() > max_string_length {
                    let mut end = max_string_length;
                    while !s.is_char_boundary(end) {
                        end -= 1;
                    }
                    Some(s[..end].to_string())
                } else {
                    Some(s.clone())
                }
            }
            Value::Null | Value::Array(_) | Value::Map(_) => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Signed(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Unsigned(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => {
                Value::Map(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
