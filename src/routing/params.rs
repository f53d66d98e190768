//! Typed URL parameter values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single placeholder value, either captured from a path or supplied
/// to reverse URL construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Str(String),
}

impl ParamValue {
    /// Borrow the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            ParamValue::Int(_) => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Str(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

/// Ordered placeholder values extracted from a matched path.
///
/// Order follows the placeholders left to right in the route pattern.
/// Repeated names are kept; lookups by name return the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub(crate) fn new(entries: Vec<(String, ParamValue)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by placeholder name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Look up a string placeholder by name.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Look up an integer placeholder by name.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    /// Value at a position, counting placeholders from the left.
    pub fn positional(&self, index: usize) -> Option<&ParamValue> {
        self.entries.get(index).map(|(_, v)| v)
    }

    /// Positional values in pattern order.
    pub fn values(&self) -> impl Iterator<Item = &ParamValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Name → value object for template data. Later duplicates do not
    /// overwrite earlier ones.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.entries {
            if !map.contains_key(name) {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                map.insert(name.clone(), json);
            }
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_position() {
        let params = Params::new(vec![
            ("name".into(), ParamValue::from("frank")),
            ("id".into(), ParamValue::from(42)),
        ]);
        assert_eq!(params.str("name"), Some("frank"));
        assert_eq!(params.int("id"), Some(42));
        assert_eq!(params.int("name"), None);
        assert_eq!(params.positional(1), Some(&ParamValue::Int(42)));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_repeated_names_keep_first_for_lookup() {
        let params = Params::new(vec![
            ("x".into(), ParamValue::from("a")),
            ("x".into(), ParamValue::from("b")),
        ]);
        assert_eq!(params.str("x"), Some("a"));
        assert_eq!(params.values().count(), 2);
        assert_eq!(params.to_json(), serde_json::json!({ "x": "a" }));
    }
}
