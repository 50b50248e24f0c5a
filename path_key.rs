// Keys addressing a location in the document tree

use std::fmt;

use serde_json::Value;

use crate::errors::{JsonDbError, Result};

/// A top-level field name or a path of field names into nested objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    Scalar(String),
    Path(Vec<String>),
}

impl PathKey {
    pub fn scalar(name: impl Into<String>) -> Self {
        PathKey::Scalar(name.into())
    }

    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PathKey::Path(segments.into_iter().map(Into::into).collect())
    }

    /// Decode the `key` element of a request.
    ///
    /// A string becomes `Scalar`, an array of strings becomes `Path`.
    /// An empty array decodes successfully; the store rejects it.
    pub fn from_json(key: &Value) -> Result<Self> {
        match key {
            Value::String(name) => Ok(PathKey::Scalar(name.clone())),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(JsonDbError::invalid_key(format!(
                        "segment {} is {}, expected a string",
                        i,
                        json_kind(other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(PathKey::Path),
            other => Err(JsonDbError::invalid_key(format!(
                "key is {}, expected a string or an array of strings",
                json_kind(other)
            ))),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PathKey::Scalar(name) => Value::String(name.clone()),
            PathKey::Path(segments) => {
                Value::Array(segments.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Segments from the root down. A scalar key is a single segment.
    pub fn segments(&self) -> &[String] {
        match self {
            PathKey::Scalar(name) => std::slice::from_ref(name),
            PathKey::Path(segments) => segments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Scalar(name) => write!(f, "{}", name),
            PathKey::Path(segments) => write!(f, "[{}]", segments.join(", ")),
        }
    }
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::scalar(name)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_scalar_and_path() {
        assert_eq!(PathKey::from_json(&json!("name")).unwrap(), PathKey::scalar("name"));
        assert_eq!(
            PathKey::from_json(&json!(["person", "rocket", "launches"])).unwrap(),
            PathKey::path(["person", "rocket", "launches"])
        );
    }

    #[test]
    fn test_decode_rejects_non_string_segments() {
        let err = PathKey::from_json(&json!(["a", 1])).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("segment 1 is a number"));

        assert!(PathKey::from_json(&json!(42)).is_err());
        assert!(PathKey::from_json(&json!({"a": "b"})).is_err());
        assert!(PathKey::from_json(&Value::Null).is_err());
    }

    #[test]
    fn test_empty_path_decodes_but_is_empty() {
        let key = PathKey::from_json(&json!([])).unwrap();
        assert!(key.is_empty());
        assert!(!PathKey::scalar("").is_empty());
    }

    #[test]
    fn test_segments_and_display() {
        let key = PathKey::path(["a", "b"]);
        assert_eq!(key.segments(), &["a".to_string(), "b".to_string()]);
        assert_eq!(key.to_string(), "[a, b]");
        assert_eq!(PathKey::from("x").segments(), &["x".to_string()]);
        assert_eq!(key.to_json(), json!(["a", "b"]));
    }
}
