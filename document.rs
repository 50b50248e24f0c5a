// Tree operations on the in-memory document
//
// The document root is always a JSON object. Traversal only descends
// into objects; arrays and scalars are opaque leaves.

use serde_json::{Map, Value};

use crate::errors::{JsonContext, JsonDbError, Result};
use crate::path_key::json_kind;

/// The whole store: one JSON object
pub type Document = Map<String, Value>;

/// Decode the text of the database file.
///
/// Empty or whitespace-only text is the empty document.
pub fn parse(text: &str) -> Result<Document> {
    if text.trim().is_empty() {
        return Ok(Document::new());
    }
    match serde_json::from_str::<Value>(text).json_context("parsing database file")? {
        Value::Object(map) => Ok(map),
        other => Err(JsonDbError::CorruptDocument {
            reason: format!("root is {}, expected an object", json_kind(&other)),
        }),
    }
}

pub fn render(doc: &Document) -> Result<String> {
    serde_json::to_string(doc).json_context("encoding database file")
}

/// Find the value addressed by `segments`.
///
/// Descends through objects. If a non-final segment holds something
/// other than an object the walk bottoms out there and that value is
/// returned. A missing field anywhere yields `None`.
pub fn lookup<'a>(doc: &'a Document, segments: &[String]) -> Option<&'a Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = doc;
    for segment in parents {
        match current.get(segment)? {
            Value::Object(child) => current = child,
            leaf => return Some(leaf),
        }
    }
    current.get(last)
}

/// Build the minimal object chain holding `value` at `segments`.
///
/// `["a", "b", "c"]` with `5` gives `{"a": {"b": {"c": 5}}}`. The result
/// always has exactly one top-level field. Empty `segments` gives an
/// empty document.
pub fn skeleton(segments: &[String], value: Value) -> Document {
    let Some((first, rest)) = segments.split_first() else {
        return Document::new();
    };
    let nested = rest.iter().rev().fold(value, |inner, segment| {
        let mut wrapper = Map::new();
        wrapper.insert(segment.clone(), inner);
        Value::Object(wrapper)
    });
    let mut root = Document::new();
    root.insert(first.clone(), nested);
    root
}

/// Recursively merge `incoming` into `base`.
///
/// Fields that are objects on both sides merge; anything else in
/// `incoming` replaces the field in `base` wholesale. Fields only in
/// `base` are kept.
pub fn merge(base: &mut Document, incoming: Document) {
    for (field, value) in incoming {
        let Value::Object(update) = value else {
            base.insert(field, value);
            continue;
        };
        if let Some(Value::Object(existing)) = base.get_mut(&field) {
            merge(existing, update);
            continue;
        }
        base.insert(field, Value::Object(update));
    }
}

/// Remove the scalar addressed by `segments` from its parent object.
///
/// Returns the removed value, or `None` when a field on the way is
/// missing, a non-final segment is not an object, or the final value is
/// an object or an array. Parents left empty are kept.
pub fn remove_scalar(doc: &mut Document, segments: &[String]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = doc;
    for segment in parents {
        match current.get_mut(segment)? {
            Value::Object(child) => current = child,
            _ => return None,
        }
    }
    match current.get(last)? {
        Value::Object(_) | Value::Array(_) => None,
        _ => current.shift_remove(last),
    }
}
