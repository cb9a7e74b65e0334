//! Document rows returned by a document store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::pagination::CursorValue;

/// A document with its identity and field data.
///
/// Field lookups accept dotted paths (`"author.name"`) into nested objects.
///
/// # Examples
///
/// ```
/// use pageline_engine::types::Document;
/// use serde_json::json;
///
/// let doc = Document::from_json("course-1", json!({
///     "title": "Intro to Math",
///     "author": {"name": "Ada"}
/// }));
///
/// assert_eq!(doc.id(), "course-1");
/// assert_eq!(doc.text("author.name"), Some("Ada"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    #[serde(default)]
    data: Map<String, Value>,
}

impl Document {
    /// Creates a document from an id and a field map.
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Creates a document from an id and a JSON value.
    ///
    /// Non-object values are stored under a `value` field.
    pub fn from_json(id: impl Into<String>, value: Value) -> Self {
        let data = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self::new(id, data)
    }

    /// Returns the document identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the field data.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Looks up a field by dotted path.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.data.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Returns a string field.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }

    /// Returns the comparable value of a field; missing fields are null.
    pub fn sort_value(&self, path: &str) -> CursorValue {
        self.field(path)
            .map(CursorValue::from_json)
            .unwrap_or(CursorValue::Null)
    }

    /// Sets a top-level field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(field.into(), value.into());
    }
}
