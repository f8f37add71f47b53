use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalogue entry.
///
/// `id` is owned by the store. Every other field, including `title` and
/// `author`, lives in `fields` so records keep whatever extra keys clients
/// sent on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Book {
    pub fn new(id: u64, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        Self { id, fields }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    pub fn author(&self) -> Option<&str> {
        self.fields.get("author").and_then(Value::as_str)
    }

    /// Overwrite the fields the record already has; returns how many changed.
    ///
    /// Keys the record does not carry are ignored and `id` is never rewritten.
    pub fn apply_update(&mut self, patch: &Map<String, Value>) -> usize {
        let mut changed = 0;
        for (key, value) in patch {
            if let Some(slot) = self.fields.get_mut(key) {
                *slot = value.clone();
                changed += 1;
            }
        }
        changed
    }
}
