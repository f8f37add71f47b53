use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::ApiError;

/// Required keys of a new book. Only presence is checked: any non-null
/// value passes, whatever its type.
#[derive(Debug, Deserialize, Validate)]
pub struct BookDraft {
    #[validate(required)]
    pub title: Option<Value>,
    #[validate(required)]
    pub author: Option<Value>,
}

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// True iff `payload` is an object with non-null `title` and `author`
    pub fn is_valid(payload: &Value) -> bool {
        if !payload.is_object() {
            return false;
        }

        serde_json::from_value::<BookDraft>(payload.clone())
            .map(|draft| draft.validate().is_ok())
            .unwrap_or(false)
    }

    /// Validates a create request body and hands back its fields
    pub fn validate_new_book(payload: Value) -> Result<Map<String, Value>, ApiError> {
        if !Self::is_valid(&payload) {
            return Err(ApiError::InvalidBookData);
        }

        match payload {
            Value::Object(fields) => Ok(fields),
            _ => Err(ApiError::InvalidBookData),
        }
    }

    /// Validates an update request body; any JSON object is accepted
    pub fn validate_book_update(payload: Value) -> Result<Map<String, Value>, ApiError> {
        match payload {
            Value::Object(fields) => Ok(fields),
            _ => Err(ApiError::InvalidBookData),
        }
    }
}
