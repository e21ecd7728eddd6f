//! The backend wraps every response in `{success, data, error}`.
//!
//! `error`, when present, maps field names to human-readable messages.
//! Decoding flattens the wrapper: a `success: false` envelope or a
//! missing `data` becomes an [`ApiError`] before any payload type is
//! looked at.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Generic response wrapper.  A body without `success` fails closed.
///
/// `data` and `error` carry no `serde(default)`: missing `Option` keys
/// already decode to `None`, and a field-level default on `data` would
/// make the derive demand `T: Default` from every payload type.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<BTreeMap<String, String>>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload or turn the envelope into the matching error.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                detail: flatten_error_map(self.error),
            });
        }
        self.data
            .ok_or_else(|| ApiError::Envelope("success envelope without data".to_string()))
    }
}

/// Join the error map's messages the way the backend's own clients do.
fn flatten_error_map(map: Option<BTreeMap<String, String>>) -> String {
    match map {
        Some(map) if !map.is_empty() => {
            map.values().cloned().collect::<Vec<_>>().join(", ")
        }
        _ => "request failed".to_string(),
    }
}

/// Raw `/reels` page payload.  Records stay untyped `Value`s so the
/// mapper can normalize them field by field.
#[derive(Debug, Deserialize)]
pub struct RawFeedPage {
    #[serde(default)]
    pub reels: Vec<Value>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Created-comment payload; only the fields this layer relays.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentReceipt {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
}
