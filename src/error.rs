//! Store error type
//!
//! Only writes can fail. Reads and enumeration degrade silently instead.

use thiserror::Error;

/// Errors surfaced by [`EntryStore`](crate::EntryStore) writes
#[derive(Debug, Error)]
pub enum StoreError {
    /// The value could not be encoded as JSON
    #[error("failed to serialize entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend rejected the write (quota exceeded, storage disabled, ...)
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for StoreError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        StoreError::Backend(format!("{:?}", value))
    }
}
