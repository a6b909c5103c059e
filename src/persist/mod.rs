//! Local key-value storage seam and the persisted-history codec.

pub mod memory;
pub mod sqlite;

use thiserror::Error;

use crate::{core::store::StoredHistory, record::DiagnosticRecord};

/// Storage-layer failures.
#[derive(Debug, Error)]
pub enum PersistError {
    /// SQLite reported an error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A payload could not be encoded or decoded.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    /// Any other storage failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias for storage operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Opaque-key byte storage, last write wins.
pub trait KvStore: Send {
    /// Value stored under `key`, or `None`.
    fn get(&self, key: &str) -> PersistResult<Option<Vec<u8>>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &[u8]) -> PersistResult<()>;
    /// Returns true when a value was removed.
    fn remove(&mut self, key: &str) -> PersistResult<bool>;
    /// Makes earlier writes durable. No-op by default.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}

/// Serializes history in the canonical `{ "history": [...] }` shape.
pub fn encode_history(history: &StoredHistory) -> PersistResult<Vec<u8>> {
    Ok(serde_json::to_vec(history)?)
}

/// Decodes a persisted history payload.
pub fn decode_history(payload: &[u8]) -> PersistResult<StoredHistory> {
    match serde_json::from_slice::<StoredHistory>(payload) {
        Ok(history) => Ok(history),
        Err(err) => {
            // Older builds stored a bare array of records under the key.
            serde_json::from_slice::<Vec<DiagnosticRecord>>(payload)
                .map(|history| StoredHistory { history })
                .map_err(|_| PersistError::Serde(err))
        }
    }
}
