use thiserror::Error;

use crate::supabase::SupabaseError;

/// Failure of a persistence backend, independent of which backend is wired in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    /// A write was rejected by a uniqueness or exclusion constraint.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<SupabaseError>() {
            Some(SupabaseError::Conflict(msg)) => StoreError::Conflict(msg.clone()),
            Some(SupabaseError::NotFound(msg)) => StoreError::NotFound(msg.clone()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("failed to decode row: {}", err))
    }
}
