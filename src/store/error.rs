//! Storage error taxonomy

use std::path::PathBuf;
use thiserror::Error;

use super::RecordId;

/// Errors raised by an [`ObjectStore`](super::ObjectStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or created
    #[error("storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    /// Enumerating records failed
    #[error("failed to read {store}: {reason}")]
    ReadFailed { store: String, reason: String },

    /// Inserting a record failed
    #[error("failed to write to {store}: {reason}")]
    WriteFailed { store: String, reason: String },

    /// Removing a record failed
    #[error("failed to delete record {id}: {reason}")]
    DeleteFailed { id: RecordId, reason: String },
}
