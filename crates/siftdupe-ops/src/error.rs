//! Error types for safe resolution.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Errors reading or writing the restorable-record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on record store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record store {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("No data directory available for the record store")]
    NoDataDir,

    #[error("Record store rejected the write: {0}")]
    Rejected(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from deleting or restoring files.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No pending record with id {id}")]
    NotFound { id: Uuid },

    #[error("Kept file {path} no longer exists; cannot restore from it")]
    OriginalMissing { path: PathBuf },

    #[error("Something already exists at {path}")]
    TargetOccupied { path: PathBuf },

    #[error("Kept file {path} does not exist; refusing to delete its duplicates")]
    KeptFileMissing { path: PathBuf },

    #[error("{path} is the kept file")]
    KeptFileInBatch { path: PathBuf },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
