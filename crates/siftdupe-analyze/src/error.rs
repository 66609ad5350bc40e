//! Error types for duplicate detection.

use thiserror::Error;

/// Errors that abort a detection run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("A detection run is already in progress on this detector")]
    ScanAlreadyInProgress,

    #[error("Detection was cancelled")]
    Cancelled,
}
