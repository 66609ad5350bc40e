//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Error reading a directory entry.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// File vanished between listing and hashing.
    FileUnavailable,
    /// Reading the file bytes for hashing failed.
    HashComputeFailed,
    /// Fingerprint, dimensions or text could not be extracted.
    ContentUnavailable,
}

/// Non-fatal warning encountered during scan.
///
/// The affected file is left out of whichever grouping needed the missing
/// data; the scan itself still completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Classify a hashing I/O failure.
    pub fn hash_failed(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        if error.kind() == std::io::ErrorKind::NotFound {
            Self {
                message: format!("File vanished before hashing: {}", path.display()),
                path,
                kind: WarningKind::FileUnavailable,
            }
        } else {
            Self {
                message: format!("Hash failed: {error}"),
                path,
                kind: WarningKind::HashComputeFailed,
            }
        }
    }

    /// Create a content-extraction warning.
    pub fn content_unavailable(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: format!("Content analysis failed: {error}"),
            kind: WarningKind::ContentUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
    }

    #[test]
    fn test_hash_failed_classification() {
        let gone = ScanWarning::hash_failed(
            "/gone.bin",
            &std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(gone.kind, WarningKind::FileUnavailable);

        let broken = ScanWarning::hash_failed(
            "/broken.bin",
            &std::io::Error::new(std::io::ErrorKind::Other, "bad sector"),
        );
        assert_eq!(broken.kind, WarningKind::HashComputeFailed);
        assert!(broken.message.contains("bad sector"));
    }
}
