//! Outcome reporting for deletion and restoration batches.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::record::RestorableRecord;

/// The kind of batch that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionKind {
    Delete,
    Restore,
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "Delete"),
            Self::Restore => write!(f, "Restore"),
        }
    }
}

/// A file the batch could not process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionFailure {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl ResolutionFailure {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Result of a completed batch.
#[derive(Debug, Clone)]
pub struct ResolutionComplete {
    /// The type of batch.
    pub kind: ResolutionKind,
    /// Records created (delete) or consumed (restore).
    pub records: Vec<RestorableRecord>,
    /// Number of items that failed.
    pub failed: usize,
    /// Bytes removed or written back.
    pub bytes_processed: u64,
    /// Errors that occurred.
    pub errors: Vec<ResolutionFailure>,
    /// The batch stopped early on cancellation.
    pub cancelled: bool,
}

impl ResolutionComplete {
    pub(crate) fn new(kind: ResolutionKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
            failed: 0,
            bytes_processed: 0,
            errors: Vec::new(),
            cancelled: false,
        }
    }

    pub(crate) fn fail(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ResolutionFailure::new(path, message));
    }

    /// Number of items successfully processed.
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }

    /// Check if the batch was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self) -> String {
        let action = match self.kind {
            ResolutionKind::Delete => "Deleted",
            ResolutionKind::Restore => "Restored",
        };

        let mut summary = if self.failed == 0 {
            format!("{} {} items", action, self.succeeded())
        } else {
            format!("{} {} items, {} failed", action, self.succeeded(), self.failed)
        };
        if self.cancelled {
            summary.push_str(" (cancelled)");
        }
        summary
    }
}
