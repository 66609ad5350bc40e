//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Stage of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Walking the directory tree.
    Walking,
    /// Hashing files that share a size.
    Hashing,
    /// Extracting fingerprints, dimensions and text.
    Analyzing,
    /// Scan finished.
    Done,
}

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Current stage.
    pub phase: ScanPhase,
    /// Number of files found so far.
    pub files_found: u64,
    /// Total bytes found so far.
    pub bytes_found: u64,
    /// Files processed in the current hashing or analysis stage.
    pub files_processed: u64,
    /// Files the current stage will process.
    pub files_total: u64,
    /// Current path being scanned.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            phase: ScanPhase::Walking,
            files_found: 0,
            bytes_found: 0,
            files_processed: 0,
            files_total: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of the current stage completed (0.0 to 1.0).
    pub fn stage_fraction(&self) -> f64 {
        if self.files_total > 0 {
            self.files_processed as f64 / self.files_total as f64
        } else {
            0.0
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_found as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}
