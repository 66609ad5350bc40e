//! File system scanning engine for siftdupe.
//!
//! This crate turns a directory tree into the flat list of
//! [`FileRecord`]s the detection engine works on.
//!
//! # Overview
//!
//! - **Parallel traversal** via jwalk/rayon
//! - **Hardlink detection** so a second link to the same inode is never
//!   reported as a duplicate
//! - **Content hashing** with BLAKE3, only for files that share a size
//! - **Content analysis** through the [`ImageFingerprinter`] and
//!   [`TextExtractor`] capabilities
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use siftdupe_scan::{JwalkScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/photos");
//! let scanner = JwalkScanner::new();
//! let outcome = scanner.scan(&config).unwrap();
//!
//! println!("{} files, {} bytes", outcome.records.len(), outcome.total_size);
//! ```

mod content;
mod hash;
mod inode;
mod progress;
mod scanner;

pub use content::{AverageHashFingerprinter, PlainTextExtractor};
pub use hash::{hash_bytes, hash_file};
pub use inode::InodeTracker;
pub use progress::{ScanPhase, ScanProgress};
pub use scanner::{JwalkScanner, ScanOutcome};

// Re-export core types for convenience
pub use siftdupe_core::{
    ContentError, FileId, FileKind, FileRecord, ImageFingerprinter, ScanConfig, ScanError,
    ScanWarning, TextExtractor, WarningKind,
};
