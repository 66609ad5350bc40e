//! Core types and traits for siftdupe.
//!
//! This crate provides the data model shared by the scanner, the detection
//! engine and the resolution manager: file records, content hashes,
//! perceptual fingerprints, scan configuration and the content-analysis
//! capability traits.

mod capability;
mod config;
mod error;
mod fingerprint;
mod record;

pub use capability::{ContentError, ImageFingerprinter, TextExtractor};
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use fingerprint::{Fingerprint, FingerprintError, FINGERPRINT_BITS, FINGERPRINT_HEX_LEN};
pub use record::{ContentHash, Dimensions, FileId, FileKind, FileRecord, InodeInfo};
