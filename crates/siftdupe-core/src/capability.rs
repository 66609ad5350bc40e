//! Content-analysis capabilities injected into the scanner and detector.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fingerprint::{Fingerprint, FingerprintError};
use crate::record::Dimensions;

/// Failure to extract content from one file.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be decoded as the expected format.
    #[error("cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The file type is not handled by this capability.
    #[error("unsupported file type: {path}")]
    Unsupported { path: PathBuf },

    /// The fingerprint produced was malformed.
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
}

impl ContentError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Computes perceptual fingerprints and pixel dimensions of images.
pub trait ImageFingerprinter: Send + Sync {
    /// Average-hash fingerprint of the image at `path`.
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, ContentError>;

    /// Pixel dimensions of the image at `path`.
    fn dimensions(&self, path: &Path) -> Result<Dimensions, ContentError>;
}

/// Extracts plain text from documents.
pub trait TextExtractor: Send + Sync {
    /// Whether this extractor understands the given lowercased extension.
    fn supports(&self, extension: &str) -> bool;

    /// Text content of the document at `path`.
    fn extract(&self, path: &Path) -> Result<String, ContentError>;
}
