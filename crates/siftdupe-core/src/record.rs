//! File record types.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::fingerprint::Fingerprint;

/// Extensions treated as images by the semantic strategies.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic", "heif", "avif",
];

/// Extensions treated as documents by the semantic strategies.
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "odt", "rtf", "txt", "md", "markdown", "csv", "xls", "xlsx", "ods",
    "ppt", "pptx", "odp", "pages", "numbers", "key", "tex", "html", "htm",
];

/// Unique identifier for a record within a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl FileId {
    /// Create a new FileId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// BLAKE3 content hash for exact duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Short prefix of the hex form, for display.
    pub fn short_hex(&self) -> String {
        self.0[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Inode information for hardlink detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel area (width × height).
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Broad content category derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Document,
    Other,
}

impl FileKind {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::Other;
        };
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            Self::Document
        } else {
            Self::Other
        }
    }
}

/// An immutable snapshot of one scanned file.
///
/// Optional fields are filled in by content-analysis collaborators. A missing
/// value only means the file cannot take part in the strategy that needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Identifier, unique within one scan.
    pub id: FileId,

    /// Full path to the file.
    pub path: PathBuf,

    /// File name (last path component).
    pub name: CompactString,

    /// Size in bytes.
    pub size: u64,

    /// Creation time, or modification time where the platform lacks one.
    pub created: DateTime<Utc>,

    /// Full-content hash, the exact-match key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,

    /// Perceptual average-hash fingerprint (images only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,

    /// Pixel dimensions (images only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,

    /// Extracted text content (documents only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl FileRecord {
    /// Create a record with no content-analysis data.
    pub fn new(id: FileId, path: impl Into<PathBuf>, size: u64, created: DateTime<Utc>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        Self {
            id,
            path,
            name,
            size,
            created,
            content_hash: None,
            fingerprint: None,
            dimensions: None,
            text: None,
        }
    }

    pub fn with_hash(mut self, hash: ContentHash) -> Self {
        self.content_hash = Some(hash);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions::new(width, height));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Content category of this file.
    pub fn kind(&self) -> FileKind {
        FileKind::from_path(&self.path)
    }

    /// File stem (name without the final extension).
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(0) | None => self.name.as_str(),
            Some(idx) => &self.name[..idx],
        }
    }

    /// Lowercased extension, empty when there is none.
    pub fn extension(&self) -> String {
        match self.name.rfind('.') {
            Some(0) | None => String::new(),
            Some(idx) => self.name[idx + 1..].to_ascii_lowercase(),
        }
    }

    /// Pixel area if dimensions are known.
    pub fn pixel_area(&self) -> Option<u64> {
        self.dimensions.map(|d| d.area())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileRecord {
        FileRecord::new(FileId::new(1), path, 10, Utc::now())
    }

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
        assert_eq!(hash.short_hex().len(), 12);
    }

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(record("/p/IMG_0001.JPG").kind(), FileKind::Image);
        assert_eq!(record("/p/report_v1.docx").kind(), FileKind::Document);
        assert_eq!(record("/p/archive.tar").kind(), FileKind::Other);
        assert_eq!(record("/p/Makefile").kind(), FileKind::Other);
    }

    #[test]
    fn test_stem_and_extension() {
        let r = record("/p/photo.final.PNG");
        assert_eq!(r.stem(), "photo.final");
        assert_eq!(r.extension(), "png");

        let hidden = record("/p/.bashrc");
        assert_eq!(hidden.stem(), ".bashrc");
        assert_eq!(hidden.extension(), "");
    }

    #[test]
    fn test_pixel_area() {
        let r = record("/p/a.png").with_dimensions(1920, 1080);
        assert_eq!(r.pixel_area(), Some(1920 * 1080));
        assert_eq!(record("/p/b.png").pixel_area(), None);
    }
}
