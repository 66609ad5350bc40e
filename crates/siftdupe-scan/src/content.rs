//! Default content-analysis capabilities.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use image::ImageError;
use image::imageops::FilterType;

use siftdupe_core::{ContentError, Dimensions, Fingerprint, ImageFingerprinter, TextExtractor};

/// Side length of the average-hash grid.
const GRID_SIZE: u32 = 8;

/// Extensions [`PlainTextExtractor`] reads.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv", "tex", "html", "htm", "rtf"];

/// Average-hash fingerprinter backed by the `image` crate.
///
/// Decodes the image, resizes it to an 8×8 grid, converts it to grayscale
/// and encodes one bit per cell against the mean intensity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageHashFingerprinter;

impl AverageHashFingerprinter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageFingerprinter for AverageHashFingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, ContentError> {
        let img = image::open(path).map_err(|e| image_error(path, e))?;
        let grid = img
            .resize_exact(GRID_SIZE, GRID_SIZE, FilterType::Triangle)
            .to_luma8();
        Ok(Fingerprint::from_average_hash(grid.as_raw())?)
    }

    fn dimensions(&self, path: &Path) -> Result<Dimensions, ContentError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| image_error(path, e))?;
        Ok(Dimensions::new(width, height))
    }
}

fn image_error(path: &Path, error: ImageError) -> ContentError {
    match error {
        ImageError::IoError(source) => ContentError::io(path, source),
        ImageError::Unsupported(_) => ContentError::Unsupported {
            path: path.to_path_buf(),
        },
        other => ContentError::Decode {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    }
}

/// Reads plain-text documents as (lossy) UTF-8.
#[derive(Debug, Clone, Copy)]
pub struct PlainTextExtractor {
    /// Bytes read from the start of each file.
    pub max_bytes: u64,
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
        }
    }
}

impl TextExtractor for PlainTextExtractor {
    fn supports(&self, extension: &str) -> bool {
        TEXT_EXTENSIONS.contains(&extension)
    }

    fn extract(&self, path: &Path) -> Result<String, ContentError> {
        let file = File::open(path).map_err(|e| ContentError::io(path, e))?;
        let mut buf = Vec::new();
        file.take(self.max_bytes)
            .read_to_end(&mut buf)
            .map_err(|e| ContentError::io(path, e))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
