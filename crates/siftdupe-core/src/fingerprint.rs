//! Perceptual fingerprint type and average-hash encoding.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bits in an average-hash fingerprint (8×8 grid).
pub const FINGERPRINT_BITS: u32 = 64;

/// Length of an average-hash fingerprint in hex digits.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Errors from building or comparing fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    /// Fingerprints of different lengths cannot be compared.
    #[error("fingerprint lengths differ ({left} vs {right} hex digits)")]
    LengthMismatch { left: usize, right: usize },

    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex digit {ch:?} in fingerprint")]
    InvalidHex { ch: char },

    /// Empty fingerprint string.
    #[error("fingerprint is empty")]
    Empty,

    /// Average hash needs exactly one luma sample per grid cell.
    #[error("expected 64 grayscale samples, got {count}")]
    InvalidSampleCount { count: usize },
}

/// A perceptual fingerprint, stored as a lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(CompactString);

impl Fingerprint {
    /// Parse a hex fingerprint, normalizing to lowercase.
    pub fn new(hex: &str) -> Result<Self, FingerprintError> {
        if hex.is_empty() {
            return Err(FingerprintError::Empty);
        }
        if let Some(ch) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(FingerprintError::InvalidHex { ch });
        }
        Ok(Self(CompactString::new(hex.to_ascii_lowercase())))
    }

    /// Encode an average hash from 64 grayscale samples in row-major order.
    ///
    /// Bit *i* (counting from the most significant bit) is set when sample
    /// *i* is strictly brighter than the mean of all samples.
    pub fn from_average_hash(luma: &[u8]) -> Result<Self, FingerprintError> {
        if luma.len() != FINGERPRINT_BITS as usize {
            return Err(FingerprintError::InvalidSampleCount { count: luma.len() });
        }
        let mean = luma.iter().map(|&p| f64::from(p)).sum::<f64>() / luma.len() as f64;
        let bits = luma
            .iter()
            .fold(0u64, |acc, &p| (acc << 1) | u64::from(f64::from(p) > mean));
        Ok(Self(CompactString::new(format!("{bits:016x}"))))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Length in hex digits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let fp = Fingerprint::new("FFee0011AABBccDD").unwrap();
        assert_eq!(fp.as_str(), "ffee0011aabbccdd");
        assert_eq!(fp.len(), FINGERPRINT_HEX_LEN);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Fingerprint::new(""), Err(FingerprintError::Empty));
        assert_eq!(
            Fingerprint::new("00zz"),
            Err(FingerprintError::InvalidHex { ch: 'z' })
        );
    }

    #[test]
    fn test_average_hash_encoding() {
        // Left half dark, right half bright in every row.
        let luma: Vec<u8> = (0..64).map(|i| if i % 8 < 4 { 10 } else { 200 }).collect();
        let fp = Fingerprint::from_average_hash(&luma).unwrap();
        assert_eq!(fp.as_str(), "0f0f0f0f0f0f0f0f");
    }

    #[test]
    fn test_average_hash_uniform_image_is_zero() {
        let fp = Fingerprint::from_average_hash(&[128; 64]).unwrap();
        assert_eq!(fp.as_str(), "0000000000000000");
    }

    #[test]
    fn test_average_hash_wrong_sample_count() {
        assert_eq!(
            Fingerprint::from_average_hash(&[0; 10]),
            Err(FingerprintError::InvalidSampleCount { count: 10 })
        );
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = serde_json::to_string(&Fingerprint::new("00ff").unwrap()).unwrap();
        assert_eq!(json, "\"00ff\"");
        assert!(serde_json::from_str::<Fingerprint>("\"xyz\"").is_err());
    }
}
