//! Fingerprint comparison and similarity bands.

use serde::{Deserialize, Serialize};
use strum::Display;

use siftdupe_core::{FINGERPRINT_BITS, Fingerprint, FingerprintError};

/// Largest Hamming distance at which two images are duplicate candidates.
pub const DEFAULT_DISTANCE_THRESHOLD: u32 = 10;

/// Hamming distance between two hex fingerprints.
///
/// Each hex digit is compared through its 4-bit value. Fingerprints of
/// different lengths have no defined distance.
pub fn hamming_distance(a: &str, b: &str) -> Result<u32, FingerprintError> {
    if a.len() != b.len() {
        return Err(FingerprintError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    a.chars().zip(b.chars()).try_fold(0u32, |acc, (x, y)| {
        let x = x.to_digit(16).ok_or(FingerprintError::InvalidHex { ch: x })?;
        let y = y.to_digit(16).ok_or(FingerprintError::InvalidHex { ch: y })?;
        Ok(acc + (x ^ y).count_ones())
    })
}

/// Hamming distance between two parsed fingerprints.
pub fn fingerprint_distance(a: &Fingerprint, b: &Fingerprint) -> Result<u32, FingerprintError> {
    hamming_distance(a.as_str(), b.as_str())
}

/// Similarity score for a 64-bit fingerprint distance, in [0.0, 1.0].
pub fn distance_to_similarity(distance: u32) -> f64 {
    1.0 - f64::from(distance.min(FINGERPRINT_BITS)) / f64::from(FINGERPRINT_BITS)
}

/// User-facing similarity label for a fingerprint distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityBand {
    /// Distance 0.
    Identical,
    /// Distance 1–5.
    NearIdentical,
    /// Distance 6–10.
    Similar,
    /// Distance above 10.
    Different,
}

impl SimilarityBand {
    /// Classify a Hamming distance.
    pub fn classify(distance: u32) -> Self {
        match distance {
            0 => Self::Identical,
            1..=5 => Self::NearIdentical,
            6..=10 => Self::Similar,
            _ => Self::Different,
        }
    }

    /// Whether images in this band are duplicate candidates.
    pub fn is_candidate(self) -> bool {
        !matches!(self, Self::Different)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "ffffffff00000000";

    #[test]
    fn test_self_distance_is_zero() {
        assert_eq!(hamming_distance(A, A).unwrap(), 0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let b = "fffffff000000001";
        assert_eq!(hamming_distance(A, b).unwrap(), 5);
        assert_eq!(hamming_distance(b, A).unwrap(), 5);
    }

    #[test]
    fn test_distance_is_case_insensitive() {
        assert_eq!(hamming_distance("FF", "ff").unwrap(), 0);
    }

    #[test]
    fn test_full_inversion() {
        assert_eq!(hamming_distance(A, "00000000ffffffff").unwrap(), 64);
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        assert_eq!(
            hamming_distance("ff", "fff"),
            Err(FingerprintError::LengthMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn test_invalid_hex_fails() {
        assert_eq!(
            hamming_distance("fg", "ff"),
            Err(FingerprintError::InvalidHex { ch: 'g' })
        );
    }

    #[test]
    fn test_bands() {
        assert_eq!(SimilarityBand::classify(0), SimilarityBand::Identical);
        assert_eq!(SimilarityBand::classify(3), SimilarityBand::NearIdentical);
        assert_eq!(SimilarityBand::classify(5), SimilarityBand::NearIdentical);
        assert_eq!(SimilarityBand::classify(8), SimilarityBand::Similar);
        assert_eq!(SimilarityBand::classify(10), SimilarityBand::Similar);
        assert_eq!(SimilarityBand::classify(15), SimilarityBand::Different);
        assert!(!SimilarityBand::classify(15).is_candidate());
        assert_eq!(SimilarityBand::NearIdentical.to_string(), "near-identical");
    }

    #[test]
    fn test_distance_to_similarity() {
        assert_eq!(distance_to_similarity(0), 1.0);
        assert_eq!(distance_to_similarity(64), 0.0);
        assert!((distance_to_similarity(10) - (1.0 - 10.0 / 64.0)).abs() < 1e-12);
    }
}
