//! Detection configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use siftdupe_core::FINGERPRINT_BITS;

use crate::cluster::ClusterMode;
use crate::exact::KeepPolicy;
use crate::fingerprint::DEFAULT_DISTANCE_THRESHOLD;

/// Configuration for a [`DuplicateDetector`](crate::DuplicateDetector).
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct DetectionConfig {
    /// Largest gap between consecutive photos of one burst, in seconds.
    #[builder(default = "2.0")]
    pub burst_window_secs: f64,

    /// Largest fingerprint distance at which images cluster.
    #[builder(default = "DEFAULT_DISTANCE_THRESHOLD")]
    pub hash_distance_threshold: u32,

    /// Smallest Jaccard similarity at which documents cluster (inclusive).
    #[builder(default = "0.85")]
    pub text_similarity_threshold: f64,

    #[builder(default)]
    pub cluster_mode: ClusterMode,

    /// Which copy of an exact duplicate group to keep.
    #[builder(default)]
    pub keep_policy: KeepPolicy,

    /// Yield to the runtime after this many enriched files.
    #[builder(default = "8")]
    pub yield_every: usize,

    /// Run the semantic strategies in addition to exact grouping.
    #[builder(default = "true")]
    pub semantic: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            burst_window_secs: 2.0,
            hash_distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            text_similarity_threshold: 0.85,
            cluster_mode: ClusterMode::default(),
            keep_policy: KeepPolicy::default(),
            yield_every: 8,
            semantic: true,
        }
    }
}

impl DetectionConfig {
    /// Create a new config builder.
    pub fn builder() -> DetectionConfigBuilder {
        DetectionConfigBuilder::default()
    }

    /// Check ranges for a config that did not come through the builder.
    pub fn validate(&self) -> Result<(), String> {
        check(
            self.burst_window_secs,
            self.hash_distance_threshold,
            self.text_similarity_threshold,
            self.yield_every,
        )
    }
}

impl DetectionConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let defaults = DetectionConfig::default();
        check(
            self.burst_window_secs.unwrap_or(defaults.burst_window_secs),
            self.hash_distance_threshold
                .unwrap_or(defaults.hash_distance_threshold),
            self.text_similarity_threshold
                .unwrap_or(defaults.text_similarity_threshold),
            self.yield_every.unwrap_or(defaults.yield_every),
        )
    }
}

fn check(window: f64, distance: u32, text: f64, yield_every: usize) -> Result<(), String> {
    if !(window.is_finite() && window > 0.0) {
        return Err(format!("Burst window must be positive, got {window}"));
    }
    if distance > FINGERPRINT_BITS {
        return Err(format!(
            "Hash distance threshold must be at most {FINGERPRINT_BITS}, got {distance}"
        ));
    }
    if !(0.0..=1.0).contains(&text) {
        return Err(format!("Text similarity threshold must be within [0, 1], got {text}"));
    }
    if yield_every == 0 {
        return Err("yield_every must be at least 1".to_string());
    }
    Ok(())
}
