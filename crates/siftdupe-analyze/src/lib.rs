//! Duplicate and near-duplicate detection for siftdupe.
//!
//! This crate turns scanned [`FileRecord`](siftdupe_core::FileRecord)s into
//! duplicate groups with a keep/remove recommendation each:
//!
//! - **Exact duplicates** - records sharing a BLAKE3 content hash, with an
//!   explicit [`KeepPolicy`] choosing the surviving copy
//! - **Burst photos** - images created within a short window of each other
//! - **Near-identical images** - perceptual fingerprints within a Hamming
//!   distance threshold
//! - **Resolution variants** - the same image family at several pixel sizes
//! - **Document versions** - names that differ only in version markers, and
//!   documents whose word sets are nearly the same
//!
//! Overlapping proposals are resolved by [`GroupMerger`]: strategies run in a
//! fixed order and a file belongs to the first group that claims it.
//!
//! ```rust,ignore
//! use siftdupe_analyze::{DuplicateDetector, DetectionConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let detector = DuplicateDetector::with_config(DetectionConfig::default());
//! let report = detector.detect(&records, &CancellationToken::new()).await?;
//!
//! for group in &report.semantic_groups {
//!     println!("{} {}: {}", group.id, group.group_type, group.recommendation);
//! }
//! ```

mod cluster;
mod config;
mod detector;
mod error;
mod exact;
mod fingerprint;
mod group;
mod merge;
mod recommend;
pub mod strategies;

pub use cluster::ClusterMode;
pub use config::{DetectionConfig, DetectionConfigBuilder};
pub use detector::{DetectionPhase, DetectionProgress, DetectionReport, DuplicateDetector};
pub use error::DetectError;
pub use exact::{
    ExactConfig, ExactConfigBuilder, ExactDuplicateGroup, ExactDuplicateGrouper, KeepPolicy,
};
pub use fingerprint::{
    DEFAULT_DISTANCE_THRESHOLD, SimilarityBand, distance_to_similarity, fingerprint_distance,
    hamming_distance,
};
pub use group::{GroupId, GroupType, SemanticGroup};
pub use merge::GroupMerger;
pub use recommend::{Recommendation, RecommendationEngine, best_quality_image, document_versions};
