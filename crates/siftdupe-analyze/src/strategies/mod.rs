//! Semantic clustering strategies.
//!
//! Each strategy turns a subset of records into proposed groups. They run in
//! the order of [`StrategyKind::ORDER`], and the merger keeps the first
//! group that claims a file.

mod burst;
mod documents;
mod variants;
mod visual;

pub use burst::burst_groups;
pub use documents::{
    content_similarity_groups, document_groups, document_version_groups, jaccard_similarity,
    version_key, word_set,
};
pub use variants::{resolution_key, resolution_variant_groups};
pub use visual::near_identical_groups;

use strum::Display;

/// Identifies a strategy in logs and progress updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StrategyKind {
    BurstPhotos,
    NearIdenticalImages,
    ResolutionVariants,
    Documents,
}

impl StrategyKind {
    /// Run order, which is also merge precedence.
    pub const ORDER: [StrategyKind; 4] = [
        Self::BurstPhotos,
        Self::NearIdenticalImages,
        Self::ResolutionVariants,
        Self::Documents,
    ];
}
