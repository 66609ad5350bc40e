//! Near-identical images by perceptual fingerprint distance.

use siftdupe_core::FileRecord;

use crate::cluster::{ClusterMode, cluster_indices};
use crate::fingerprint::{distance_to_similarity, fingerprint_distance};
use crate::group::{GroupType, SemanticGroup};
use crate::recommend::best_quality_image;

/// Cluster images whose fingerprints are within `threshold` bits.
///
/// Images without a fingerprint, or whose fingerprints cannot be compared,
/// never link. The score is derived from the largest distance that formed
/// the cluster.
pub fn near_identical_groups(
    images: &[&FileRecord],
    threshold: u32,
    mode: ClusterMode,
) -> Vec<SemanticGroup> {
    let candidates: Vec<&FileRecord> = images
        .iter()
        .copied()
        .filter(|f| f.fingerprint.is_some())
        .collect();

    let clusters = cluster_indices(candidates.len(), mode, |a, b| {
        let (fa, fb) = (candidates[a].fingerprint.as_ref()?, candidates[b].fingerprint.as_ref()?);
        fingerprint_distance(fa, fb).ok().filter(|d| *d <= threshold)
    });

    clusters
        .into_iter()
        .map(|cluster| {
            let files: Vec<FileRecord> = cluster
                .members
                .iter()
                .map(|&idx| candidates[idx].clone())
                .collect();
            let recommendation = best_quality_image(&files);
            SemanticGroup::new(
                GroupType::NearIdenticalImages,
                files,
                distance_to_similarity(cluster.max_cost),
                recommendation,
            )
        })
        .collect()
}
