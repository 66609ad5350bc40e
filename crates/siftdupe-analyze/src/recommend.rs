//! Keep/remove recommendations for duplicate groups.

use serde::{Deserialize, Serialize};

use siftdupe_core::{FileId, FileRecord};

use crate::exact::KeepPolicy;
use crate::group::GroupType;

/// What to do with a duplicate group.
///
/// Every variant except [`Recommendation::ManualReview`] names the member
/// to keep; the other members are removal candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Recommendation {
    KeepHighestResolution { keep: FileId },
    KeepNewest { keep: FileId },
    KeepOldest { keep: FileId },
    KeepLargest { keep: FileId },
    /// Keep one byte-identical copy chosen by a [`KeepPolicy`].
    KeepOneCopy { keep: FileId, policy: KeepPolicy },
    /// Keep the latest version and archive the rest.
    ArchiveOlderVersions { keep: FileId, archive: Vec<FileId> },
    /// No automatic pick.
    ManualReview,
}

impl Recommendation {
    /// The member this recommendation keeps.
    pub fn kept_id(&self) -> Option<FileId> {
        match self {
            Self::KeepHighestResolution { keep }
            | Self::KeepNewest { keep }
            | Self::KeepOldest { keep }
            | Self::KeepLargest { keep }
            | Self::KeepOneCopy { keep, .. }
            | Self::ArchiveOlderVersions { keep, .. } => Some(*keep),
            Self::ManualReview => None,
        }
    }

    /// Every file id this recommendation mentions.
    pub fn referenced_ids(&self) -> Vec<FileId> {
        match self {
            Self::ArchiveOlderVersions { keep, archive } => {
                std::iter::once(*keep).chain(archive.iter().copied()).collect()
            }
            other => other.kept_id().into_iter().collect(),
        }
    }

    /// Whether the recommendation can be applied without a human decision.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Self::ManualReview)
    }

    /// Members that applying this recommendation would remove.
    pub fn removal_candidates<'a>(&self, files: &'a [FileRecord]) -> Vec<&'a FileRecord> {
        match self {
            Self::ManualReview => Vec::new(),
            Self::ArchiveOlderVersions { archive, .. } => files
                .iter()
                .filter(|f| archive.contains(&f.id))
                .collect(),
            other => {
                let keep = other.kept_id();
                files.iter().filter(|f| Some(f.id) != keep).collect()
            }
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepHighestResolution { keep } => write!(f, "keep highest resolution ({keep})"),
            Self::KeepNewest { keep } => write!(f, "keep newest ({keep})"),
            Self::KeepOldest { keep } => write!(f, "keep oldest ({keep})"),
            Self::KeepLargest { keep } => write!(f, "keep largest ({keep})"),
            Self::KeepOneCopy { keep, policy } => write!(f, "keep one copy ({keep}, {policy})"),
            Self::ArchiveOlderVersions { keep, archive } => {
                write!(f, "keep {keep}, archive {} older versions", archive.len())
            }
            Self::ManualReview => write!(f, "manual review"),
        }
    }
}

/// Per-group-type keep policy.
pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Recommend an action for a group of the given type.
    ///
    /// Exact-duplicate groups are expected with the keeper first, as the
    /// exact grouper orders them.
    pub fn recommend(
        group_type: GroupType,
        files: &[FileRecord],
        policy: KeepPolicy,
    ) -> Recommendation {
        match group_type {
            GroupType::BurstPhotos | GroupType::NearIdenticalImages => best_quality_image(files),
            GroupType::ResolutionVariants => match first_max_by_key(files, |f| f.pixel_area()) {
                Some(best) if best.dimensions.is_some() => {
                    Recommendation::KeepHighestResolution { keep: best.id }
                }
                _ => best_quality_image(files),
            },
            GroupType::DocumentVersions => document_versions(files),
            GroupType::SimilarDocuments => Recommendation::ManualReview,
            GroupType::ExactDuplicates => match files.first() {
                Some(first) => Recommendation::KeepOneCopy {
                    keep: first.id,
                    policy,
                },
                None => Recommendation::ManualReview,
            },
        }
    }
}

/// Prefer the largest pixel area, then the largest byte size.
///
/// Falls back to manual review when no member has dimensions and all sizes
/// are equal, since nothing distinguishes the copies.
pub fn best_quality_image(files: &[FileRecord]) -> Recommendation {
    if files.iter().any(|f| f.dimensions.is_some()) {
        if let Some(best) = first_max_by_key(files, |f| f.pixel_area()) {
            return Recommendation::KeepHighestResolution { keep: best.id };
        }
    }

    let sizes_differ = files.windows(2).any(|w| w[0].size != w[1].size);
    match first_max_by_key(files, |f| f.size) {
        Some(best) if sizes_differ => Recommendation::KeepLargest { keep: best.id },
        _ => Recommendation::ManualReview,
    }
}

/// Archive all but the newest when there are more than two versions,
/// otherwise keep the newest.
pub fn document_versions(files: &[FileRecord]) -> Recommendation {
    let Some(newest) = first_max_by_key(files, |f| f.created) else {
        return Recommendation::ManualReview;
    };
    if files.len() > 2 {
        Recommendation::ArchiveOlderVersions {
            keep: newest.id,
            archive: files
                .iter()
                .filter(|f| f.id != newest.id)
                .map(|f| f.id)
                .collect(),
        }
    } else {
        Recommendation::KeepNewest { keep: newest.id }
    }
}

/// Like `Iterator::max_by_key`, but the earliest element wins ties.
pub(crate) fn first_max_by_key<T, K, F>(items: &[T], mut key: F) -> Option<&T>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut best: Option<(&T, K)> = None;
    for item in items {
        let k = key(item);
        let better = match &best {
            Some((_, best_key)) => k > *best_key,
            None => true,
        };
        if better {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}
