//! Duplicate groups produced by the semantic strategies.

use serde::{Deserialize, Serialize};
use strum::Display;

use siftdupe_core::{FileId, FileRecord};

use crate::exact::ExactDuplicateGroup;
use crate::recommend::{Recommendation, RecommendationEngine};

/// Which heuristic produced a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum GroupType {
    BurstPhotos,
    NearIdenticalImages,
    ResolutionVariants,
    DocumentVersions,
    SimilarDocuments,
    ExactDuplicates,
}

/// Identifier of a group within one detection report, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// A group of files judged similar by one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticGroup {
    /// Assigned by the merger; zero until then.
    pub id: GroupId,
    pub group_type: GroupType,
    /// Members in the order the strategy produced them.
    pub files: Vec<FileRecord>,
    /// Strategy confidence in [0.0, 1.0].
    pub similarity: f64,
    pub recommendation: Recommendation,
}

impl SemanticGroup {
    /// Build an unnumbered group.
    pub fn new(
        group_type: GroupType,
        files: Vec<FileRecord>,
        similarity: f64,
        recommendation: Recommendation,
    ) -> Self {
        Self {
            id: GroupId(0),
            group_type,
            files,
            similarity: similarity.clamp(0.0, 1.0),
            recommendation,
        }
    }

    /// Wrap an exact duplicate group so both kinds resolve the same way.
    pub fn from_exact(group: &ExactDuplicateGroup) -> Self {
        let recommendation = RecommendationEngine::recommend(
            GroupType::ExactDuplicates,
            &group.files,
            group.keep_policy,
        );
        Self::new(
            GroupType::ExactDuplicates,
            group.files.clone(),
            1.0,
            recommendation,
        )
    }

    /// Combined size of all members.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Total size minus the single largest member.
    pub fn potential_savings(&self) -> u64 {
        let largest = self.files.iter().map(|f| f.size).max().unwrap_or(0);
        self.total_size() - largest
    }

    pub fn file_ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.id).collect()
    }

    /// At least two members, and the recommendation only names members.
    pub fn is_well_formed(&self) -> bool {
        self.files.len() >= 2
            && self
                .recommendation
                .referenced_ids()
                .iter()
                .all(|id| self.files.iter().any(|f| f.id == *id))
    }

    /// Members that applying the recommendation would remove.
    pub fn removal_candidates(&self) -> Vec<&FileRecord> {
        self.recommendation.removal_candidates(&self.files)
    }

    /// The member the recommendation keeps, if any.
    pub fn kept_file(&self) -> Option<&FileRecord> {
        let keep = self.recommendation.kept_id()?;
        self.files.iter().find(|f| f.id == keep)
    }
}
