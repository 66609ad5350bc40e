//! Ordering deletions across duplicate groups that share files.

use std::collections::HashSet;
use std::path::PathBuf;

use siftdupe_analyze::SemanticGroup;

/// What resolving one group amounts to.
#[derive(Debug, PartialEq, Eq)]
pub enum GroupPlan {
    /// Delete `targets`, each restorable from `kept`.
    Delete { kept: PathBuf, targets: Vec<PathBuf> },
    /// The recommendation needs a human decision.
    ManualReview,
    /// Nothing can be removed without touching a file an earlier group
    /// depends on.
    Overlapping,
}

/// Plans deletions so a file never serves as a restore source and a
/// deletion target at once.
///
/// Once a group keeps a file, later groups never delete it. A group whose
/// own keeper is already gone is left alone.
#[derive(Debug, Default)]
pub struct ResolutionPlanner {
    protected: HashSet<PathBuf>,
    removed: HashSet<PathBuf>,
}

impl ResolutionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what to delete for `group`, given the groups planned before it.
    pub fn plan(&mut self, group: &SemanticGroup) -> GroupPlan {
        if !group.recommendation.is_automatic() {
            return GroupPlan::ManualReview;
        }
        let Some(kept) = group.kept_file() else {
            return GroupPlan::ManualReview;
        };
        if self.removed.contains(&kept.path) {
            return GroupPlan::Overlapping;
        }

        let targets: Vec<PathBuf> = group
            .removal_candidates()
            .into_iter()
            .map(|f| f.path.clone())
            .filter(|p| {
                *p != kept.path && !self.removed.contains(p) && !self.protected.contains(p)
            })
            .collect();
        if targets.is_empty() {
            return GroupPlan::Overlapping;
        }

        self.protected.insert(kept.path.clone());
        GroupPlan::Delete {
            kept: kept.path.clone(),
            targets,
        }
    }

    /// Record files that no longer exist.
    pub fn mark_removed(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.removed.extend(paths);
    }
}
