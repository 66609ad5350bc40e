//! Overlap resolution across strategies.

use std::cmp::Reverse;
use std::collections::HashSet;

use tracing::debug;

use siftdupe_core::FileId;

use crate::group::{GroupId, SemanticGroup};

/// Accumulates proposed groups, keeping only those disjoint from every
/// group accepted before them.
///
/// Offer groups in strategy order; earlier strategies win overlaps.
#[derive(Debug, Default)]
pub struct GroupMerger {
    accepted: Vec<SemanticGroup>,
    claimed: HashSet<FileId>,
    rejected: usize,
}

impl GroupMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `group` if it has at least two members and none of them is
    /// already claimed. Returns whether it was accepted.
    pub fn offer(&mut self, group: SemanticGroup) -> bool {
        let ids = group.file_ids();
        if ids.len() < 2 || ids.iter().any(|id| self.claimed.contains(id)) {
            self.rejected += 1;
            return false;
        }
        self.claimed.extend(ids);
        self.accepted.push(group);
        true
    }

    /// Offer every group in order, returning how many were accepted.
    pub fn offer_all(&mut self, groups: impl IntoIterator<Item = SemanticGroup>) -> usize {
        let mut accepted = 0;
        for group in groups {
            if self.offer(group) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Groups dropped so far because they overlapped an accepted group.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Sort accepted groups by potential savings, largest first, and number
    /// them from 1.
    pub fn finish(mut self) -> Vec<SemanticGroup> {
        self.accepted.sort_by_key(|g| Reverse(g.potential_savings()));
        for (idx, group) in self.accepted.iter_mut().enumerate() {
            group.id = GroupId(idx as u32 + 1);
        }
        debug!(
            accepted = self.accepted.len(),
            rejected = self.rejected,
            "merged semantic groups"
        );
        self.accepted
    }
}
