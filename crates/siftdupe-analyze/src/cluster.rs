//! Threshold clustering shared by the image and text strategies.

use serde::{Deserialize, Serialize};
use strum::Display;

/// How pairwise matches are turned into clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ClusterMode {
    /// Single pass seeded by input order: each unclaimed record claims every
    /// later unclaimed record that matches it directly. A chain A~B~C with
    /// A≁C may split across clusters.
    #[default]
    Greedy,
    /// Connected components of the match graph. Chains always end up in one
    /// cluster.
    Connected,
}

/// A cluster of input indices in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexCluster {
    pub members: Vec<usize>,
    /// Largest cost among the links that formed the cluster.
    pub max_cost: u32,
}

/// Cluster `len` items given a pairwise `link` returning the match cost,
/// or `None` when the pair does not match.
///
/// Only clusters with at least two members are returned, ordered by their
/// first member.
pub(crate) fn cluster_indices<F>(len: usize, mode: ClusterMode, link: F) -> Vec<IndexCluster>
where
    F: FnMut(usize, usize) -> Option<u32>,
{
    match mode {
        ClusterMode::Greedy => greedy(len, link),
        ClusterMode::Connected => connected(len, link),
    }
}

fn greedy<F>(len: usize, mut link: F) -> Vec<IndexCluster>
where
    F: FnMut(usize, usize) -> Option<u32>,
{
    let mut claimed = vec![false; len];
    let mut clusters = Vec::new();

    for seed in 0..len {
        if claimed[seed] {
            continue;
        }
        let mut members = vec![seed];
        let mut max_cost = 0;
        for other in seed + 1..len {
            if claimed[other] {
                continue;
            }
            if let Some(cost) = link(seed, other) {
                claimed[other] = true;
                members.push(other);
                max_cost = max_cost.max(cost);
            }
        }
        if members.len() > 1 {
            claimed[seed] = true;
            clusters.push(IndexCluster { members, max_cost });
        }
    }

    clusters
}

fn connected<F>(len: usize, mut link: F) -> Vec<IndexCluster>
where
    F: FnMut(usize, usize) -> Option<u32>,
{
    let mut sets = DisjointSets::new(len);
    let mut edge_costs = Vec::new();

    for a in 0..len {
        for b in a + 1..len {
            if let Some(cost) = link(a, b) {
                sets.union(a, b);
                edge_costs.push((a, cost));
            }
        }
    }

    let mut by_root: Vec<Option<IndexCluster>> = vec![None; len];
    let mut order = Vec::new();
    for idx in 0..len {
        let root = sets.find(idx);
        let slot = by_root[root].get_or_insert_with(|| {
            order.push(root);
            IndexCluster {
                members: Vec::new(),
                max_cost: 0,
            }
        });
        slot.members.push(idx);
    }
    for (a, cost) in edge_costs {
        let root = sets.find(a);
        if let Some(cluster) = by_root[root].as_mut() {
            cluster.max_cost = cluster.max_cost.max(cost);
        }
    }

    order
        .into_iter()
        .filter_map(|root| by_root[root].take())
        .filter(|c| c.members.len() > 1)
        .collect()
}

/// Union-find with path halving and union by size.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Items on a number line; linked when within 2 units.
    fn line_link(points: &[i32]) -> impl FnMut(usize, usize) -> Option<u32> + '_ {
        move |a, b| {
            let d = (points[a] - points[b]).unsigned_abs();
            (d <= 2).then_some(d)
        }
    }

    #[test]
    fn test_greedy_splits_chains() {
        // 0~2, 2~4, but 0≁4
        let points = [0, 2, 4];
        let clusters = cluster_indices(points.len(), ClusterMode::Greedy, line_link(&points));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1]);
        assert_eq!(clusters[0].max_cost, 2);
    }

    #[test]
    fn test_connected_joins_chains() {
        let points = [0, 2, 4];
        let clusters = cluster_indices(points.len(), ClusterMode::Connected, line_link(&points));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1, 2]);
        assert_eq!(clusters[0].max_cost, 2);
    }

    #[test]
    fn test_singletons_dropped() {
        let points = [0, 10, 20, 21];
        for mode in [ClusterMode::Greedy, ClusterMode::Connected] {
            let clusters = cluster_indices(points.len(), mode, line_link(&points));
            assert_eq!(clusters.len(), 1);
            assert_eq!(clusters[0].members, vec![2, 3]);
            assert_eq!(clusters[0].max_cost, 1);
        }
    }

    #[test]
    fn test_clusters_ordered_by_first_member() {
        let points = [0, 100, 1, 101];
        let clusters = cluster_indices(points.len(), ClusterMode::Connected, line_link(&points));
        assert_eq!(clusters[0].members, vec![0, 2]);
        assert_eq!(clusters[1].members, vec![1, 3]);
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_indices(0, ClusterMode::Greedy, |_, _| Some(0)).is_empty());
        assert!(cluster_indices(0, ClusterMode::Connected, |_, _| Some(0)).is_empty());
    }
}
