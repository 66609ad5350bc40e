//! Exact duplicate grouping by content hash.
//!
//! Records are partitioned by their precomputed hash in encounter order.
//! Which copy survives is an explicit [`KeepPolicy`]; the keeper is moved to
//! the front of its group so "all but the first" is always the removable set.

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use siftdupe_core::{ContentHash, FileRecord};

use crate::recommend::first_max_by_key;

/// Rule for choosing which byte-identical copy to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// The first copy in input order.
    #[default]
    FirstEncountered,
    /// The copy with the earliest creation time.
    Oldest,
    /// The copy with the latest creation time.
    Newest,
    /// The copy with the shortest path (fewest components, then characters).
    ShortestPath,
}

impl KeepPolicy {
    /// Index of the member to keep. Ties go to the earliest member.
    pub fn select(self, files: &[FileRecord]) -> usize {
        let position = |target: Option<&FileRecord>| {
            target
                .and_then(|t| files.iter().position(|f| std::ptr::eq(f, t)))
                .unwrap_or(0)
        };
        match self {
            Self::FirstEncountered => 0,
            Self::Oldest => position(first_max_by_key(files, |f| std::cmp::Reverse(f.created))),
            Self::Newest => position(first_max_by_key(files, |f| f.created)),
            Self::ShortestPath => position(first_max_by_key(files, |f| {
                std::cmp::Reverse((f.path.components().count(), f.path.as_os_str().len()))
            })),
        }
    }
}

/// Configuration for exact duplicate grouping.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ExactConfig {
    /// Which copy of each group to keep.
    #[builder(default)]
    #[serde(default)]
    pub keep_policy: KeepPolicy,
}

impl ExactConfig {
    /// Create a new config builder.
    pub fn builder() -> ExactConfigBuilder {
        ExactConfigBuilder::default()
    }
}

/// A group of files sharing identical content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactDuplicateGroup {
    /// Content hash shared by all files in this group.
    pub hash: ContentHash,

    /// Members, keeper first.
    pub files: Vec<FileRecord>,

    /// Policy that picked the keeper.
    pub keep_policy: KeepPolicy,
}

impl ExactDuplicateGroup {
    /// Number of files in the group.
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// Number of removable copies (members − 1).
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Combined size of all members.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Bytes freed by removing every member except the first.
    pub fn potential_savings(&self) -> u64 {
        self.files.iter().skip(1).map(|f| f.size).sum()
    }

    /// The copy that is kept.
    pub fn keeper(&self) -> &FileRecord {
        &self.files[0]
    }

    /// The copies that may be removed.
    pub fn removable(&self) -> &[FileRecord] {
        &self.files[1..]
    }
}

/// Groups records by their content hash.
pub struct ExactDuplicateGrouper {
    config: ExactConfig,
}

impl ExactDuplicateGrouper {
    /// Create a grouper with default config.
    pub fn new() -> Self {
        Self {
            config: ExactConfig::default(),
        }
    }

    /// Create a grouper with custom config.
    pub fn with_config(config: ExactConfig) -> Self {
        Self { config }
    }

    /// Group records that share a content hash.
    ///
    /// Records without a hash are skipped. Groups are sorted by potential
    /// savings, largest first; ties keep encounter order.
    pub fn group<'a, I>(&self, records: I) -> Vec<ExactDuplicateGroup>
    where
        I: IntoIterator<Item = &'a FileRecord>,
    {
        let mut by_hash: IndexMap<ContentHash, Vec<FileRecord>> = IndexMap::new();
        for record in records {
            if let Some(hash) = record.content_hash {
                by_hash.entry(hash).or_default().push(record.clone());
            }
        }

        let policy = self.config.keep_policy;
        let mut groups: Vec<ExactDuplicateGroup> = by_hash
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(hash, mut files)| {
                let keeper = policy.select(&files);
                if keeper != 0 {
                    let kept = files.remove(keeper);
                    files.insert(0, kept);
                }
                ExactDuplicateGroup {
                    hash,
                    files,
                    keep_policy: policy,
                }
            })
            .collect();

        groups.sort_by(|a, b| b.potential_savings().cmp(&a.potential_savings()));
        groups
    }
}

impl Default for ExactDuplicateGrouper {
    fn default() -> Self {
        Self::new()
    }
}
