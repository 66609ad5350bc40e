//! Document versions (by filename) and similar documents (by content).

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use siftdupe_core::{FileId, FileRecord};

use crate::cluster::{ClusterMode, cluster_indices};
use crate::group::{GroupType, SemanticGroup};
use crate::recommend::{Recommendation, document_versions};

/// Confidence assigned to filename-based version groups.
const VERSION_SCORE: f64 = 0.90;

/// Confidence assigned to content-similarity groups.
const CONTENT_SCORE: f64 = 0.85;

/// `(1)`-style copy markers, anywhere in the stem.
static COPY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)").expect("copy marker pattern is valid"));

/// A whole token that only marks a version.
static VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:v\d+(?:\.\d+)*|version\d*(?:\.\d+)*|draft|final|rev\d*|revised|revision|copy|old|new|backup)$",
    )
    .expect("version token pattern is valid")
});

/// Family key for a document: version tokens dropped, remaining tokens
/// lowercased and joined, then the extension appended.
///
/// A trailing number of at most three digits counts as a version
/// (`report_2`); longer ones such as years stay part of the name.
/// Returns `None` when nothing but version tokens remain.
pub fn version_key(stem: &str, extension: &str) -> Option<String> {
    let stem = COPY_MARKER.replace_all(stem, " ");
    let mut tokens = Vec::new();

    for token in stem.split([' ', '_', '-']).filter(|t| !t.is_empty()) {
        // checked before splitting on '.' so "v2.1" goes as one token
        if VERSION_TOKEN.is_match(token) {
            continue;
        }
        tokens.extend(
            token
                .split('.')
                .filter(|part| !part.is_empty() && !VERSION_TOKEN.is_match(part))
                .map(str::to_lowercase),
        );
    }

    if tokens.len() > 1 && tokens.last().is_some_and(|t| is_version_number(t)) {
        tokens.pop();
    }
    if tokens.is_empty() {
        return None;
    }
    Some(format!("{}.{}", tokens.join(" "), extension.to_lowercase()))
}

fn is_version_number(token: &str) -> bool {
    (1..=3).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_digit())
}

/// Group documents whose names differ only in version markers.
pub fn document_version_groups(documents: &[&FileRecord]) -> Vec<SemanticGroup> {
    let mut families: IndexMap<String, Vec<&FileRecord>> = IndexMap::new();
    for &doc in documents {
        if let Some(key) = version_key(doc.stem(), &doc.extension()) {
            families.entry(key).or_default().push(doc);
        }
    }

    families
        .into_values()
        .filter(|members| members.len() >= 2)
        .map(|members| {
            let files: Vec<FileRecord> = members.into_iter().cloned().collect();
            let recommendation = document_versions(&files);
            SemanticGroup::new(GroupType::DocumentVersions, files, VERSION_SCORE, recommendation)
        })
        .collect()
}

/// Lowercased whitespace-separated words of a text.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Jaccard similarity of two sets: |A ∩ B| / |A ∪ B|.
///
/// Two empty sets score 0.0; they carry no evidence of similarity.
pub fn jaccard_similarity<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Cluster documents whose word sets reach `threshold` Jaccard similarity.
///
/// Documents without text, or whose text has no words, are skipped.
pub fn content_similarity_groups(
    documents: &[&FileRecord],
    threshold: f64,
    mode: ClusterMode,
) -> Vec<SemanticGroup> {
    let candidates: Vec<(&FileRecord, HashSet<String>)> = documents
        .iter()
        .filter_map(|doc| {
            let words = word_set(doc.text.as_deref()?);
            (!words.is_empty()).then_some((*doc, words))
        })
        .collect();

    cluster_indices(candidates.len(), mode, |a, b| {
        (jaccard_similarity(&candidates[a].1, &candidates[b].1) >= threshold).then_some(0)
    })
    .into_iter()
    .map(|cluster| {
        let files: Vec<FileRecord> = cluster
            .members
            .iter()
            .map(|&idx| candidates[idx].0.clone())
            .collect();
        SemanticGroup::new(
            GroupType::SimilarDocuments,
            files,
            CONTENT_SCORE,
            Recommendation::ManualReview,
        )
    })
    .collect()
}

/// Run the filename pass, then the content pass over the documents the
/// filename pass left unclaimed.
pub fn document_groups(
    documents: &[&FileRecord],
    threshold: f64,
    mode: ClusterMode,
) -> Vec<SemanticGroup> {
    let mut groups = document_version_groups(documents);

    let claimed: HashSet<FileId> = groups.iter().flat_map(|g| g.file_ids()).collect();
    let unclaimed: Vec<&FileRecord> = documents
        .iter()
        .copied()
        .filter(|doc| !claimed.contains(&doc.id))
        .collect();

    groups.extend(content_similarity_groups(&unclaimed, threshold, mode));
    groups
}
