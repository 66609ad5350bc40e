//! Resolution variants: the same picture exported at several sizes.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use siftdupe_core::FileRecord;

use crate::group::{GroupType, SemanticGroup};
use crate::recommend::{Recommendation, first_max_by_key};

/// Confidence assigned to every resolution-variant group.
const VARIANT_SCORE: f64 = 0.98;

/// One trailing resolution or quality marker.
static SIZE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:[_-]\d+x\d+|@\d+x|-(?:small|medium|large|thumbnail|thumb)|_(?:hd|sd|4k|1080p|720p))$",
    )
    .expect("size suffix pattern is valid")
});

/// Family key for an image stem: trailing size markers stripped, lowercased.
///
/// Markers are stripped repeatedly, so `logo_1920x1080@2x` and `logo` share
/// a key.
pub fn resolution_key(stem: &str) -> String {
    let mut key = stem;
    while let Some(m) = SIZE_SUFFIX.find(key) {
        if m.start() == 0 {
            break;
        }
        key = &key[..m.start()];
    }
    key.to_lowercase()
}

/// Group images that share a family key but differ in pixel area.
///
/// Only images with known dimensions take part.
pub fn resolution_variant_groups(images: &[&FileRecord]) -> Vec<SemanticGroup> {
    let mut families: IndexMap<String, Vec<&FileRecord>> = IndexMap::new();
    for image in images.iter().copied().filter(|f| f.dimensions.is_some()) {
        families
            .entry(resolution_key(image.stem()))
            .or_default()
            .push(image);
    }

    families
        .into_values()
        .filter(|members| members.len() >= 2)
        .filter(|members| {
            let first = members[0].pixel_area();
            members.iter().any(|f| f.pixel_area() != first)
        })
        .filter_map(|members| {
            let files: Vec<FileRecord> = members.into_iter().cloned().collect();
            let keep = first_max_by_key(&files, |f| f.pixel_area())?.id;
            Some(SemanticGroup::new(
                GroupType::ResolutionVariants,
                files,
                VARIANT_SCORE,
                Recommendation::KeepHighestResolution { keep },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use siftdupe_core::FileId;

    fn image(id: u64, name: &str, w: u32, h: u32) -> FileRecord {
        FileRecord::new(FileId::new(id), format!("/img/{name}"), 100, Utc::now())
            .with_dimensions(w, h)
    }

    #[test]
    fn test_resolution_keys() {
        assert_eq!(resolution_key("Banner_1920x1080"), "banner");
        assert_eq!(resolution_key("banner-800x600"), "banner");
        assert_eq!(resolution_key("icon@2x"), "icon");
        assert_eq!(resolution_key("hero-THUMB"), "hero");
        assert_eq!(resolution_key("clip_1080p"), "clip");
        assert_eq!(resolution_key("logo_1920x1080@2x"), "logo");
        assert_eq!(resolution_key("holiday"), "holiday");
        // a marker alone is the whole name, not a suffix
        assert_eq!(resolution_key("-small"), "-small");
    }

    #[test]
    fn test_groups_variants_and_keeps_largest() {
        let files = [
            image(1, "banner_800x600.png", 800, 600),
            image(2, "banner_1920x1080.png", 1920, 1080),
            image(3, "banner-thumb.png", 160, 120),
            image(4, "other.png", 10, 10),
        ];
        let refs: Vec<_> = files.iter().collect();
        let groups = resolution_variant_groups(&refs);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 3);
        assert_eq!(
            groups[0].recommendation,
            Recommendation::KeepHighestResolution { keep: FileId::new(2) }
        );
        assert_eq!(groups[0].similarity, 0.98);
    }

    #[test]
    fn test_equal_areas_are_not_variants() {
        let files = [image(1, "a_hd.png", 100, 100), image(2, "a_sd.png", 100, 100)];
        let refs: Vec<_> = files.iter().collect();
        assert!(resolution_variant_groups(&refs).is_empty());
    }

    #[test]
    fn test_images_without_dimensions_do_not_count() {
        let bare = FileRecord::new(FileId::new(2), "/img/a_hd.png", 100, Utc::now());
        let files = [image(1, "a_sd.png", 100, 100), bare];
        let refs: Vec<_> = files.iter().collect();
        assert!(resolution_variant_groups(&refs).is_empty());
    }
}
