//! Burst photos: images taken in quick succession.

use siftdupe_core::FileRecord;

use crate::group::{GroupType, SemanticGroup};
use crate::recommend::best_quality_image;

/// Confidence assigned to every burst group.
const BURST_SCORE: f64 = 0.95;

/// Group images whose consecutive creation times are at most `window_secs`
/// apart.
///
/// Images are ordered by creation time (stable), so the gap is always
/// measured against the previous image of the run, not its first.
pub fn burst_groups(images: &[&FileRecord], window_secs: f64) -> Vec<SemanticGroup> {
    let mut sorted: Vec<&FileRecord> = images.to_vec();
    sorted.sort_by_key(|f| f.created);

    let mut groups = Vec::new();
    let mut run: Vec<&FileRecord> = Vec::new();

    for image in sorted {
        if let Some(prev) = run.last() {
            let gap = (image.created - prev.created).num_milliseconds() as f64 / 1000.0;
            if gap > window_secs {
                close_run(&mut run, &mut groups);
            }
        }
        run.push(image);
    }
    close_run(&mut run, &mut groups);

    groups
}

fn close_run(run: &mut Vec<&FileRecord>, groups: &mut Vec<SemanticGroup>) {
    if run.len() >= 2 {
        let files: Vec<FileRecord> = run.iter().map(|f| (*f).clone()).collect();
        let recommendation = best_quality_image(&files);
        groups.push(SemanticGroup::new(
            GroupType::BurstPhotos,
            files,
            BURST_SCORE,
            recommendation,
        ));
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use siftdupe_core::FileId;

    fn shot(id: u64, offset_ms: i64) -> FileRecord {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        FileRecord::new(
            FileId::new(id),
            format!("/photos/IMG_{id:04}.jpg"),
            1000 + id,
            base + Duration::milliseconds(offset_ms),
        )
    }

    #[test]
    fn test_window_is_measured_between_neighbors() {
        let files = [shot(1, 0), shot(2, 1500), shot(3, 3000), shot(4, 4500)];
        let refs: Vec<_> = files.iter().collect();
        let groups = burst_groups(&refs, 2.0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 4);
    }

    #[test]
    fn test_exact_window_is_inclusive() {
        let files = [shot(1, 0), shot(2, 2000)];
        let refs: Vec<_> = files.iter().collect();
        assert_eq!(burst_groups(&refs, 2.0).len(), 1);
    }

    #[test]
    fn test_unsorted_input_and_two_runs() {
        let files = [shot(3, 10_000), shot(1, 0), shot(4, 10_500), shot(2, 900)];
        let refs: Vec<_> = files.iter().collect();
        let groups = burst_groups(&refs, 2.0);

        let ids: Vec<Vec<u64>> = groups
            .iter()
            .map(|g| g.files.iter().map(|f| f.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 2], vec![3, 4]]);
        assert!(groups.iter().all(|g| g.similarity == 0.95));
    }

    #[test]
    fn test_lone_image_is_not_a_burst() {
        let files = [shot(1, 0)];
        let refs: Vec<_> = files.iter().collect();
        assert!(burst_groups(&refs, 2.0).is_empty());
        assert!(burst_groups(&[], 2.0).is_empty());
    }
}
