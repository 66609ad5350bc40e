use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use chrono::{DateTime, Duration, TimeZone, Utc};
use siftdupe_analyze::strategies::StrategyKind;
use siftdupe_analyze::{
    ClusterMode, DetectError, DetectionConfig, DetectionPhase, DuplicateDetector,
    ExactDuplicateGrouper, GroupType, KeepPolicy, Recommendation, SimilarityBand,
    hamming_distance,
};
use siftdupe_core::{
    ContentError, ContentHash, Dimensions, FileId, FileRecord, Fingerprint, ImageFingerprinter,
    TextExtractor,
};
use tokio_util::sync::CancellationToken;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 14, 10, 0, 0).unwrap()
}

fn record(id: u64, path: &str, size: u64, offset_ms: i64) -> FileRecord {
    FileRecord::new(
        FileId::new(id),
        path,
        size,
        base_time() + Duration::milliseconds(offset_ms),
    )
}

/// Fingerprinter that answers from a fixed table and counts calls.
struct StubFingerprinter {
    calls: AtomicUsize,
}

impl StubFingerprinter {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl ImageFingerprinter for StubFingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match path.file_stem().and_then(|s| s.to_str()) {
            Some("broken") => Err(ContentError::Decode {
                path: path.to_path_buf(),
                message: "truncated".to_string(),
            }),
            _ => Ok(Fingerprint::new("00000000000000ff").unwrap()),
        }
    }

    fn dimensions(&self, _path: &Path) -> Result<Dimensions, ContentError> {
        Ok(Dimensions::new(640, 480))
    }
}

/// Fingerprinter that remembers which threads it was called on.
#[derive(Default)]
struct ThreadRecorder {
    threads: Mutex<Vec<ThreadId>>,
}

impl ImageFingerprinter for ThreadRecorder {
    fn fingerprint(&self, _path: &Path) -> Result<Fingerprint, ContentError> {
        self.threads.lock().unwrap().push(thread::current().id());
        Ok(Fingerprint::new("0000000000000000").unwrap())
    }

    fn dimensions(&self, _path: &Path) -> Result<Dimensions, ContentError> {
        self.threads.lock().unwrap().push(thread::current().id());
        Ok(Dimensions::new(64, 64))
    }
}

struct StubExtractor;

impl TextExtractor for StubExtractor {
    fn supports(&self, extension: &str) -> bool {
        extension == "txt"
    }

    fn extract(&self, _path: &Path) -> Result<String, ContentError> {
        Ok("minutes of the weekly planning meeting".to_string())
    }
}

// ==================== Exact grouping ====================

#[test]
fn test_five_copies_form_one_group() {
    let hash = ContentHash::new([0x42; 32]);
    let records: Vec<_> = (1..=5)
        .map(|i| record(i, &format!("/data/copy{i}.bin"), 1000, 0).with_hash(hash))
        .collect();

    let groups = ExactDuplicateGrouper::new().group(&records);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count(), 5);
    assert_eq!(groups[0].duplicate_count(), 4);
    assert_eq!(groups[0].potential_savings(), 4000);
    assert_eq!(groups[0].keep_policy, KeepPolicy::FirstEncountered);
}

#[test]
fn test_exact_groups_sorted_by_savings() {
    let small = ContentHash::new([1; 32]);
    let large = ContentHash::new([2; 32]);
    let records = vec![
        record(1, "/a/small1", 10, 0).with_hash(small),
        record(2, "/a/small2", 10, 0).with_hash(small),
        record(3, "/a/large1", 900, 0).with_hash(large),
        record(4, "/a/large2", 900, 0).with_hash(large),
        record(5, "/a/unique", 900, 0).with_hash(ContentHash::new([3; 32])),
    ];

    let groups = ExactDuplicateGrouper::new().group(&records);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].hash, large);
    assert_eq!(groups[1].hash, small);
    for group in &groups {
        assert!(group.count() >= 2);
        let rest: u64 = group.files[1..].iter().map(|f| f.size).sum();
        assert_eq!(group.potential_savings(), rest);
    }
}

// ==================== Fingerprints ====================

#[test]
fn test_distance_bands() {
    let base = "0000000000000000";
    let three = "0000000000000007";
    let eight = "00000000000000ff";
    let fifteen = "0000000000007fff";

    assert_eq!(
        SimilarityBand::classify(hamming_distance(base, three).unwrap()),
        SimilarityBand::NearIdentical
    );
    assert_eq!(
        SimilarityBand::classify(hamming_distance(base, eight).unwrap()),
        SimilarityBand::Similar
    );
    assert_eq!(
        SimilarityBand::classify(hamming_distance(base, fifteen).unwrap()),
        SimilarityBand::Different
    );
    assert!(hamming_distance(base, "00").is_err());
}

// ==================== Detection ====================

#[tokio::test]
async fn test_burst_of_three() {
    let records = vec![
        record(1, "/p/IMG_1.jpg", 100, 0),
        record(2, "/p/IMG_2.jpg", 300, 500),
        record(3, "/p/IMG_3.jpg", 200, 1900),
        record(4, "/p/IMG_4.jpg", 100, 5000),
    ];

    let report = DuplicateDetector::new()
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.semantic_groups.len(), 1);
    let group = &report.semantic_groups[0];
    assert_eq!(group.group_type, GroupType::BurstPhotos);
    assert_eq!(group.files.len(), 3);
    assert_eq!(group.similarity, 0.95);
    assert_eq!(
        group.recommendation,
        Recommendation::KeepLargest { keep: FileId::new(2) }
    );
    assert_eq!(group.id.0, 1);
}

#[tokio::test]
async fn test_report_versions_group() {
    let records = vec![
        record(1, "/docs/report_v1.docx", 100, 0),
        record(2, "/docs/report_v2.docx", 100, 60_000),
        record(3, "/docs/report_final.docx", 100, 120_000),
    ];

    let report = DuplicateDetector::new()
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.semantic_groups.len(), 1);
    let group = &report.semantic_groups[0];
    assert_eq!(group.group_type, GroupType::DocumentVersions);
    assert_eq!(group.files.len(), 3);
    assert_eq!(
        group.recommendation,
        Recommendation::ArchiveOlderVersions {
            keep: FileId::new(3),
            archive: vec![FileId::new(1), FileId::new(2)],
        }
    );
}

#[tokio::test]
async fn test_burst_wins_over_near_identical() {
    // Same fingerprint and taken together: both strategies propose {1, 2};
    // the burst strategy runs first.
    let fp = Fingerprint::new("ffff0000ffff0000").unwrap();
    let records = vec![
        record(1, "/p/a.jpg", 100, 0).with_fingerprint(fp.clone()),
        record(2, "/p/b.jpg", 100, 1000).with_fingerprint(fp.clone()),
        record(3, "/p/c.jpg", 100, 60_000).with_fingerprint(fp),
    ];

    let report = DuplicateDetector::new()
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.semantic_groups.len(), 1);
    assert_eq!(report.semantic_groups[0].group_type, GroupType::BurstPhotos);
    assert_eq!(report.semantic_groups[0].file_ids(), vec![FileId::new(1), FileId::new(2)]);
    for group in &report.semantic_groups {
        assert!(group.is_well_formed());
    }
}

#[tokio::test]
async fn test_exact_only_skips_semantic() {
    let config = DetectionConfig::builder().semantic(false).build().unwrap();
    let hash = ContentHash::new([9; 32]);
    let records = vec![
        record(1, "/p/a.jpg", 100, 0).with_hash(hash),
        record(2, "/p/b.jpg", 100, 100).with_hash(hash),
    ];

    let report = DuplicateDetector::with_config(config)
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.exact_groups.len(), 1);
    assert!(report.semantic_groups.is_empty());
    assert_eq!(report.exact_savings, 100);

    let resolvable = report.exact_as_semantic();
    assert_eq!(resolvable.len(), 1);
    assert_eq!(resolvable[0].group_type, GroupType::ExactDuplicates);
    assert_eq!(resolvable[0].removal_candidates().len(), 1);
}

#[tokio::test]
async fn test_enrichment_only_fills_gaps() {
    let stub = Arc::new(StubFingerprinter::new());
    let config = DetectionConfig::builder()
        .burst_window_secs(0.001)
        .cluster_mode(ClusterMode::Connected)
        .build()
        .unwrap();
    let detector = DuplicateDetector::with_config(config).with_fingerprinter(stub.clone());

    let records = vec![
        record(1, "/p/one.png", 100, 0),
        record(2, "/p/two.png", 100, 10_000),
        record(3, "/p/broken.png", 100, 20_000),
        record(4, "/p/four.png", 100, 30_000)
            .with_fingerprint(Fingerprint::new("00000000000000fe").unwrap()),
    ];

    let report = detector
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    // records 1-3 lacked a fingerprint; record 4 already had one
    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.semantic_groups.len(), 1);
    assert_eq!(report.semantic_groups[0].group_type, GroupType::NearIdenticalImages);
    assert_eq!(
        report.semantic_groups[0].file_ids(),
        vec![FileId::new(1), FileId::new(2), FileId::new(4)]
    );
    // the caller's records are untouched
    assert!(records[0].fingerprint.is_none());
}

#[tokio::test]
async fn test_capabilities_run_off_the_async_thread() {
    let recorder = Arc::new(ThreadRecorder::default());
    let detector = DuplicateDetector::new().with_fingerprinter(recorder.clone());
    let records = vec![record(1, "/p/one.png", 100, 0)];

    detector
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    let threads = recorder.threads.lock().unwrap();
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|id| *id != thread::current().id()));
}

#[tokio::test]
async fn test_text_extraction_feeds_content_pass() {
    let detector = DuplicateDetector::new().with_text_extractor(Arc::new(StubExtractor));
    let records = vec![
        record(1, "/docs/monday.txt", 100, 0),
        record(2, "/docs/tuesday.txt", 100, 0),
        record(3, "/docs/slides.pdf", 100, 0),
    ];

    let report = detector
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.semantic_groups.len(), 1);
    assert_eq!(report.semantic_groups[0].group_type, GroupType::SimilarDocuments);
    assert_eq!(report.semantic_groups[0].recommendation, Recommendation::ManualReview);
    assert!(report.semantic_groups[0].removal_candidates().is_empty());
}

#[tokio::test]
async fn test_progress_phases_in_order() {
    let detector = DuplicateDetector::new();
    let mut rx = detector.subscribe();
    let records = vec![
        record(1, "/p/IMG_1.jpg", 100, 0),
        record(2, "/p/IMG_2.jpg", 100, 500),
    ];

    detector
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    let mut phases = Vec::new();
    while let Ok(progress) = rx.try_recv() {
        phases.push(progress.phase);
    }

    let mut expected = vec![DetectionPhase::ExactGrouping];
    expected.extend(StrategyKind::ORDER.map(DetectionPhase::Strategy));
    expected.extend([DetectionPhase::Merging, DetectionPhase::Done]);
    assert_eq!(phases, expected);
}

#[tokio::test]
async fn test_enrichment_reports_progress() {
    let config = DetectionConfig::builder().yield_every(1usize).build().unwrap();
    let detector = DuplicateDetector::with_config(config)
        .with_fingerprinter(Arc::new(StubFingerprinter::new()));
    let mut rx = detector.subscribe();
    let records = vec![
        record(1, "/p/one.png", 100, 0),
        record(2, "/p/two.png", 100, 10_000),
    ];

    detector
        .detect(&records, &CancellationToken::new())
        .await
        .unwrap();

    let enriched: Vec<(u64, u64)> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|p| p.phase == DetectionPhase::Enriching)
        .map(|p| (p.files_processed, p.files_total))
        .collect();
    assert_eq!(enriched, vec![(1, 2), (2, 2)]);
}

#[tokio::test]
async fn test_concurrent_detect_is_rejected() {
    let config = DetectionConfig::builder().yield_every(1usize).build().unwrap();
    let detector = DuplicateDetector::with_config(config)
        .with_fingerprinter(Arc::new(StubFingerprinter::new()));
    let records = vec![
        record(1, "/p/one.png", 100, 0),
        record(2, "/p/two.png", 100, 10_000),
    ];
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(
        detector.detect(&records, &cancel),
        detector.detect(&records, &cancel)
    );

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), DetectError::ScanAlreadyInProgress);

    // released after completion
    assert!(detector.detect(&records, &cancel).await.is_ok());
}

#[tokio::test]
async fn test_cancel_during_enrichment() {
    let config = DetectionConfig::builder().yield_every(1usize).build().unwrap();
    let detector = DuplicateDetector::with_config(config)
        .with_fingerprinter(Arc::new(StubFingerprinter::new()));
    let records = vec![
        record(1, "/p/one.png", 100, 0),
        record(2, "/p/two.png", 100, 10_000),
    ];
    let cancel = CancellationToken::new();

    let (result, ()) = tokio::join!(detector.detect(&records, &cancel), async {
        cancel.cancel();
    });

    assert_eq!(result.unwrap_err(), DetectError::Cancelled);
    assert!(!detector.is_running());
}
