//! Detection orchestration: exact grouping, enrichment, strategies, merge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use siftdupe_core::{FileKind, FileRecord, ImageFingerprinter, TextExtractor};

use crate::config::DetectionConfig;
use crate::error::DetectError;
use crate::exact::{ExactConfig, ExactDuplicateGroup, ExactDuplicateGrouper};
use crate::group::SemanticGroup;
use crate::merge::GroupMerger;
use crate::strategies::{
    StrategyKind, burst_groups, document_groups, near_identical_groups,
    resolution_variant_groups,
};

/// Stage of a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPhase {
    ExactGrouping,
    /// Computing missing fingerprints, dimensions and text.
    Enriching,
    Strategy(StrategyKind),
    Merging,
    Done,
}

/// Progress information during detection.
#[derive(Debug, Clone)]
pub struct DetectionProgress {
    pub phase: DetectionPhase,
    /// Files enriched so far (enrichment phase only).
    pub files_processed: u64,
    pub files_total: u64,
    /// Groups proposed so far.
    pub groups_found: u64,
}

/// Results of one detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Byte-identical groups, largest savings first.
    pub exact_groups: Vec<ExactDuplicateGroup>,

    /// Disjoint semantic groups, largest savings first, numbered from 1.
    pub semantic_groups: Vec<SemanticGroup>,

    /// Number of records examined.
    pub files_analyzed: u64,

    /// Bytes reclaimable by removing every exact copy but the keeper.
    pub exact_savings: u64,

    /// Bytes reclaimable across semantic groups (all but the largest
    /// member of each).
    pub semantic_savings: u64,

    /// Wall time of the run.
    pub duration: Duration,
}

impl DetectionReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.exact_groups.is_empty() || !self.semantic_groups.is_empty()
    }

    /// Exact groups expressed as semantic groups, numbered after the
    /// semantic ones, so both kinds resolve the same way.
    pub fn exact_as_semantic(&self) -> Vec<SemanticGroup> {
        let offset = self.semantic_groups.len() as u32;
        self.exact_groups
            .iter()
            .enumerate()
            .map(|(idx, group)| {
                let mut semantic = SemanticGroup::from_exact(group);
                semantic.id.0 = offset + idx as u32 + 1;
                semantic
            })
            .collect()
    }
}

/// Releases the single-run flag when dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, DetectError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| DetectError::ScanAlreadyInProgress)
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Finds exact and semantic duplicates among file records.
///
/// One run at a time per detector; a concurrent [`detect`](Self::detect)
/// fails with [`DetectError::ScanAlreadyInProgress`].
pub struct DuplicateDetector {
    config: DetectionConfig,
    fingerprinter: Option<Arc<dyn ImageFingerprinter>>,
    text_extractor: Option<Arc<dyn TextExtractor>>,
    running: AtomicBool,
    progress_tx: broadcast::Sender<DetectionProgress>,
}

impl DuplicateDetector {
    /// Create a detector with default config and no capabilities.
    ///
    /// Without capabilities only data already present on the records is used.
    pub fn new() -> Self {
        Self::with_config(DetectionConfig::default())
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            fingerprinter: None,
            text_extractor: None,
            running: AtomicBool::new(false),
            progress_tx,
        }
    }

    /// Compute missing fingerprints and dimensions with `fingerprinter`.
    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn ImageFingerprinter>) -> Self {
        self.fingerprinter = Some(fingerprinter);
        self
    }

    /// Extract missing document text with `extractor`.
    pub fn with_text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.text_extractor = Some(extractor);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Subscribe to detection progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<DetectionProgress> {
        self.progress_tx.subscribe()
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Find duplicates among `records`.
    ///
    /// The records are not modified; enrichment works on copies. Partial
    /// results are discarded on cancellation.
    pub async fn detect(
        &self,
        records: &[FileRecord],
        cancel: &CancellationToken,
    ) -> Result<DetectionReport, DetectError> {
        let _guard = RunGuard::acquire(&self.running)?;
        let start = Instant::now();
        check_cancel(cancel)?;

        self.report(DetectionPhase::ExactGrouping, 0, 0, 0);
        let exact_groups = ExactDuplicateGrouper::with_config(ExactConfig {
            keep_policy: self.config.keep_policy,
        })
        .group(records);
        debug!(groups = exact_groups.len(), "exact grouping done");

        let semantic_groups = if self.config.semantic {
            self.semantic_groups(records, cancel).await?
        } else {
            Vec::new()
        };

        let exact_savings = exact_groups.iter().map(|g| g.potential_savings()).sum();
        let semantic_savings = semantic_groups.iter().map(|g| g.potential_savings()).sum();
        self.report(
            DetectionPhase::Done,
            0,
            0,
            (exact_groups.len() + semantic_groups.len()) as u64,
        );

        Ok(DetectionReport {
            exact_groups,
            semantic_groups,
            files_analyzed: records.len() as u64,
            exact_savings,
            semantic_savings,
            duration: start.elapsed(),
        })
    }

    async fn semantic_groups(
        &self,
        records: &[FileRecord],
        cancel: &CancellationToken,
    ) -> Result<Vec<SemanticGroup>, DetectError> {
        let mut images: Vec<FileRecord> = Vec::new();
        let mut documents: Vec<FileRecord> = Vec::new();
        for record in records {
            match record.kind() {
                FileKind::Image => images.push(record.clone()),
                FileKind::Document => documents.push(record.clone()),
                FileKind::Other => {}
            }
        }

        self.enrich(&mut images, &mut documents, cancel).await?;

        let image_refs: Vec<&FileRecord> = images.iter().collect();
        let document_refs: Vec<&FileRecord> = documents.iter().collect();

        let mut merger = GroupMerger::new();
        let mut proposed = 0u64;
        for strategy in StrategyKind::ORDER {
            check_cancel(cancel)?;
            self.report(DetectionPhase::Strategy(strategy), 0, 0, proposed);

            let groups = match strategy {
                StrategyKind::BurstPhotos => {
                    burst_groups(&image_refs, self.config.burst_window_secs)
                }
                StrategyKind::NearIdenticalImages => near_identical_groups(
                    &image_refs,
                    self.config.hash_distance_threshold,
                    self.config.cluster_mode,
                ),
                StrategyKind::ResolutionVariants => resolution_variant_groups(&image_refs),
                StrategyKind::Documents => document_groups(
                    &document_refs,
                    self.config.text_similarity_threshold,
                    self.config.cluster_mode,
                ),
            };
            debug!(strategy = %strategy, groups = groups.len(), "strategy done");
            proposed += groups.len() as u64;
            merger.offer_all(groups);
            tokio::task::yield_now().await;
        }

        check_cancel(cancel)?;
        self.report(DetectionPhase::Merging, 0, 0, proposed);
        Ok(merger.finish())
    }

    /// Fill in fingerprints, dimensions and text the records lack.
    ///
    /// Capability calls decode and read files, so they run on the blocking
    /// pool. A file whose content cannot be read keeps its gaps and simply sits
    /// out the strategies that need them.
    async fn enrich(
        &self,
        images: &mut [FileRecord],
        documents: &mut [FileRecord],
        cancel: &CancellationToken,
    ) -> Result<(), DetectError> {
        let total = (images.len() + documents.len()) as u64;
        let yield_every = self.config.yield_every.max(1) as u64;
        let mut processed = 0u64;

        if let Some(fingerprinter) = &self.fingerprinter {
            for image in images.iter_mut() {
                enrich_image(fingerprinter, image).await;
                processed += 1;
                self.pace(processed, total, yield_every, cancel).await?;
            }
        }

        if let Some(extractor) = &self.text_extractor {
            for doc in documents.iter_mut() {
                if doc.text.is_none() && extractor.supports(&doc.extension()) {
                    let extractor = Arc::clone(extractor);
                    let path = doc.path.clone();
                    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&path))
                        .await
                        .map_err(|e| e.to_string())
                        .and_then(|text| text.map_err(|e| e.to_string()));
                    match extracted {
                        Ok(text) => doc.text = Some(text),
                        Err(err) => {
                            warn!(path = %doc.path.display(), error = %err, "text unavailable");
                        }
                    }
                }
                processed += 1;
                self.pace(processed, total, yield_every, cancel).await?;
            }
        }

        Ok(())
    }

    /// Yield to the runtime and check cancellation every `yield_every` files.
    async fn pace(
        &self,
        processed: u64,
        total: u64,
        yield_every: u64,
        cancel: &CancellationToken,
    ) -> Result<(), DetectError> {
        if processed % yield_every == 0 {
            self.report(DetectionPhase::Enriching, processed, total, 0);
            tokio::task::yield_now().await;
            check_cancel(cancel)?;
        }
        Ok(())
    }

    fn report(
        &self,
        phase: DetectionPhase,
        files_processed: u64,
        files_total: u64,
        groups_found: u64,
    ) {
        let _ = self.progress_tx.send(DetectionProgress {
            phase,
            files_processed,
            files_total,
            groups_found,
        });
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill in a missing fingerprint and dimensions for one image.
async fn enrich_image(fingerprinter: &Arc<dyn ImageFingerprinter>, image: &mut FileRecord) {
    let (need_fp, need_dims) = (image.fingerprint.is_none(), image.dimensions.is_none());
    if !need_fp && !need_dims {
        return;
    }

    let fingerprinter = Arc::clone(fingerprinter);
    let path = image.path.clone();
    let decoded = tokio::task::spawn_blocking(move || {
        (
            need_fp.then(|| fingerprinter.fingerprint(&path)),
            need_dims.then(|| fingerprinter.dimensions(&path)),
        )
    })
    .await;
    let (fingerprint, dimensions) = match decoded {
        Ok(pair) => pair,
        Err(err) => {
            warn!(path = %image.path.display(), error = %err, "image analysis aborted");
            return;
        }
    };

    match fingerprint {
        Some(Ok(fp)) => image.fingerprint = Some(fp),
        Some(Err(err)) => {
            warn!(path = %image.path.display(), error = %err, "fingerprint unavailable");
        }
        None => {}
    }
    match dimensions {
        Some(Ok(dims)) => image.dimensions = Some(dims),
        Some(Err(err)) => {
            warn!(path = %image.path.display(), error = %err, "dimensions unavailable");
        }
        None => {}
    }
}

fn check_cancel(cancel: &CancellationToken) -> Result<(), DetectError> {
    if cancel.is_cancelled() {
        Err(DetectError::Cancelled)
    } else {
        Ok(())
    }
}
