//! JWalk-based parallel directory scanner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, UNIX_EPOCH};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use chrono::{DateTime, Utc};
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use siftdupe_core::{
    FileId, FileKind, FileRecord, ImageFingerprinter, InodeInfo, ScanConfig, ScanError,
    ScanWarning, TextExtractor, WarningKind,
};

use crate::content::{AverageHashFingerprinter, PlainTextExtractor};
use crate::hash::hash_file;
use crate::inode::InodeTracker;
use crate::progress::{ScanPhase, ScanProgress};

/// How often (in files) progress is broadcast.
const PROGRESS_INTERVAL: u64 = 1000;

/// Result of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Root that was scanned (canonicalized).
    pub root: PathBuf,
    /// One record per regular file, in walk order.
    pub records: Vec<FileRecord>,
    /// Non-fatal problems; affected files miss the data that failed.
    pub warnings: Vec<ScanWarning>,
    /// Sum of all record sizes.
    pub total_size: u64,
    /// Additional hardlinks to already-recorded inodes that were left out.
    pub hardlinks_skipped: u64,
    /// Wall-clock duration of the scan.
    pub scan_duration: Duration,
}

/// High-performance scanner using jwalk for parallel traversal.
pub struct JwalkScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
    fingerprinter: Arc<dyn ImageFingerprinter>,
    text_extractor: Arc<dyn TextExtractor>,
}

impl JwalkScanner {
    /// Create a scanner with the default content capabilities.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            fingerprinter: Arc::new(AverageHashFingerprinter::new()),
            text_extractor: Arc::new(PlainTextExtractor::new()),
        }
    }

    /// Replace the image fingerprinting capability.
    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn ImageFingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Replace the text extraction capability.
    pub fn with_text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.text_extractor = extractor;
        self
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Perform a scan of the given path.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let mut warnings = Vec::new();
        let mut hardlinks_skipped = 0;
        let mut records = self.collect_records(
            config,
            &root_path,
            start,
            &mut warnings,
            &mut hardlinks_skipped,
        )?;

        if config.compute_hashes {
            warnings.extend(self.hash_records(&mut records, start));
        }
        if config.analyze_content {
            warnings.extend(self.analyze_records(&mut records, start));
        }

        let total_size = records.iter().map(|r| r.size).sum();
        let scan_duration = start.elapsed();

        let _ = self.progress_tx.send(ScanProgress {
            phase: ScanPhase::Done,
            files_found: records.len() as u64,
            bytes_found: total_size,
            files_processed: records.len() as u64,
            files_total: records.len() as u64,
            current_path: root_path.clone(),
            elapsed: scan_duration,
        });

        debug!(
            files = records.len(),
            warnings = warnings.len(),
            hardlinks_skipped,
            elapsed_ms = scan_duration.as_millis() as u64,
            "scan complete"
        );

        Ok(ScanOutcome {
            root: root_path,
            records,
            warnings,
            total_size,
            hardlinks_skipped,
            scan_duration,
        })
    }

    /// Walk the tree and build one record per regular file.
    fn collect_records(
        &self,
        config: &ScanConfig,
        root_path: &Path,
        start: Instant,
        warnings: &mut Vec<ScanWarning>,
        hardlinks_skipped: &mut u64,
    ) -> Result<Vec<FileRecord>, ScanError> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let matcher = config.ignore_matcher()?;
        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .sort(true)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                // Pruning here keeps jwalk from descending into ignored directories.
                children.retain(|entry| {
                    entry
                        .as_ref()
                        .map(|e| !matcher.is_match(e.file_name()))
                        .unwrap_or(true)
                });
            });

        let inode_tracker = InodeTracker::new();
        let mut records = Vec::new();
        let mut bytes_found: u64 = 0;

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    warnings.push(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    continue;
                }
            };

            let size = metadata.len();
            if size < config.min_size {
                continue;
            }

            if get_nlink(&metadata) > 1
                && !inode_tracker.track(InodeInfo::new(get_ino(&metadata), get_dev(&metadata)))
            {
                *hardlinks_skipped += 1;
                continue;
            }

            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(UNIX_EPOCH);

            let id = FileId::new(records.len() as u64);
            records.push(FileRecord::new(id, path, size, DateTime::<Utc>::from(created)));
            bytes_found += size;

            if records.len() as u64 % PROGRESS_INTERVAL == 0 {
                let _ = self.progress_tx.send(ScanProgress {
                    phase: ScanPhase::Walking,
                    files_found: records.len() as u64,
                    bytes_found,
                    files_processed: 0,
                    files_total: 0,
                    current_path: entry.path(),
                    elapsed: start.elapsed(),
                });
            }
        }

        Ok(records)
    }

    /// Hash every file whose size is shared with another file.
    ///
    /// A file with a unique size cannot have an exact duplicate, so its
    /// hash is never needed.
    fn hash_records(&self, records: &mut [FileRecord], start: Instant) -> Vec<ScanWarning> {
        let mut size_counts: HashMap<u64, usize> = HashMap::new();
        for record in records.iter() {
            *size_counts.entry(record.size).or_default() += 1;
        }

        let files_total = records
            .iter()
            .filter(|r| size_counts[&r.size] > 1)
            .count() as u64;
        let processed = AtomicU64::new(0);

        records
            .par_iter_mut()
            .filter(|r| size_counts[&r.size] > 1)
            .filter_map(|record| {
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_INTERVAL == 0 {
                    let _ = self.progress_tx.send(ScanProgress {
                        phase: ScanPhase::Hashing,
                        files_found: 0,
                        bytes_found: 0,
                        files_processed: done,
                        files_total,
                        current_path: record.path.clone(),
                        elapsed: start.elapsed(),
                    });
                }

                match hash_file(&record.path) {
                    Ok(hash) => {
                        record.content_hash = Some(hash);
                        None
                    }
                    Err(err) => {
                        warn!(
                            path = %record.path.display(),
                            error = %err,
                            "hash failed, skipping file"
                        );
                        Some(ScanWarning::hash_failed(&record.path, &err))
                    }
                }
            })
            .collect()
    }

    /// Fill in fingerprints, dimensions and text where the capabilities apply.
    fn analyze_records(&self, records: &mut [FileRecord], start: Instant) -> Vec<ScanWarning> {
        let files_total = records.len() as u64;
        let processed = AtomicU64::new(0);

        records
            .par_iter_mut()
            .flat_map_iter(|record| {
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_INTERVAL == 0 {
                    let _ = self.progress_tx.send(ScanProgress {
                        phase: ScanPhase::Analyzing,
                        files_found: 0,
                        bytes_found: 0,
                        files_processed: done,
                        files_total,
                        current_path: record.path.clone(),
                        elapsed: start.elapsed(),
                    });
                }
                self.analyze_record(record)
            })
            .collect()
    }

    fn analyze_record(&self, record: &mut FileRecord) -> Vec<ScanWarning> {
        let mut warnings = Vec::new();
        match record.kind() {
            FileKind::Image => {
                match self.fingerprinter.dimensions(&record.path) {
                    Ok(dims) => record.dimensions = Some(dims),
                    Err(err) => warnings.push(ScanWarning::content_unavailable(&record.path, err)),
                }
                match self.fingerprinter.fingerprint(&record.path) {
                    Ok(fp) => record.fingerprint = Some(fp),
                    Err(err) => warnings.push(ScanWarning::content_unavailable(&record.path, err)),
                }
            }
            FileKind::Document if self.text_extractor.supports(&record.extension()) => {
                match self.text_extractor.extract(&record.path) {
                    Ok(text) => record.text = Some(text),
                    Err(err) => warnings.push(ScanWarning::content_unavailable(&record.path, err)),
                }
            }
            _ => {}
        }
        warnings
    }
}

impl Default for JwalkScanner {
    fn default() -> Self {
        Self::new()
    }
}

// Cross-platform metadata helpers

/// Get the device ID from metadata.
#[cfg(unix)]
fn get_dev(metadata: &std::fs::Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
fn get_dev(_metadata: &std::fs::Metadata) -> u64 {
    0
}

/// Get the inode number from metadata.
#[cfg(unix)]
fn get_ino(metadata: &std::fs::Metadata) -> u64 {
    metadata.ino()
}

#[cfg(not(unix))]
fn get_ino(_metadata: &std::fs::Metadata) -> u64 {
    0
}

/// Get the number of hard links from metadata.
#[cfg(unix)]
fn get_nlink(metadata: &std::fs::Metadata) -> u64 {
    metadata.nlink()
}

#[cfg(not(unix))]
fn get_nlink(_metadata: &std::fs::Metadata) -> u64 {
    1
}
