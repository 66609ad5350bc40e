//! Reversible deletion of duplicate copies.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ResolveError, StoreError};
use crate::metadata::CapturedMetadata;
use crate::progress::{ResolutionComplete, ResolutionKind};
use crate::record::RestorableRecord;
use crate::store::RecordStore;

/// Deletes redundant copies while remembering how to bring them back.
///
/// A restore copies the bytes of the *kept* file to the deleted path. For
/// exact duplicates that reproduces the deleted file; for near-duplicates it
/// only approximates it.
///
/// Every operation holds the pending-record lock for its whole duration,
/// persistence included.
pub struct SafeResolutionManager {
    store: Arc<dyn RecordStore>,
    pending: Mutex<Vec<RestorableRecord>>,
}

impl SafeResolutionManager {
    /// Create a manager over `store`, loading its pending records.
    pub async fn open(store: Arc<dyn RecordStore>) -> Result<Self, ResolveError> {
        let loader = Arc::clone(&store);
        let records = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| StoreError::Rejected(e.to_string()))??;
        Ok(Self {
            store,
            pending: Mutex::new(records),
        })
    }

    /// Snapshot of pending records, oldest first.
    pub async fn pending(&self) -> Vec<RestorableRecord> {
        self.pending.lock().await.clone()
    }

    /// Delete `files_to_remove`, recording each as restorable from
    /// `kept_file`.
    ///
    /// Refuses the whole batch if `kept_file` does not exist. A path that is
    /// the kept file is skipped with an error entry. Each record is persisted
    /// before its file is removed; if persisting fails, that file and the rest
    /// of the batch are left in place and reported as failures. Cancellation
    /// is checked between files; the files not reached are reported as
    /// cancelled.
    pub async fn delete_safely(
        &self,
        files_to_remove: &[PathBuf],
        kept_file: &Path,
        cancel: &CancellationToken,
    ) -> Result<ResolutionComplete, ResolveError> {
        let mut pending = self.pending.lock().await;

        if !exists(kept_file).await {
            return Err(ResolveError::KeptFileMissing {
                path: kept_file.to_path_buf(),
            });
        }
        let kept_canonical = tokio::fs::canonicalize(kept_file).await.ok();

        let mut complete = ResolutionComplete::new(ResolutionKind::Delete);
        for (idx, path) in files_to_remove.iter().enumerate() {
            if cancel.is_cancelled() {
                for rest in &files_to_remove[idx..] {
                    complete.fail(rest, ResolveError::Cancelled.to_string());
                }
                complete.cancelled = true;
                break;
            }

            let same_file = path == kept_file
                || (kept_canonical.is_some()
                    && tokio::fs::canonicalize(path).await.ok() == kept_canonical);
            if same_file {
                let err = ResolveError::KeptFileInBatch { path: path.clone() };
                complete.fail(path, err.to_string());
                continue;
            }

            if !exists(path).await {
                let err = io::Error::from(io::ErrorKind::NotFound);
                complete.fail(path, ResolveError::io(path, err).to_string());
                continue;
            }

            let target = path.clone();
            let (metadata, size) = blocking(move || {
                let size = fs::symlink_metadata(&target).map(|m| m.len()).unwrap_or(0);
                Ok((CapturedMetadata::capture(&target), size))
            })
            .await
            .unwrap_or_default();

            // the record is on disk before the file goes away
            let record = RestorableRecord::new(kept_file, path, metadata);
            pending.push(record.clone());
            if let Err(err) = self.persist(&pending).await {
                pending.pop();
                warn!(path = %path.display(), error = %err, "could not record deletion, stopping");
                let reason = ResolveError::from(err).to_string();
                for rest in &files_to_remove[idx..] {
                    complete.fail(rest, reason.clone());
                }
                break;
            }

            let target = path.clone();
            match blocking(move || fs::remove_file(&target)).await {
                Ok(()) => {
                    info!(path = %path.display(), kept = %kept_file.display(), "deleted duplicate");
                    complete.bytes_processed += size;
                    complete.records.push(record);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "delete failed");
                    complete.fail(path, ResolveError::io(path, err).to_string());
                    pending.pop();
                    if let Err(err) = self.persist(&pending).await {
                        // a stale record only ever restores onto an occupied path
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "could not drop record of failed delete"
                        );
                    }
                }
            }
        }

        Ok(complete)
    }

    /// Restore the record with `id` by copying its kept file back to the
    /// deleted path.
    ///
    /// Either the file is restored and the record removed and persisted, or
    /// nothing changes.
    pub async fn restore(&self, id: Uuid) -> Result<RestorableRecord, ResolveError> {
        let mut pending = self.pending.lock().await;
        self.restore_locked(&mut pending, id).await
    }

    /// Restore every pending record, oldest first.
    pub async fn restore_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ResolutionComplete, ResolveError> {
        let mut pending = self.pending.lock().await;
        let targets: Vec<(Uuid, PathBuf)> = pending
            .iter()
            .map(|r| (r.id, r.deleted_path.clone()))
            .collect();

        let mut complete = ResolutionComplete::new(ResolutionKind::Restore);
        for (idx, (id, path)) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                for (_, rest) in &targets[idx..] {
                    complete.fail(rest, ResolveError::Cancelled.to_string());
                }
                complete.cancelled = true;
                break;
            }

            match self.restore_locked(&mut pending, *id).await {
                Ok(record) => {
                    complete.bytes_processed += fs::metadata(&record.deleted_path)
                        .map(|m| m.len())
                        .unwrap_or(0);
                    complete.records.push(record);
                }
                Err(err) => complete.fail(path, err.to_string()),
            }
        }

        Ok(complete)
    }

    /// Forget every pending record. Files are not touched.
    ///
    /// Returns how many records were discarded.
    pub async fn clear_all_data(&self) -> Result<usize, ResolveError> {
        let mut pending = self.pending.lock().await;
        let previous = std::mem::take(&mut *pending);

        if let Err(err) = self.persist(&pending).await {
            *pending = previous;
            return Err(err.into());
        }
        info!(count = previous.len(), "cleared restore history");
        Ok(previous.len())
    }

    async fn restore_locked(
        &self,
        pending: &mut Vec<RestorableRecord>,
        id: Uuid,
    ) -> Result<RestorableRecord, ResolveError> {
        let idx = pending
            .iter()
            .position(|r| r.id == id)
            .ok_or(ResolveError::NotFound { id })?;
        let record = pending[idx].clone();

        if !exists(&record.original_path).await {
            return Err(ResolveError::OriginalMissing {
                path: record.original_path.clone(),
            });
        }
        if exists(&record.deleted_path).await {
            return Err(ResolveError::TargetOccupied {
                path: record.deleted_path.clone(),
            });
        }

        let (source, target, metadata) = (
            record.original_path.clone(),
            record.deleted_path.clone(),
            record.metadata.clone(),
        );
        let copied = blocking(move || {
            copy_new(&source, &target)?;
            let failed = metadata.apply(&target);
            Ok(failed)
        })
        .await;

        match copied {
            Ok(failed) if !failed.is_empty() => {
                warn!(
                    path = %record.deleted_path.display(),
                    fields = ?failed,
                    "restored without some metadata"
                );
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ResolveError::TargetOccupied {
                    path: record.deleted_path.clone(),
                });
            }
            Err(err) => return Err(ResolveError::io(&record.deleted_path, err)),
        }

        pending.remove(idx);
        if let Err(err) = self.persist(pending).await {
            pending.insert(idx, record.clone());
            if let Err(cleanup) = tokio::fs::remove_file(&record.deleted_path).await {
                warn!(
                    path = %record.deleted_path.display(),
                    error = %cleanup,
                    "could not roll back restored file"
                );
            }
            return Err(err.into());
        }

        info!(
            path = %record.deleted_path.display(),
            from = %record.original_path.display(),
            "restored file"
        );
        Ok(record)
    }

    async fn persist(&self, records: &[RestorableRecord]) -> Result<(), StoreError> {
        let store = Arc::clone(&self.store);
        let records = records.to_vec();
        tokio::task::spawn_blocking(move || store.save(&records))
            .await
            .map_err(|e| StoreError::Rejected(e.to_string()))?
    }
}

/// Copy `source` to a `target` that must not exist yet, creating parent
/// directories. A partial copy is removed.
fn copy_new(source: &Path, target: &Path) -> io::Result<u64> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut reader = File::open(source)?;
    let mut writer = File::options().write(true).create_new(true).open(target)?;
    io::copy(&mut reader, &mut writer).inspect_err(|_| {
        let _ = fs::remove_file(target);
    })
}

async fn exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(io::Error::other)?
}
