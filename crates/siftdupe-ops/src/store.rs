//! Persistence for pending restorable records.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StoreError;
use crate::record::RestorableRecord;

/// Where pending records live between runs.
pub trait RecordStore: Send + Sync {
    /// Load every pending record, oldest first. A store that was never
    /// written holds no records.
    fn load(&self) -> Result<Vec<RestorableRecord>, StoreError>;

    /// Replace the stored records with `records`.
    fn save(&self, records: &[RestorableRecord]) -> Result<(), StoreError>;
}

/// Records kept as a JSON array in one file.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash never leaves a half-written store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/siftdupe/restore.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("siftdupe").join("restore.json"))
    }

    /// A store at [`default_path`](Self::default_path).
    pub fn open_default() -> Result<Self, StoreError> {
        Self::default_path().map(Self::new).ok_or(StoreError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Result<Vec<RestorableRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, records: &[RestorableRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let content = serde_json::to_string_pretty(records).map_err(StoreError::Serialize)?;
        let temp = self.temp_path();
        fs::write(&temp, content).map_err(|e| StoreError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            StoreError::io(&self.path, e)
        })
    }
}

/// Records held in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RestorableRecord>>,
    reject_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_reject_saves(&self, reject: bool) {
        self.reject_saves.store(reject, Ordering::SeqCst);
    }

    /// The records as last saved.
    pub fn snapshot(&self) -> Vec<RestorableRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Vec<RestorableRecord>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, records: &[RestorableRecord]) -> Result<(), StoreError> {
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("memory store is read-only".to_string()));
        }
        let mut stored = self
            .records
            .lock()
            .map_err(|_| StoreError::Rejected("memory store lock poisoned".to_string()))?;
        *stored = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::CapturedMetadata;
    use tempfile::TempDir;

    fn sample() -> RestorableRecord {
        RestorableRecord::new("/keep/a", "/dup/a", CapturedMetadata::default())
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("nested").join("restore.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("nested").join("restore.json"));
        let records = vec![sample(), sample()];

        store.save(&records).unwrap();
        assert_eq!(store.load().unwrap(), records);
        assert!(!store.temp_path().exists());

        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("restore.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_memory_store_rejects_on_demand() {
        let store = MemoryStore::new();
        store.save(&[sample()]).unwrap();

        store.set_reject_saves(true);
        assert!(store.save(&[]).is_err());
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
