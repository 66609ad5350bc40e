//! Records of deleted files that can be restored.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metadata::CapturedMetadata;

/// A deleted file and the kept file it can be restored from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorableRecord {
    pub id: Uuid,

    /// The kept file whose bytes are copied back on restore.
    pub original_path: PathBuf,

    /// Where the deleted file used to be.
    pub deleted_path: PathBuf,

    pub deleted_at: DateTime<Utc>,

    #[serde(default)]
    pub metadata: CapturedMetadata,
}

impl RestorableRecord {
    /// Create a record with a fresh id, deleted now.
    pub fn new(
        original_path: impl Into<PathBuf>,
        deleted_path: impl Into<PathBuf>,
        metadata: CapturedMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_path: original_path.into(),
            deleted_path: deleted_path.into(),
            deleted_at: Utc::now(),
            metadata,
        }
    }

    /// First eight characters of the id, for display.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}
