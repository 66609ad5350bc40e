//! Filesystem metadata captured before deletion and reapplied on restore.

use std::fs::{self, File, FileTimes};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Metadata of a deleted file. Every field is optional: whatever the
/// platform or the file did not provide is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<DateTime<Utc>>,

    /// Unix permission bits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u32>,
}

impl CapturedMetadata {
    /// Capture what is available for `path`. Never fails.
    pub fn capture(path: &Path) -> Self {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "metadata capture failed");
                return Self::default();
            }
        };

        let mut captured = Self {
            creation_date: meta.created().ok().map(DateTime::<Utc>::from),
            modification_date: meta.modified().ok().map(DateTime::<Utc>::from),
            ..Self::default()
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            captured.permissions = Some(meta.mode() & 0o7777);
            captured.owner_id = Some(meta.uid());
            captured.group_id = Some(meta.gid());
        }

        captured
    }

    /// Reapply the captured fields to `path`, one by one.
    ///
    /// Returns the names of the fields that could not be applied. Creation
    /// time is not settable through std and is never reapplied.
    pub fn apply(&self, path: &Path) -> Vec<&'static str> {
        let mut failed = Vec::new();

        if let Some(modified) = self.modification_date {
            let times = FileTimes::new().set_modified(modified.into());
            let result = File::open(path).and_then(|file| file.set_times(times));
            if let Err(err) = result {
                warn!(path = %path.display(), error = %err, "could not restore modification time");
                failed.push("modificationDate");
            }
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            if self.owner_id.is_some() || self.group_id.is_some() {
                // usually needs privileges; expected to fail for ordinary users
                if let Err(err) = std::os::unix::fs::chown(path, self.owner_id, self.group_id) {
                    warn!(path = %path.display(), error = %err, "could not restore ownership");
                    failed.push("owner");
                }
            }

            // after chown, which may clear setuid bits
            if let Some(mode) = self.permissions {
                if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
                    warn!(path = %path.display(), error = %err, "could not restore permissions");
                    failed.push("permissions");
                }
            }
        }

        failed
    }
}
