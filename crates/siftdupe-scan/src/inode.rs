//! Inode tracking for hardlink deduplication.

use dashmap::DashSet;
use siftdupe_core::InodeInfo;

/// Tracks seen inodes so hardlinks are recorded once.
///
/// Two links to one inode share their bytes on disk. Reporting them as
/// duplicates would suggest deleting one frees space, which it does not.
#[derive(Debug, Default)]
pub struct InodeTracker {
    seen: DashSet<InodeInfo>,
}

impl InodeTracker {
    /// Create a new inode tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track an inode. Returns `true` if this is the first time seeing it.
    pub fn track(&self, info: InodeInfo) -> bool {
        self.seen.insert(info)
    }

    /// Get the number of unique inodes tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no inodes have been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_new_inode() {
        let tracker = InodeTracker::new();
        let info = InodeInfo::new(12345, 1);

        assert!(tracker.track(info));
        assert!(!tracker.track(info));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_different_devices() {
        let tracker = InodeTracker::new();

        assert!(tracker.track(InodeInfo::new(12345, 1)));
        assert!(tracker.track(InodeInfo::new(12345, 2)));
        assert_eq!(tracker.len(), 2);
    }
}
