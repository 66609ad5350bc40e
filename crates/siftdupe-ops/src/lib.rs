//! Reversible deletion for siftdupe.
//!
//! The [`SafeResolutionManager`] deletes redundant copies of a kept file and
//! records, for each one, where it lived and what its metadata was. A record
//! can later be restored by copying the kept file back into place. Records
//! persist through a [`RecordStore`]; [`JsonFileStore`] keeps them in
//! `<data_dir>/siftdupe/restore.json`.
//!
//! Restoration reproduces the *kept* file's bytes. That is exact for
//! byte-identical duplicates and only an approximation for near-duplicates.

mod error;
mod manager;
mod metadata;
mod progress;
mod record;
mod store;

pub use error::{ResolveError, StoreError};
pub use manager::SafeResolutionManager;
pub use metadata::CapturedMetadata;
pub use progress::{ResolutionComplete, ResolutionFailure, ResolutionKind};
pub use record::RestorableRecord;
pub use store::{JsonFileStore, MemoryStore, RecordStore};
