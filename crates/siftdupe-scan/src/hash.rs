//! Full-content BLAKE3 hashing.

use std::path::Path;

use siftdupe_core::ContentHash;

/// Hash the full contents of a file.
///
/// Large files are memory-mapped; small ones are read normally.
pub fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap(path)?;
    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Hash an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash::new(*blake3::hash(bytes).as_bytes())
}
