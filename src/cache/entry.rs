//! Cache entry definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single row of the fingerprint cache.
///
/// The path is the unique key; at most one entry exists per path. The
/// stored fingerprint is reusable only when both the modification time
/// and the fingerprint width match the live file and the run exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Path of the fingerprinted file (primary key)
    pub path: PathBuf,
    /// Modification time at hashing, seconds since the Unix epoch
    pub mtime: f64,
    /// Fingerprint grid edge length used at hashing
    pub hash_size: u32,
    /// Fingerprint serialized as base64 text
    pub fingerprint: String,
}

impl CacheEntry {
    /// Create a new cache entry.
    #[must_use]
    pub fn new(path: PathBuf, mtime: f64, hash_size: u32, fingerprint: String) -> Self {
        Self {
            path,
            mtime,
            hash_size,
            fingerprint,
        }
    }

    /// Whether this entry is valid for a file with the given live mtime
    /// and a run at the given hash size.
    ///
    /// Mtime comparison is bit-exact: any drift invalidates the entry.
    #[must_use]
    pub fn is_valid_for(&self, current_mtime: f64, hash_size: u32) -> bool {
        self.mtime == current_mtime && self.hash_size == hash_size
    }
}
