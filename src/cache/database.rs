//! SQLite-backed fingerprint cache.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image_hasher::ImageHash;
use rusqlite::{params, Connection, OptionalExtension};

use super::CacheEntry;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur against the cache store.
///
/// Only [`CacheError::Open`] is fatal to a run; read and write errors are
/// per-file and degrade to "cache miss" / "not persisted" at the call
/// site.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The cache database could not be created or opened.
    #[error("Failed to open fingerprint cache at {path}: {source}")]
    Open {
        /// Location of the database file
        path: PathBuf,
        /// The underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// A query or statement against the store failed.
    #[error("Cache query failed: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Persistent cache mapping file paths to perceptual fingerprints.
///
/// Backed by a single SQLite table:
///
/// ```sql
/// CREATE TABLE image_hashes (
///     filepath  TEXT PRIMARY KEY,
///     mtime     REAL NOT NULL,
///     hash_size INTEGER NOT NULL,
///     hash_value TEXT NOT NULL
/// )
/// ```
///
/// The store is mutated only by the orchestrating thread (single-writer
/// per run); the internal mutex exists so the handle can be shared
/// behind an `Arc`, not to support concurrent writers.
pub struct FingerprintCache {
    conn: Mutex<Connection>,
}

impl FingerprintCache {
    /// Open or create the fingerprint cache at `path`.
    ///
    /// Schema creation is idempotent; opening an existing database leaves
    /// its rows intact.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Open`] if the database cannot be created or
    /// opened. This is the one fatal error of the system: the pipeline
    /// assumes cache-backed operation.
    pub fn new(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path).map_err(|e| CacheError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS image_hashes (
                filepath   TEXT PRIMARY KEY,
                mtime      REAL NOT NULL,
                hash_size  INTEGER NOT NULL,
                hash_value TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_filepath ON image_hashes (filepath);",
        )
        .map_err(|e| CacheError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        log::debug!("Fingerprint cache ready at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Look up the cached fingerprint for `path` at the given hash size.
    ///
    /// Returns `Some((stored_mtime, fingerprint))` only if a row exists
    /// for the path AND its stored hash size equals `hash_size`. The
    /// caller decides validity by comparing the stored mtime against the
    /// file's live mtime exactly.
    ///
    /// A row whose stored fingerprint fails to parse is treated as no
    /// hit; the next store call overwrites it.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Database`] if the query itself fails.
    pub fn lookup(&self, path: &Path, hash_size: u32) -> CacheResult<Option<(f64, ImageHash)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT mtime, hash_size, hash_value FROM image_hashes WHERE filepath = ?1",
        )?;

        let row: Option<(f64, i64, String)> = stmt
            .query_row(params![path.to_string_lossy()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .optional()?;

        let Some((mtime, stored_size, encoded)) = row else {
            return Ok(None);
        };

        if stored_size != i64::from(hash_size) {
            log::trace!(
                "Cache width mismatch for {} (stored {}, want {})",
                path.display(),
                stored_size,
                hash_size
            );
            return Ok(None);
        }

        match ImageHash::from_base64(&encoded) {
            Ok(fingerprint) => Ok(Some((mtime, fingerprint))),
            Err(e) => {
                log::warn!(
                    "Discarding unparsable cached fingerprint for {}: {:?}",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Upsert the fingerprint row for `path`.
    ///
    /// Replaces any prior entry for the path unconditionally, so at most
    /// one row per path ever exists.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Database`] if the write fails. Callers treat
    /// this as per-file: the in-memory fingerprint is still used for the
    /// current run.
    pub fn store(
        &self,
        path: &Path,
        mtime: f64,
        hash_size: u32,
        fingerprint: &ImageHash,
    ) -> CacheResult<()> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT OR REPLACE INTO image_hashes (filepath, mtime, hash_size, hash_value)
             VALUES (?1, ?2, ?3, ?4)",
        )?;

        stmt.execute(params![
            path.to_string_lossy(),
            mtime,
            i64::from(hash_size),
            fingerprint.to_base64(),
        ])?;

        Ok(())
    }

    /// Fetch the raw row for `path`, regardless of hash size.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Database`] if the query fails.
    pub fn get_entry(&self, path: &Path) -> CacheResult<Option<CacheEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT mtime, hash_size, hash_value FROM image_hashes WHERE filepath = ?1",
        )?;

        let row = stmt
            .query_row(params![path.to_string_lossy()], |row| {
                Ok(CacheEntry::new(
                    path.to_path_buf(),
                    row.get(0)?,
                    row.get::<_, i64>(1)? as u32,
                    row.get(2)?,
                ))
            })
            .optional()?;

        Ok(row)
    }

    /// Number of rows currently stored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Database`] if the query fails.
    pub fn entry_count(&self) -> CacheResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM image_hashes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_hash(byte: u8) -> ImageHash {
        ImageHash::from_bytes(&[byte; 8]).unwrap()
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("cache.db");

        let cache = FingerprintCache::new(&db).unwrap();
        cache
            .store(Path::new("/a.png"), 1.0, 8, &sample_hash(0xAB))
            .unwrap();
        drop(cache);

        // Re-opening must not clobber existing rows
        let cache = FingerprintCache::new(&db).unwrap();
        assert_eq!(cache.entry_count().unwrap(), 1);
    }

    #[test]
    fn test_lookup_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = FingerprintCache::new(&dir.path().join("cache.db")).unwrap();
        let fp = sample_hash(0x5A);

        cache.store(Path::new("/img.png"), 100.0, 8, &fp).unwrap();

        let (mtime, cached) = cache.lookup(Path::new("/img.png"), 8).unwrap().unwrap();
        assert_eq!(mtime, 100.0);
        assert_eq!(cached, fp);
    }

    #[test]
    fn test_lookup_width_mismatch_is_miss() {
        let dir = tempdir().unwrap();
        let cache = FingerprintCache::new(&dir.path().join("cache.db")).unwrap();

        cache
            .store(Path::new("/img.png"), 100.0, 8, &sample_hash(1))
            .unwrap();

        assert!(cache.lookup(Path::new("/img.png"), 16).unwrap().is_none());
    }

    #[test]
    fn test_lookup_unknown_path_is_miss() {
        let dir = tempdir().unwrap();
        let cache = FingerprintCache::new(&dir.path().join("cache.db")).unwrap();
        assert!(cache.lookup(Path::new("/nope.png"), 8).unwrap().is_none());
    }

    #[test]
    fn test_store_upsert_leaves_single_row() {
        let dir = tempdir().unwrap();
        let cache = FingerprintCache::new(&dir.path().join("cache.db")).unwrap();
        let path = Path::new("/img.png");

        cache.store(path, 100.0, 8, &sample_hash(1)).unwrap();
        cache.store(path, 200.0, 8, &sample_hash(2)).unwrap();

        assert_eq!(cache.entry_count().unwrap(), 1);

        let entry = cache.get_entry(path).unwrap().unwrap();
        assert_eq!(entry.mtime, 200.0);
        assert_eq!(entry.fingerprint, sample_hash(2).to_base64());
    }

    #[test]
    fn test_lookup_discards_corrupt_fingerprint() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("cache.db");
        let cache = FingerprintCache::new(&db).unwrap();

        {
            let conn = cache.conn.lock().unwrap();
            conn.execute(
                "INSERT OR REPLACE INTO image_hashes (filepath, mtime, hash_size, hash_value)
                 VALUES (?1, ?2, ?3, ?4)",
                params!["/bad.png", 1.0, 8, "!!! not base64 !!!"],
            )
            .unwrap();
        }

        assert!(cache.lookup(Path::new("/bad.png"), 8).unwrap().is_none());
    }
}
