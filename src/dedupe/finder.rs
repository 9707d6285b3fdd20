//! Orchestration of the hash-cache-and-cluster pipeline.
//!
//! The [`GroupFinder`] drives the complete run:
//!
//! 1. **Discover** - Collect image files in deterministic order
//! 2. **Cache lookup** - Reuse fingerprints whose stored mtime and width
//!    match the live file exactly
//! 3. **Hash** - Fill cache misses through the parallel worker pool
//! 4. **Persist** - Write new fingerprints to the cache (single-threaded,
//!    orchestrator only; workers never touch the store)
//! 5. **Cluster** - Merge cache hits and worker results back into
//!    discovery order and run the greedy grouping pass
//!
//! All per-file failures (unreadable metadata, decode errors, cache read
//! or write errors) are isolated and logged; clustering always runs over
//! whatever fingerprints were obtained. Only a cache that cannot be
//! opened at all is fatal, and that is surfaced where the cache is
//! constructed, before a finder exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image_hasher::ImageHash;

use crate::cache::FingerprintCache;
use crate::progress::ProgressCallback;
use crate::scanner::perceptual::DEFAULT_HASH_SIZE;
use crate::scanner::{
    compute_batch, discover_images, ImageEntry, PerceptualAlgorithm, PerceptualHasher, PoolConfig,
    ScanError,
};

use super::groups::{cluster_fingerprints, SimilarityGroup};

/// Configuration for a grouping run.
#[derive(Clone)]
pub struct FinderConfig {
    /// Maximum hamming distance for two images to share a group
    pub threshold: u32,
    /// Fingerprint grid edge length (width = hash_size^2 bits)
    pub hash_size: u32,
    /// Perceptual hash algorithm to apply
    pub algorithm: PerceptualAlgorithm,
    /// Worker threads for hashing; zero means available parallelism
    pub io_threads: usize,
    /// Optional persistent fingerprint cache
    pub cache: Option<Arc<FingerprintCache>>,
    /// Optional progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threshold", &self.threshold)
            .field("hash_size", &self.hash_size)
            .field("algorithm", &self.algorithm)
            .field("io_threads", &self.io_threads)
            .field("cache", &self.cache.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            threshold: PerceptualAlgorithm::default().default_threshold(),
            hash_size: DEFAULT_HASH_SIZE,
            algorithm: PerceptualAlgorithm::default(),
            io_threads: 0,
            cache: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the similarity threshold (hamming distance).
    #[must_use]
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the fingerprint grid edge length.
    #[must_use]
    pub fn with_hash_size(mut self, hash_size: u32) -> Self {
        self.hash_size = hash_size;
        self
    }

    /// Set the perceptual hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: PerceptualAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Attach a persistent fingerprint cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Statistics about a grouping run.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Image files discovered under the input directory
    pub files_discovered: usize,
    /// Files skipped because their metadata could not be read
    pub metadata_failures: usize,
    /// Fingerprints reused from the cache
    pub cache_hits: usize,
    /// Fingerprints computed this run
    pub hashed_files: usize,
    /// Files whose decode or hash failed
    pub hash_failures: usize,
    /// Fingerprints computed but not persisted due to cache write errors
    pub cache_write_failures: usize,
    /// Similarity groups produced
    pub groups_found: usize,
    /// Non-representative members across all groups
    pub duplicate_files: usize,
    /// Wall-clock duration of the run
    pub scan_duration: std::time::Duration,
}

impl ScanSummary {
    /// Fraction of usable fingerprints served from the cache, 0-100.
    #[must_use]
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.hashed_files;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }

    /// Whether any per-file failure occurred during the run.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.metadata_failures > 0 || self.hash_failures > 0 || self.cache_write_failures > 0
    }
}

/// Errors that can occur while setting up a grouping run.
///
/// Per-file problems never surface here; they are folded into the
/// [`ScanSummary`] instead.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A discovery error occurred.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Finds groups of visually similar images.
///
/// # Example
///
/// ```no_run
/// use imgdedupe::dedupe::{GroupFinder, FinderConfig};
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_threshold(10).with_io_threads(4);
/// let finder = GroupFinder::new(config);
///
/// let (groups, summary) = finder.find_groups(Path::new("photos")).unwrap();
///
/// println!("Found {} groups", summary.groups_found);
/// println!("Cache hit rate: {:.1}%", summary.cache_hit_rate());
/// ```
pub struct GroupFinder {
    config: FinderConfig,
    hasher: Arc<PerceptualHasher>,
}

impl GroupFinder {
    /// Create a new group finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Arc::new(PerceptualHasher::new(config.algorithm, config.hash_size));
        Self { config, hasher }
    }

    /// Create a new group finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Discover images under `dir` and group them by similarity.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if `dir` does not exist or is not a
    /// directory. Per-file failures do not error; see [`ScanSummary`].
    pub fn find_groups(&self, dir: &Path) -> Result<(Vec<SimilarityGroup>, ScanSummary), FinderError> {
        if !dir.exists() {
            return Err(FinderError::PathNotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(FinderError::NotADirectory(dir.to_path_buf()));
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("scanning", 0);
        }

        let (files, metadata_failures) = discover_images(dir)?;

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("scanning");
        }

        log::info!("Found {} image files", files.len());

        let (groups, mut summary) = self.find_groups_in_files(files);
        summary.metadata_failures += metadata_failures;
        Ok((groups, summary))
    }

    /// Group an already-discovered list of images by similarity.
    ///
    /// The order of `files` is semantic: the clustering pass is
    /// order-dependent, and this method guarantees that fingerprints are
    /// fed to it in exactly the order of `files` regardless of how cache
    /// hits and parallel worker results interleave.
    #[must_use]
    pub fn find_groups_in_files(
        &self,
        files: Vec<ImageEntry>,
    ) -> (Vec<SimilarityGroup>, ScanSummary) {
        let start = Instant::now();
        let mut summary = ScanSummary {
            files_discovered: files.len(),
            ..Default::default()
        };

        // Slot per discovered file, filled from cache hits or worker results.
        let mut fingerprints: Vec<Option<ImageHash>> = vec![None; files.len()];
        let mut misses: Vec<(usize, ImageEntry)> = Vec::new();

        for (idx, entry) in files.iter().enumerate() {
            match self.cached_fingerprint(entry) {
                Some(fingerprint) => {
                    summary.cache_hits += 1;
                    fingerprints[idx] = Some(fingerprint);
                }
                None => misses.push((idx, entry.clone())),
            }
        }

        log::debug!(
            "{} cache hits, {} files to hash",
            summary.cache_hits,
            misses.len()
        );

        if !misses.is_empty() {
            let pool_config = PoolConfig {
                io_threads: self.config.io_threads,
                progress_callback: self.config.progress_callback.clone(),
            };
            let paths: Vec<PathBuf> = misses.iter().map(|(_, e)| e.path.clone()).collect();
            let results = compute_batch(paths, self.hasher.clone(), &pool_config);

            // Worker output is unordered; route results back to their
            // discovery slot by path. Each input path appears exactly once.
            let slot_by_path: HashMap<&Path, (usize, f64)> = misses
                .iter()
                .map(|(idx, e)| (e.path.as_path(), (*idx, e.mtime)))
                .collect();

            for (path, result) in results {
                let Some(&(idx, mtime)) = slot_by_path.get(path.as_path()) else {
                    log::warn!("Worker returned unknown path {}", path.display());
                    continue;
                };

                match result {
                    Ok(fingerprint) => {
                        summary.hashed_files += 1;
                        self.persist_fingerprint(&path, mtime, &fingerprint, &mut summary);
                        fingerprints[idx] = Some(fingerprint);
                    }
                    Err(e) => {
                        // Already logged by the pool with the offending path;
                        // count it and keep the slot empty.
                        log::debug!("Excluding {} from clustering: {}", path.display(), e);
                        summary.hash_failures += 1;
                    }
                }
            }
        }

        // Rebuild the combined sequence in original discovery order; the
        // clustering pass below is order-sensitive.
        let entries: Vec<(PathBuf, ImageHash)> = files
            .into_iter()
            .zip(fingerprints)
            .filter_map(|(entry, fp)| fp.map(|fp| (entry.path, fp)))
            .collect();

        let (groups, cluster_stats) = cluster_fingerprints(entries, self.config.threshold);

        summary.groups_found = cluster_stats.groups;
        summary.duplicate_files = cluster_stats.duplicate_files;
        summary.scan_duration = start.elapsed();

        log::info!(
            "Processed {} files (cache hits: {}), {} groups in {:.2?}",
            summary.cache_hits + summary.hashed_files,
            summary.cache_hits,
            summary.groups_found,
            summary.scan_duration
        );

        (groups, summary)
    }

    /// Try the cache for a usable fingerprint.
    ///
    /// A hit requires the stored width to equal the run's hash size and
    /// the stored mtime to equal the live mtime exactly. Read failures
    /// degrade to a miss.
    fn cached_fingerprint(&self, entry: &ImageEntry) -> Option<ImageHash> {
        let cache = self.config.cache.as_ref()?;

        match cache.lookup(&entry.path, self.config.hash_size) {
            Ok(Some((stored_mtime, fingerprint))) if stored_mtime == entry.mtime => {
                log::trace!("Cache hit: {}", entry.path.display());
                Some(fingerprint)
            }
            Ok(Some(_)) => {
                log::trace!("Cache stale (mtime changed): {}", entry.path.display());
                None
            }
            Ok(None) => {
                log::trace!("Cache miss: {}", entry.path.display());
                None
            }
            Err(e) => {
                log::warn!(
                    "Cache read failed for {}, treating as miss: {}",
                    entry.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Persist a freshly computed fingerprint.
    ///
    /// Runs on the orchestrator thread only, after workers have finished;
    /// write failures are counted and the fingerprint is still used for
    /// this run's clustering.
    fn persist_fingerprint(
        &self,
        path: &Path,
        mtime: f64,
        fingerprint: &ImageHash,
        summary: &mut ScanSummary,
    ) {
        let Some(cache) = self.config.cache.as_ref() else {
            return;
        };

        if let Err(e) = cache.store(path, mtime, self.config.hash_size, fingerprint) {
            log::warn!("Failed to update cache for {}: {}", path.display(), e);
            summary.cache_write_failures += 1;
        }
    }
}
