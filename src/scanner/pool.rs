//! Parallel hashing of cache-miss batches.
//!
//! The worker pool is the only parallel stage of the pipeline. Each unit
//! of work is pure (path in, fingerprint or failure out): workers share
//! no mutable state and never touch the fingerprint cache. The
//! orchestrator alone writes cache rows after the batch completes, which
//! keeps the store single-writer without any locking.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image_hasher::ImageHash;
use rayon::prelude::*;

use crate::progress::ProgressCallback;

use super::{HashError, PerceptualHasher};

/// Configuration for a hashing batch.
#[derive(Clone, Default)]
pub struct PoolConfig {
    /// Number of worker threads. Zero means "use available parallelism".
    pub io_threads: usize,
    /// Optional progress callback, invoked per file.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("io_threads", &self.io_threads)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl PoolConfig {
    /// Set the number of worker threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Compute fingerprints for a batch of paths in parallel.
///
/// Returns one `(path, result)` pair per input path. Output order is
/// unspecified with respect to input order; callers that need a
/// deterministic sequence must re-merge by their own ordering. A decode
/// or read failure for one path yields an `Err` for that path only and
/// never aborts sibling work.
///
/// # Arguments
///
/// * `paths` - Files to fingerprint (the cache misses of a run)
/// * `hasher` - Shared hasher; hashing is pure so no locking is needed
/// * `config` - Thread count and progress reporting
#[must_use]
pub fn compute_batch(
    paths: Vec<PathBuf>,
    hasher: Arc<PerceptualHasher>,
    config: &PoolConfig,
) -> Vec<(PathBuf, Result<ImageHash, HashError>)> {
    if paths.is_empty() {
        log::debug!("Hashing batch is empty, nothing to do");
        return Vec::new();
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("hashing", paths.len());
    }

    log::info!(
        "Computing {} perceptual fingerprints on {} threads",
        paths.len(),
        effective_threads(config.io_threads)
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads)
        .build()
        .unwrap_or_else(|_| {
            log::warn!(
                "Failed to create custom thread pool, using global pool with {} threads",
                rayon::current_num_threads()
            );
            rayon::ThreadPoolBuilder::new().build().unwrap()
        });

    // Shared completion counter so progress counts finished items, not
    // input indices, which workers reach out of order
    let completed = AtomicUsize::new(0);

    let results: Vec<(PathBuf, Result<ImageHash, HashError>)> = pool.install(|| {
        paths
            .into_par_iter()
            .map(|path| {
                let result = hasher.compute_hash(&path);
                match &result {
                    Ok(_) => log::trace!("Fingerprinted {}", path.display()),
                    Err(e) => log::warn!("Failed to fingerprint {}: {}", path.display(), e),
                }

                if let Some(ref callback) = config.progress_callback {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    callback.on_progress(done, path.to_string_lossy().as_ref());
                }

                (path, result)
            })
            .collect()
    });

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("hashing");
    }

    results
}

/// Resolve a thread-count setting to the number of threads actually used.
fn effective_threads(io_threads: usize) -> usize {
    if io_threads > 0 {
        io_threads
    } else {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    }
}
