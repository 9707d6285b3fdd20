//! imgdedupe - Perceptual Image Deduplicator
//!
//! Finds visually similar images in a directory tree by computing a
//! perceptual fingerprint per image, grouping fingerprints within a
//! hamming-distance threshold, and emitting one representative per
//! group. Fingerprints are cached in SQLite keyed by file path and
//! modification time, so unchanged files are never re-hashed.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::copy_representatives;
use crate::cache::FingerprintCache;
use crate::cli::Cli;
use crate::config::{default_cache_path, Config};
use crate::dedupe::{FinderConfig, GroupFinder};
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};

/// Run the application with the given parsed CLI arguments.
///
/// Returns the exit code the process should terminate with, or an error
/// for fatal conditions (bad input path, cache initialization failure).
///
/// # Errors
///
/// Propagates cache-open failures and input-path validation errors;
/// per-file failures are absorbed into the run summary and reflected in
/// the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let file_config = Config::load();
    let threshold = cli.threshold.unwrap_or(file_config.threshold);
    let hash_size = cli.hash_size.unwrap_or(file_config.hash_size);
    let algorithm = cli.algorithm.unwrap_or(file_config.algorithm);

    if cli.save_config {
        let effective = Config {
            threshold,
            hash_size,
            algorithm,
        };
        match effective.save() {
            Ok(()) => log::info!(
                "Saved defaults: threshold {}, hash size {}, algorithm {}",
                threshold,
                hash_size,
                algorithm
            ),
            Err(e) => log::warn!("Failed to save configuration: {e}"),
        }
    }

    let cache_path = match cli.cache {
        Some(path) => path,
        None => default_cache_path()?,
    };
    if let Some(parent) = cache_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
    }
    // Cache init failure is fatal: the pipeline assumes cache-backed operation
    let cache = Arc::new(FingerprintCache::new(&cache_path)?);

    log::info!("Input directory: {}", cli.input_dir.display());
    log::info!("Output directory: {}", cli.output_dir.display());
    log::info!("Similarity threshold (hamming distance): {}", threshold);
    log::info!("Hash algorithm: {} (size {})", algorithm, hash_size);

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));
    let mut finder_config = FinderConfig::default()
        .with_threshold(threshold)
        .with_hash_size(hash_size)
        .with_algorithm(algorithm)
        .with_cache(cache)
        .with_progress_callback(progress);
    if let Some(threads) = cli.io_threads {
        finder_config = finder_config.with_io_threads(threads);
    }

    let finder = GroupFinder::new(finder_config);
    let (groups, summary) = finder.find_groups(&cli.input_dir)?;

    if summary.files_discovered == 0 {
        log::warn!(
            "No supported image files found under {}",
            cli.input_dir.display()
        );
        return Ok(ExitCode::NoImages);
    }

    let copy_stats = copy_representatives(&groups, &cli.output_dir, cli.preview)?;

    log::info!(
        "Processed {} files (cache hits: {}, {:.1}%)",
        summary.cache_hits + summary.hashed_files,
        summary.cache_hits,
        summary.cache_hit_rate()
    );
    log::info!(
        "Found {} groups ({} images folded into an existing group)",
        summary.groups_found,
        summary.duplicate_files
    );
    log::info!(
        "Copied {} unique images to {}",
        copy_stats.copied,
        cli.output_dir.display()
    );
    if summary.hash_failures > 0 {
        log::warn!("{} files could not be decoded or hashed", summary.hash_failures);
    }
    if summary.metadata_failures > 0 {
        log::warn!("{} files skipped due to metadata errors", summary.metadata_failures);
    }
    if summary.cache_write_failures > 0 {
        log::warn!(
            "{} fingerprints could not be persisted to the cache",
            summary.cache_write_failures
        );
    }

    if summary.has_failures() || copy_stats.failed > 0 {
        Ok(ExitCode::PartialSuccess)
    } else {
        Ok(ExitCode::Success)
    }
}
