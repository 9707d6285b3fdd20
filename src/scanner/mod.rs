//! Scanner module for image discovery and perceptual hashing.
//!
//! This module provides functionality for:
//! - Deterministic directory traversal and image discovery
//! - Perceptual fingerprint computation via `image_hasher`
//! - Parallel batch hashing with per-file failure isolation
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and image-file discovery
//! - [`perceptual`]: Perceptual hash computation (aHash/dHash/pHash)
//! - [`pool`]: Parallel hashing of cache-miss batches
//!
//! # Example
//!
//! ```no_run
//! use imgdedupe::scanner::walker::discover_images;
//! use std::path::Path;
//!
//! let (images, skipped) = discover_images(Path::new("photos")).unwrap();
//! for image in &images {
//!     println!("{} (mtime {})", image.path.display(), image.mtime);
//! }
//! eprintln!("{} files skipped due to metadata errors", skipped);
//! ```

pub mod perceptual;
pub mod pool;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use perceptual::{PerceptualAlgorithm, PerceptualHasher};
pub use pool::{compute_batch, PoolConfig};
pub use walker::discover_images;

/// File extensions recognized as images, lowercase without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff"];

/// A discovered image file.
///
/// Carries the path together with the modification time observed at
/// discovery, which is the identity the fingerprint cache validates
/// against.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    /// Absolute path to the image file
    pub path: PathBuf,
    /// Modification time in seconds since the Unix epoch
    pub mtime: f64,
}

impl ImageEntry {
    /// Create a new ImageEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the image file
    /// * `mtime` - Modification time in seconds since the Unix epoch
    #[must_use]
    pub fn new(path: PathBuf, mtime: f64) -> Self {
        Self { path, mtime }
    }
}

/// Check whether a path carries a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Read a file's modification time as fractional seconds since the Unix epoch.
///
/// Files with a modification time before the epoch collapse to 0.0.
///
/// # Errors
///
/// Returns the underlying I/O error if the file's metadata cannot be read.
pub fn file_mtime(path: &Path) -> std::io::Result<f64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0))
}

/// Errors that can occur during image discovery.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while fingerprinting a single file.
///
/// These are always per-file: one unreadable or corrupt image never
/// aborts the batch it belongs to.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// Failed to open or decode the image.
    #[error("Failed to decode {path}: {source}")]
    Decode {
        /// Path of the offending file
        path: PathBuf,
        /// The underlying decode error
        #[source]
        source: image::ImageError,
    },

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
