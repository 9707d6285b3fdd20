//! Perceptual image hashing for similarity detection.
//!
//! This module provides the `PerceptualHasher` which computes fixed-width
//! fingerprints that remain stable under common transformations like
//! resizing, recompression, and slight color shifts. The fingerprint
//! width is `hash_size * hash_size` bits; a run always operates at one
//! fixed width, and fingerprints of differing widths are never compared.

use clap::ValueEnum;
use image_hasher::{HashAlg, HasherConfig, ImageHash};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::HashError;

/// Default edge length of the fingerprint grid (8 -> 64-bit fingerprint).
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// Supported perceptual hashing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum PerceptualAlgorithm {
    /// aHash (Average Hash) - Mean-based, fast. The historical default.
    #[default]
    Ahash,
    /// dHash (Difference Hash) - Gradient-based, very fast and effective.
    Dhash,
    /// pHash (Perceptual Hash) - DCT-based, most resilient to transformations.
    Phash,
}

impl PerceptualAlgorithm {
    /// Get the default similarity threshold (Hamming distance) for this
    /// algorithm at the default hash size.
    pub fn default_threshold(&self) -> u32 {
        match self {
            Self::Ahash => 10,
            Self::Dhash => 4,
            Self::Phash => 10,
        }
    }
}

impl std::fmt::Display for PerceptualAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ahash => write!(f, "aHash"),
            Self::Dhash => write!(f, "dHash"),
            Self::Phash => write!(f, "pHash"),
        }
    }
}

/// Computes perceptual fingerprints for images.
///
/// The hasher is cheap to share: workers hold it behind an `Arc` and call
/// [`PerceptualHasher::compute_hash`] concurrently, since hashing is pure.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
    algorithm: PerceptualAlgorithm,
    hash_size: u32,
}

impl PerceptualHasher {
    /// Create a new `PerceptualHasher`.
    ///
    /// # Arguments
    ///
    /// * `algorithm` - Which perceptual hash family to use
    /// * `hash_size` - Edge length of the hash grid; the fingerprint is
    ///   `hash_size * hash_size` bits wide
    #[must_use]
    pub fn new(algorithm: PerceptualAlgorithm, hash_size: u32) -> Self {
        let mut config = HasherConfig::new().hash_size(hash_size, hash_size);

        match algorithm {
            PerceptualAlgorithm::Ahash => {
                config = config.hash_alg(HashAlg::Mean);
            }
            PerceptualAlgorithm::Dhash => {
                config = config.hash_alg(HashAlg::Gradient);
            }
            PerceptualAlgorithm::Phash => {
                config = config.hash_alg(HashAlg::Median).preproc_dct();
            }
        }

        Self {
            hasher: config.to_hasher(),
            algorithm,
            hash_size,
        }
    }

    /// Compute the perceptual fingerprint for the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns `HashError::Decode` if the file cannot be opened or decoded
    /// as an image. The failure concerns this file only.
    pub fn compute_hash<P: AsRef<Path>>(&self, path: P) -> Result<ImageHash, HashError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| HashError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(self.hasher.hash_image(&img))
    }

    /// Get the algorithm used by this hasher.
    pub fn algorithm(&self) -> PerceptualAlgorithm {
        self.algorithm
    }

    /// Get the configured hash size (grid edge length).
    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }

    /// Width of produced fingerprints in bits.
    pub fn fingerprint_bits(&self) -> u32 {
        self.hash_size * self.hash_size
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(PerceptualAlgorithm::Ahash, DEFAULT_HASH_SIZE)
    }
}

/// Hamming distance between two equal-width fingerprints.
///
/// Symmetric, and zero for identical fingerprints. Comparing fingerprints
/// of differing widths is a caller bug; a run operates at one fixed width.
#[must_use]
pub fn hamming_distance(a: &ImageHash, b: &ImageHash) -> u32 {
    a.dist(b)
}
