//! Application configuration management.
//!
//! Persisted defaults for the tunable knobs (threshold, hash size,
//! algorithm) so repeat users do not have to pass the same flags every
//! run. CLI flags always win over the file; the file wins over built-in
//! defaults. Loading never fails: any problem falls back to defaults.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scanner::perceptual::{PerceptualAlgorithm, DEFAULT_HASH_SIZE};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default similarity threshold (hamming distance).
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Default fingerprint grid edge length.
    #[serde(default = "default_hash_size")]
    pub hash_size: u32,
    /// Default perceptual hash algorithm.
    #[serde(default)]
    pub algorithm: PerceptualAlgorithm,
}

fn default_threshold() -> u32 {
    10
}

fn default_hash_size() -> u32 {
    DEFAULT_HASH_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            hash_size: default_hash_size(),
            algorithm: PerceptualAlgorithm::default(),
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    ///
    /// Called when the user passes `--save-config` to persist the
    /// effective settings as the new defaults.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "imgdedupe", "imgdedupe")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}

/// Get the default location for the fingerprint cache database.
///
/// # Errors
///
/// Fails only if the platform provides no cache directory at all.
pub fn default_cache_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "imgdedupe", "imgdedupe")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
    Ok(project_dirs.cache_dir().join("fingerprints.db"))
}
