//! Progress reporting utilities using indicatif.
//!
//! The engine reports progress through the [`ProgressCallback`] trait as
//! an observational side effect; it is not part of the functional
//! contract. The [`Progress`] struct implements the trait with terminal
//! progress bars: a spinner while scanning the directory tree and a bar
//! while hashing.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for the grouping pipeline.
///
/// Implement this trait to receive progress updates during discovery and
/// hashing. Methods may be called from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "scanning", "hashing")
    /// * `total` - Total number of items, or 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    scanning: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            scanning: Mutex::new(None),
            hashing: Mutex::new(None),
            quiet,
        }
    }

    fn scanning_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            "scanning" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::scanning_style());
                pb.set_message("Scanning image files");
                pb.enable_steady_tick(Duration::from_millis(100));
                *self.scanning.lock().unwrap() = Some(pb);
            }
            "hashing" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::hashing_style());
                pb.set_message("Hashing");
                *self.hashing.lock().unwrap() = Some(pb);
            }
            _ => {}
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        if let Some(ref pb) = *self.hashing.lock().unwrap() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        } else if let Some(ref pb) = *self.scanning.lock().unwrap() {
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        match phase {
            "scanning" => {
                if let Some(pb) = self.scanning.lock().unwrap().take() {
                    pb.finish_with_message("Scan complete");
                }
            }
            "hashing" => {
                if let Some(pb) = self.hashing.lock().unwrap().take() {
                    pb.finish_with_message("Hashing complete");
                }
            }
            _ => {}
        }
    }
}

/// Truncate a path for display in the progress bar.
///
/// Operates on characters, not bytes, so multibyte file names never
/// split mid-character.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = file_name.chars().skip(name_len - keep).collect();
        return format!("...{tail}");
    }

    format!(".../{}", file_name)
}
