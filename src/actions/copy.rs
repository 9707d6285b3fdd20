//! Copying of group representatives into the output directory.

use std::fs;
use std::io;
use std::path::Path;

use crate::dedupe::SimilarityGroup;

use super::preview::render_montage;

/// Maximum pixel width of rendered preview montages.
const PREVIEW_MAX_WIDTH: u32 = 1600;

/// Statistics for the copy step.
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Representatives copied successfully
    pub copied: usize,
    /// Representatives that failed to copy
    pub failed: usize,
    /// Preview montages written
    pub previews: usize,
}

/// Copy each group's representative into `output_dir`.
///
/// Destinations are named sequentially (`0001.png`, `0002.jpg`, ...) in
/// group output order, keeping the representative's original extension.
/// The counter only advances on successful copies, so the emitted
/// sequence has no gaps. A failed copy is logged and skipped; it does
/// not abort the remaining groups.
///
/// When `with_previews` is set, every group with more than one member
/// additionally gets a `NNNN_preview.png` montage of all its members.
///
/// # Errors
///
/// Returns an error only if the output directory itself cannot be
/// created.
pub fn copy_representatives(
    groups: &[SimilarityGroup],
    output_dir: &Path,
    with_previews: bool,
) -> io::Result<CopyStats> {
    fs::create_dir_all(output_dir)?;

    let mut stats = CopyStats::default();
    let mut counter = 1usize;

    for group in groups {
        let representative = group.representative();
        let ext = representative
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        let dest = output_dir.join(format!("{counter:04}{ext}"));

        match fs::copy(representative, &dest) {
            Ok(_) => {
                log::info!(
                    "Copied: {} -> {}",
                    representative.display(),
                    dest.display()
                );

                if with_previews && group.has_duplicates() {
                    let preview_dest = output_dir.join(format!("{counter:04}_preview.png"));
                    let member_paths: Vec<_> =
                        group.members.iter().map(|m| m.path.clone()).collect();
                    match render_montage(&member_paths, &preview_dest, PREVIEW_MAX_WIDTH) {
                        Ok(()) => {
                            log::info!(
                                "  Preview of {} similar images: {}",
                                group.len(),
                                preview_dest.display()
                            );
                            stats.previews += 1;
                        }
                        Err(e) => {
                            log::warn!(
                                "  Failed to render preview for {}: {}",
                                representative.display(),
                                e
                            );
                        }
                    }
                }

                stats.copied += 1;
                counter += 1;
            }
            Err(e) => {
                log::error!("Error copying {}: {}", representative.display(), e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
