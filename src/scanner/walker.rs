//! Directory traversal and image-file discovery.
//!
//! Discovery order is load-bearing: the clustering stage downstream is
//! order-sensitive, so the walk sorts entries by file name within each
//! directory to produce the same candidate list on every run over an
//! unchanged tree.

use std::path::Path;

use walkdir::WalkDir;

use super::{file_mtime, is_supported_image, ImageEntry, ScanError};

/// Recursively discover image files under `dir`.
///
/// Filters by the supported extension set (case-insensitive) and captures
/// each file's modification time. Returns the entries in deterministic
/// (per-directory name-sorted) order, together with the number of files
/// skipped because their metadata could not be read.
///
/// Unreadable subdirectories are logged and skipped; they do not abort
/// the walk.
///
/// # Errors
///
/// Returns `ScanError::NotFound` or `ScanError::NotADirectory` if `dir`
/// is unusable as a walk root.
pub fn discover_images(dir: &Path) -> Result<(Vec<ImageEntry>, usize), ScanError> {
    if !dir.exists() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry during walk: {}", e);
                skipped += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_supported_image(path) {
            log::trace!("Ignoring non-image file: {}", path.display());
            continue;
        }

        match file_mtime(path) {
            Ok(mtime) => images.push(ImageEntry::new(path.to_path_buf(), mtime)),
            Err(e) => {
                log::warn!("Failed to read metadata for {}: {}", path.display(), e);
                skipped += 1;
            }
        }
    }

    log::debug!(
        "Discovered {} image files under {} ({} skipped)",
        images.len(),
        dir.display(),
        skipped
    );

    Ok((images, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_discover_filters_by_extension() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("b.JPG"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("c.gif"));

        let (images, skipped) = discover_images(dir.path()).unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(skipped, 0);
        assert!(images.iter().all(|e| is_supported_image(&e.path)));
    }

    #[test]
    fn test_discover_recurses_subdirectories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("sub").join("deeper");
        fs::create_dir_all(&nested).unwrap();
        touch(&dir.path().join("top.png"));
        touch(&nested.join("deep.jpeg"));

        let (images, _) = discover_images(dir.path()).unwrap();
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_discover_order_is_deterministic() {
        let dir = tempdir().unwrap();
        // Created out of name order on purpose
        touch(&dir.path().join("zebra.png"));
        touch(&dir.path().join("apple.png"));
        touch(&dir.path().join("mango.png"));

        let (first, _) = discover_images(dir.path()).unwrap();
        let (second, _) = discover_images(dir.path()).unwrap();
        assert_eq!(first, second);

        let names: Vec<_> = first
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["apple.png", "mango.png", "zebra.png"]);
    }

    #[test]
    fn test_discover_missing_root() {
        let result = discover_images(Path::new("/no/such/dir"));
        assert!(matches!(result, Err(ScanError::NotFound(_))));
    }

    #[test]
    fn test_discover_root_is_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.png");
        touch(&file);

        let result = discover_images(&file);
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn test_discover_captures_mtime() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("img.png");
        touch(&file);

        let (images, _) = discover_images(dir.path()).unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].mtime > 0.0);
    }
}
