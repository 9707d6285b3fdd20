//! Montage rendering for similarity groups.
//!
//! Stacks a group's members vertically on a transparent canvas, centered
//! horizontally with a fixed gap, and downscales the result if it exceeds
//! the maximum width. Written as a PNG beside the copied representative
//! so groups can be inspected without a windowing environment.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// Vertical gap between stacked images, in pixels.
const PADDING: u32 = 10;

/// Errors that can occur while rendering a montage.
#[derive(thiserror::Error, Debug)]
pub enum PreviewError {
    /// None of the group's members could be opened.
    #[error("No renderable images in group")]
    NoRenderableImages,

    /// Encoding or writing the montage failed.
    #[error("Failed to write montage: {0}")]
    Write(#[from] image::ImageError),
}

/// Render a vertical montage of `paths` to `dest` as a PNG.
///
/// Members that fail to open are logged and skipped; the montage is
/// rendered from whatever could be decoded. If the widest member exceeds
/// `max_width`, the finished montage is downscaled to that width with
/// Lanczos3 resampling.
///
/// # Errors
///
/// Returns [`PreviewError::NoRenderableImages`] if every member failed to
/// open, or [`PreviewError::Write`] if the output cannot be written.
pub fn render_montage(paths: &[PathBuf], dest: &Path, max_width: u32) -> Result<(), PreviewError> {
    let mut images: Vec<RgbaImage> = Vec::new();

    for path in paths {
        match image::open(path) {
            Ok(img) => images.push(img.to_rgba8()),
            Err(e) => {
                log::warn!("Skipping {} in preview: {}", path.display(), e);
            }
        }
    }

    if images.is_empty() {
        return Err(PreviewError::NoRenderableImages);
    }

    let canvas_width = images.iter().map(|i| i.width()).max().unwrap_or(1).max(1);
    let canvas_height: u32 = images.iter().map(|i| i.height()).sum::<u32>()
        + PADDING * (images.len() as u32 - 1);

    // RgbaImage::new zero-fills, which is fully transparent
    let mut canvas = RgbaImage::new(canvas_width, canvas_height.max(1));

    let mut y = 0u32;
    for img in &images {
        let x = (canvas_width - img.width()) / 2;
        imageops::overlay(&mut canvas, img, i64::from(x), i64::from(y));
        y += img.height() + PADDING;
    }

    let montage = if canvas_width > max_width {
        let ratio = f64::from(max_width) / f64::from(canvas_width);
        let new_height = ((f64::from(canvas_height) * ratio) as u32).max(1);
        log::debug!(
            "Preview too wide, resizing to {}x{}",
            max_width,
            new_height
        );
        DynamicImage::ImageRgba8(canvas).resize_exact(max_width, new_height, FilterType::Lanczos3)
    } else {
        DynamicImage::ImageRgba8(canvas)
    };

    montage.save(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn save_png(path: &Path, width: u32, height: u32, shade: u8) {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_montage_dimensions() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        save_png(&a, 20, 10, 0);
        save_png(&b, 30, 15, 255);

        let dest = dir.path().join("montage.png");
        render_montage(&[a, b], &dest, 1600).unwrap();

        let montage = image::open(&dest).unwrap();
        // Widest member wide, heights summed plus one gap
        assert_eq!(montage.width(), 30);
        assert_eq!(montage.height(), 10 + PADDING + 15);
    }

    #[test]
    fn test_montage_downscales_wide_input() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("wide.png");
        save_png(&a, 200, 40, 128);

        let dest = dir.path().join("montage.png");
        render_montage(&[a], &dest, 100).unwrap();

        let montage = image::open(&dest).unwrap();
        assert_eq!(montage.width(), 100);
        assert_eq!(montage.height(), 20);
    }

    #[test]
    fn test_montage_skips_unreadable_members() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.png");
        save_png(&good, 12, 12, 10);
        std::fs::write(&bad, b"not an image").unwrap();

        let dest = dir.path().join("montage.png");
        render_montage(&[bad, good], &dest, 1600).unwrap();

        let montage = image::open(&dest).unwrap();
        assert_eq!(montage.width(), 12);
        assert_eq!(montage.height(), 12);
    }

    #[test]
    fn test_montage_all_unreadable() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"nope").unwrap();

        let dest = dir.path().join("montage.png");
        let result = render_montage(&[bad], &dest, 1600);
        assert!(matches!(result, Err(PreviewError::NoRenderableImages)));
    }
}
