//! End-to-end tests of the cache-and-cluster pipeline over real images.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use imgdedupe::actions::copy_representatives;
use imgdedupe::cache::FingerprintCache;
use imgdedupe::dedupe::{FinderConfig, GroupFinder};
use tempfile::tempdir;

/// A flat mid-gray image. All uniform images share one aHash, so copies
/// and near-copies of this land in the same group.
fn save_uniform(path: &Path) {
    let img = image::RgbImage::from_pixel(32, 32, image::Rgb([128, 128, 128]));
    img.save(path).unwrap();
}

/// A half-black, half-white image, structurally far from any uniform
/// image (roughly half the fingerprint bits differ).
fn save_split(path: &Path) {
    let img = image::RgbImage::from_fn(32, 32, |x, _| {
        if x < 16 {
            image::Rgb([0, 0, 0])
        } else {
            image::Rgb([255, 255, 255])
        }
    });
    img.save(path).unwrap();
}

fn cached_finder(cache: &Arc<FingerprintCache>) -> GroupFinder {
    GroupFinder::new(
        FinderConfig::default()
            .with_io_threads(2)
            .with_cache(cache.clone()),
    )
}

#[test]
fn test_similar_images_grouped_distinct_images_split() {
    let dir = tempdir().unwrap();
    save_uniform(&dir.path().join("a_flat.png"));
    save_uniform(&dir.path().join("b_flat_copy.png"));
    save_split(&dir.path().join("c_split.png"));

    let finder = GroupFinder::new(FinderConfig::default().with_io_threads(1));
    let (groups, summary) = finder.find_groups(dir.path()).unwrap();

    assert_eq!(summary.files_discovered, 3);
    assert_eq!(groups.len(), 2);

    let flat_group = groups
        .iter()
        .find(|g| g.representative().ends_with("a_flat.png"))
        .expect("flat group present");
    assert_eq!(flat_group.len(), 2);
    assert_eq!(flat_group.members[0].distance, 0);

    let split_group = groups
        .iter()
        .find(|g| g.representative().ends_with("c_split.png"))
        .expect("split group present");
    assert_eq!(split_group.len(), 1);
}

#[test]
fn test_second_run_is_served_from_cache() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    save_uniform(&dir.path().join("a.png"));
    save_split(&dir.path().join("b.png"));

    let cache = Arc::new(FingerprintCache::new(&cache_dir.path().join("c.db")).unwrap());

    let (first_groups, first) = cached_finder(&cache).find_groups(dir.path()).unwrap();
    assert_eq!(first.cache_hits, 0);
    assert_eq!(first.hashed_files, 2);

    let (second_groups, second) = cached_finder(&cache).find_groups(dir.path()).unwrap();
    assert_eq!(second.cache_hits, 2);
    assert_eq!(second.hashed_files, 0);

    // Same grouping either way
    assert_eq!(first_groups.len(), second_groups.len());
    for (a, b) in first_groups.iter().zip(second_groups.iter()) {
        assert_eq!(a.representative(), b.representative());
        assert_eq!(a.len(), b.len());
    }
}

#[test]
fn test_mtime_change_invalidates_cache_entry() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let img = dir.path().join("a.png");
    save_uniform(&img);

    let cache = Arc::new(FingerprintCache::new(&cache_dir.path().join("c.db")).unwrap());

    let (_, first) = cached_finder(&cache).find_groups(dir.path()).unwrap();
    assert_eq!(first.hashed_files, 1);

    // Touch the file: exact-match validation must treat the row as stale
    filetime::set_file_mtime(&img, filetime::FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let (_, second) = cached_finder(&cache).find_groups(dir.path()).unwrap();
    assert_eq!(second.cache_hits, 0);
    assert_eq!(second.hashed_files, 1);

    // And the refreshed row is reusable again
    let (_, third) = cached_finder(&cache).find_groups(dir.path()).unwrap();
    assert_eq!(third.cache_hits, 1);
}

#[test]
fn test_hash_size_change_invalidates_cache_entry() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    save_uniform(&dir.path().join("a.png"));

    let cache = Arc::new(FingerprintCache::new(&cache_dir.path().join("c.db")).unwrap());

    let finder8 = GroupFinder::new(
        FinderConfig::default()
            .with_io_threads(1)
            .with_hash_size(8)
            .with_cache(cache.clone()),
    );
    let (_, first) = finder8.find_groups(dir.path()).unwrap();
    assert_eq!(first.hashed_files, 1);

    // A run at a different width must not reuse the stored fingerprint
    let finder16 = GroupFinder::new(
        FinderConfig::default()
            .with_io_threads(1)
            .with_hash_size(16)
            .with_cache(cache.clone()),
    );
    let (_, second) = finder16.find_groups(dir.path()).unwrap();
    assert_eq!(second.cache_hits, 0);
    assert_eq!(second.hashed_files, 1);
}

#[test]
fn test_corrupt_file_does_not_change_other_groupings() {
    let dir = tempdir().unwrap();
    save_uniform(&dir.path().join("a.png"));
    save_uniform(&dir.path().join("b.png"));
    save_split(&dir.path().join("c.png"));

    let finder = GroupFinder::new(FinderConfig::default().with_io_threads(1));
    let (baseline, _) = finder.find_groups(dir.path()).unwrap();

    // Drop a corrupt file into the tree and re-run
    fs::write(dir.path().join("broken.png"), b"not an image").unwrap();
    let (with_corrupt, summary) = finder.find_groups(dir.path()).unwrap();

    assert_eq!(summary.hash_failures, 1);
    assert_eq!(baseline.len(), with_corrupt.len());
    for (a, b) in baseline.iter().zip(with_corrupt.iter()) {
        assert_eq!(a.representative(), b.representative());
        assert_eq!(a.len(), b.len());
    }
}

#[test]
fn test_copy_step_emits_one_representative_per_group() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    save_uniform(&dir.path().join("a.png"));
    save_uniform(&dir.path().join("b.png"));
    save_split(&dir.path().join("c.png"));

    let finder = GroupFinder::new(FinderConfig::default().with_io_threads(1));
    let (groups, _) = finder.find_groups(dir.path()).unwrap();

    let stats = copy_representatives(&groups, out.path(), false).unwrap();
    assert_eq!(stats.copied, groups.len());

    let copied: Vec<_> = fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(copied.len(), groups.len());
    assert!(copied.iter().any(|n| n == "0001.png"));
    assert!(copied.iter().any(|n| n == "0002.png"));
}

#[test]
fn test_run_without_cache_still_groups() {
    let dir = tempdir().unwrap();
    save_uniform(&dir.path().join("a.png"));
    save_uniform(&dir.path().join("b.png"));

    let finder = GroupFinder::new(FinderConfig::default().with_io_threads(1));
    let (groups, summary) = finder.find_groups(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.cache_hits, 0);
    assert_eq!(summary.hashed_files, 2);
}
