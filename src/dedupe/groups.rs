//! Similarity grouping via greedy single-linkage clustering.
//!
//! # Overview
//!
//! Fingerprints are grouped by an anchor-based, order-dependent greedy
//! pass: each incoming fingerprint is compared against the existing
//! anchors in the order those anchors were created, and joins the FIRST
//! group whose anchor is within the threshold. If none matches, it
//! becomes a new anchor. There is no re-assignment and no merging of
//! anchors that later prove close, so the result is single-linkage
//! against anchors only, not a clique: two members of one group are each
//! within the threshold of the anchor but not necessarily of each other.
//!
//! Because assignment is first-fit over anchors in creation order, the
//! grouping depends on input order. Callers feed entries in a fixed,
//! deterministic order (discovery order) to keep runs reproducible.
//!
//! Cost is O(n × g) where g is the final group count, which stays small
//! for near-duplicate corpora.
//!
//! # Example
//!
//! ```
//! use imgdedupe::dedupe::cluster_fingerprints;
//! use image_hasher::ImageHash;
//! use std::path::PathBuf;
//!
//! let a = ImageHash::from_bytes(&[0b0000_0000]).unwrap();
//! let b = ImageHash::from_bytes(&[0b0000_0001]).unwrap();
//! let entries = vec![
//!     (PathBuf::from("a.png"), a),
//!     (PathBuf::from("b.png"), b),
//! ];
//!
//! let (groups, stats) = cluster_fingerprints(entries, 2);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(stats.duplicate_files, 1);
//! ```

use std::path::{Path, PathBuf};

use image_hasher::ImageHash;
use serde::Serialize;

use crate::scanner::perceptual::hamming_distance;

/// One member of a similarity group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    /// Hamming distance to the group's anchor fingerprint
    pub distance: u32,
    /// Path of the member image
    pub path: PathBuf,
}

/// A group of visually similar images.
///
/// The anchor is the first-admitted member; every member's distance to
/// the anchor is within the clustering threshold, and after
/// finalization the anchor sits at index 0 with distance 0.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityGroup {
    /// Canonical base64 form of the anchor fingerprint. Used as an
    /// internal lookup key only; output ordering is by anchor path.
    pub anchor_key: String,
    /// Members with their distance to the anchor
    pub members: Vec<GroupMember>,
}

impl SimilarityGroup {
    fn new(anchor_key: String, anchor_path: PathBuf) -> Self {
        Self {
            anchor_key,
            members: vec![GroupMember {
                distance: 0,
                path: anchor_path,
            }],
        }
    }

    /// Number of members in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether this group holds more than one image.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.members.len() > 1
    }

    /// The representative image: the first member after finalization,
    /// which is the anchor (distance 0).
    #[must_use]
    pub fn representative(&self) -> &Path {
        &self.members[0].path
    }
}

/// Statistics produced by a clustering pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterStats {
    /// Number of fingerprint entries clustered
    pub input_entries: usize,
    /// Number of groups produced (anchors created)
    pub groups: usize,
    /// Number of non-anchor members (images folded into another group)
    pub duplicate_files: usize,
}

/// Group fingerprints by similarity against a hamming-distance threshold.
///
/// Processes `entries` in the order supplied (order is semantic, see the
/// module docs) and returns finalized groups: members stable-sorted by
/// ascending distance with the anchor first, and groups ordered by the
/// lexicographic path of their anchor for reproducible output.
///
/// All fingerprints must share one width; mixing widths is a caller bug.
#[must_use]
pub fn cluster_fingerprints(
    entries: impl IntoIterator<Item = (PathBuf, ImageHash)>,
    threshold: u32,
) -> (Vec<SimilarityGroup>, ClusterStats) {
    // Anchors live in creation order; index i of `anchors` belongs to
    // index i of `groups`. An ordered Vec, not a map, so that
    // "first-created first" is well-defined.
    let mut anchors: Vec<ImageHash> = Vec::new();
    let mut groups: Vec<SimilarityGroup> = Vec::new();
    let mut stats = ClusterStats::default();

    for (path, fingerprint) in entries {
        stats.input_entries += 1;

        let matched = anchors
            .iter()
            .enumerate()
            .find_map(|(idx, anchor)| {
                let distance = hamming_distance(&fingerprint, anchor);
                (distance <= threshold).then_some((idx, distance))
            });

        match matched {
            Some((idx, distance)) => {
                log::trace!(
                    "{} joins group {} at distance {}",
                    path.display(),
                    idx,
                    distance
                );
                groups[idx].members.push(GroupMember { distance, path });
                stats.duplicate_files += 1;
            }
            None => {
                log::trace!("{} becomes anchor {}", path.display(), anchors.len());
                groups.push(SimilarityGroup::new(fingerprint.to_base64(), path));
                anchors.push(fingerprint);
            }
        }
    }

    finalize_groups(&mut groups);
    stats.groups = groups.len();

    (groups, stats)
}

/// Sort members within each group and order groups for output.
///
/// Members are stable-sorted by ascending distance, so ties keep their
/// original admission order and the anchor stays at index 0. Groups are
/// ordered by the path of their anchor.
fn finalize_groups(groups: &mut [SimilarityGroup]) {
    for group in groups.iter_mut() {
        group.members.sort_by_key(|m| m.distance);
    }
    groups.sort_by(|a, b| a.members[0].path.cmp(&b.members[0].path));
}
