//! Similarity grouping module.
//!
//! This module provides functionality for:
//! - Greedy single-linkage clustering of fingerprints ([`groups`])
//! - The orchestrating pipeline around cache, worker pool, and clustering
//!   ([`finder`])

pub mod finder;
pub mod groups;

pub use finder::{FinderConfig, FinderError, GroupFinder, ScanSummary};
pub use groups::{cluster_fingerprints, ClusterStats, GroupMember, SimilarityGroup};
