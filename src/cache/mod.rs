//! Fingerprint caching module.
//!
//! This module provides persistent storage for perceptual fingerprints to
//! speed up subsequent runs by avoiding re-hashing of unchanged files.
//!
//! # Architecture
//!
//! The caching system is split into two components:
//!
//! * [`database`]: SQLite-based persistence, schema management, and the
//!   lookup/store operations.
//! * [`entry`]: The row model stored in the cache and its validation logic.
//!
//! # Cache Invalidation
//!
//! Entries are keyed by file path and validated against:
//! * Modification time (exact match, no tolerance window)
//! * Fingerprint width (the run's configured hash size)
//!
//! If either differs, the entry is stale: the file is re-hashed and the
//! row overwritten. Rows are never explicitly deleted; stale rows are
//! simply superseded by the upsert.
//!
//! # Concurrency
//!
//! The store assumes a single writer per run: only the orchestrating
//! thread reads or writes it. Concurrent process instances sharing one
//! database file are not supported.

pub mod database;
pub mod entry;

pub use database::{CacheError, CacheResult, FingerprintCache};
pub use entry::CacheEntry;
