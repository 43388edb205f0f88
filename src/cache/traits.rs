//! Cache store traits and error types
//!
//! This module defines the trait interface for cache backends and
//! associated error types.

use crate::cache::{Record, Schema};
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record has no value for cache key field '{key_field}'")]
    MissingKey { key_field: String },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for cache backend implementations
///
/// A cache is a key to record table with append-only semantics: records
/// are added but never updated or removed through this interface. Fixing a
/// bad record means editing the backing file by hand.
pub trait RecordCache {
    /// Returns the column layout this cache stores
    fn schema(&self) -> &Schema;

    /// Looks up a record by its cache key
    fn get(&self, key: &str) -> Option<&Record>;

    /// Returns true if a record with this key is cached
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Persists a new record
    ///
    /// The record must carry a non-empty value for the schema's key field.
    /// Once this returns `Ok`, the record survives a crash of the process
    /// and is visible to subsequent `get` calls.
    fn append(&mut self, record: Record) -> CacheResult<()>;

    /// Number of distinct keys held
    fn len(&self) -> usize;

    /// Returns true if nothing is cached
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the cache did not exist before this run
    fn is_new(&self) -> bool;
}

/// Extracts the key of a record, rejecting records without one
pub(crate) fn require_key(schema: &Schema, record: &Record) -> CacheResult<String> {
    match schema.key_of(record) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(CacheError::MissingKey {
            key_field: schema.key_field().to_string(),
        }),
    }
}
