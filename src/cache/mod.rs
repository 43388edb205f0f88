//! Cache module for persisting resolved records
//!
//! This module handles the durable key to record table consulted before
//! every adapter call:
//! - Tab-separated, append-only cache files
//! - An in-memory fallback when no file is configured
//! - The record and schema types shared with source adapters

mod codec;
mod memory;
mod record;
mod traits;
mod tsv;

pub use codec::{encode_row, parse_rows, scan_rows};
pub use memory::MemoryCache;
pub use record::{Record, Schema, INDEX_FIELD, SOURCE_TITLE_FIELD};
pub use traits::{CacheError, CacheResult, RecordCache};
pub use tsv::TsvCache;

use crate::config::CacheConfig;
use std::path::Path;

/// Opens the cache described by the configuration
///
/// # Arguments
///
/// * `config` - The cache configuration
/// * `schema` - Column layout of the active adapter
///
/// # Returns
///
/// * `Ok(Box<dyn RecordCache>)` - A file-backed cache when a path is
///   configured, otherwise an in-memory cache
/// * `Err(CacheError)` - The cache file exists but could not be read
pub fn open_cache(config: &CacheConfig, schema: Schema) -> CacheResult<Box<dyn RecordCache>> {
    match &config.path {
        Some(path) => Ok(Box::new(TsvCache::load(Path::new(path), schema)?)),
        None => {
            tracing::info!("No cache path configured, results will not be persisted");
            Ok(Box::new(MemoryCache::new(schema)))
        }
    }
}
