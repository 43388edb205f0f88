//! Append-only tab-separated cache file
//!
//! The whole file is read once when the cache is opened. Each append
//! opens the file in append mode, writes exactly one row and syncs it
//! before returning, so an interrupted run loses at most the record that
//! was being written. A row torn by such an interruption is closed off
//! before the next append so later rows stay separate.

use crate::cache::codec::{encode_row, scan_rows};
use crate::cache::traits::{require_key, CacheResult, RecordCache};
use crate::cache::{Record, Schema};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Cache backed by a tab-separated file on disk
#[derive(Debug)]
pub struct TsvCache {
    path: PathBuf,
    schema: Schema,
    records: HashMap<String, Record>,
    new_cache: bool,
    /// Written ahead of the next row when the file ends mid-row
    torn_tail: Option<&'static str>,
}

impl TsvCache {
    /// Loads a cache file
    ///
    /// A missing file is not an error: the cache starts empty and
    /// `is_new()` reports true. The file is created on the first append.
    ///
    /// When several rows share a key, the last one wins.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the cache file
    /// * `schema` - Column layout of the file
    ///
    /// # Returns
    ///
    /// * `Ok(TsvCache)` - Loaded (or new) cache
    /// * `Err(CacheError)` - The file exists but could not be read
    pub fn load(path: &Path, schema: Schema) -> CacheResult<Self> {
        let (records, new_cache, torn_tail) = match std::fs::read_to_string(path) {
            Ok(content) => {
                let (rows, torn_tail) = scan_rows(&content);
                if torn_tail.is_some() {
                    tracing::warn!(
                        "Cache file {} ends with an incomplete row",
                        path.display()
                    );
                }

                let mut records = HashMap::new();
                for row in rows {
                    let record = schema.record_from_row(&row);
                    if let Some(key) = schema.key_of(&record) {
                        records.insert(key.to_string(), record);
                    }
                }
                tracing::info!(
                    "Loaded {} cached records from {}",
                    records.len(),
                    path.display()
                );
                (records, false, torn_tail)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Creating new cache file at {}", path.display());
                (HashMap::new(), true, None)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            records,
            new_cache,
            torn_tail,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordCache for TsvCache {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    fn append(&mut self, record: Record) -> CacheResult<()> {
        let key = require_key(&self.schema, &record)?;
        let mut line = String::from(self.torn_tail.unwrap_or_default());
        line.push_str(&encode_row(self.schema.row_of(&record)));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_data()?;
        self.torn_tail = None;

        tracing::debug!("Appended cache record for '{}'", key);
        self.records.insert(key, record);
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_new(&self) -> bool {
        self.new_cache
    }
}
