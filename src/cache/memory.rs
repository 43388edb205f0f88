//! In-memory cache used when no cache file is configured

use crate::cache::traits::{require_key, CacheResult, RecordCache};
use crate::cache::{Record, Schema};
use std::collections::HashMap;

/// Cache that lives only for the duration of the process
#[derive(Debug, Clone)]
pub struct MemoryCache {
    schema: Schema,
    records: HashMap<String, Record>,
}

impl MemoryCache {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: HashMap::new(),
        }
    }
}

impl RecordCache for MemoryCache {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    fn append(&mut self, record: Record) -> CacheResult<()> {
        let key = require_key(&self.schema, &record)?;
        self.records.insert(key, record);
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_new(&self) -> bool {
        true
    }
}
