//! Record and schema types shared by adapters and cache stores

use serde::Serialize;
use std::collections::BTreeMap;

/// Field holding the batch index a record was produced for
pub const INDEX_FIELD: &str = "index";

/// Field holding the raw title string from the input batch
pub const SOURCE_TITLE_FIELD: &str = "title_from_src";

/// A flat field-name to string-value mapping
///
/// Adapters return records with their data fields filled in; the engine
/// adds the index and source title before the record is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Column layout of one adapter's cache file
///
/// The first two columns are always `index` and `title_from_src`, followed
/// by the adapter's data fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fieldnames: Vec<String>,
    key_field: String,
}

impl Schema {
    /// Creates a schema from the adapter's data fields
    ///
    /// If `key_field` is not one of the resulting columns it is appended
    /// so that every persisted row carries its key.
    pub fn new(key_field: &str, data_fields: &[&str]) -> Self {
        let mut fieldnames = vec![INDEX_FIELD.to_string(), SOURCE_TITLE_FIELD.to_string()];
        for field in data_fields {
            if !fieldnames.iter().any(|f| f == field) {
                fieldnames.push((*field).to_string());
            }
        }
        if !fieldnames.iter().any(|f| f == key_field) {
            fieldnames.push(key_field.to_string());
        }

        Self {
            fieldnames,
            key_field: key_field.to_string(),
        }
    }

    pub fn fieldnames(&self) -> &[String] {
        &self.fieldnames
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Returns the cache key of a record, if it carries one
    pub fn key_of<'r>(&self, record: &'r Record) -> Option<&'r str> {
        record.get(&self.key_field)
    }

    /// Builds a record from one row of column values
    ///
    /// Missing trailing columns become empty strings; extra columns are dropped.
    pub fn record_from_row(&self, row: &[String]) -> Record {
        self.fieldnames
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect()
    }

    /// Returns a record's values in column order
    pub fn row_of<'r>(&self, record: &'r Record) -> Vec<&'r str> {
        self.fieldnames
            .iter()
            .map(|name| record.get(name).unwrap_or(""))
            .collect()
    }
}
