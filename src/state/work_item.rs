use crate::ScoutError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Opaque identity key of a batch item
///
/// Indices arrive as JSON object keys (always strings) but are usually
/// integers, so ordering is numeric when both sides parse as integers and
/// lexicographic otherwise. Integer keys sort before non-integer keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemIndex(String);

impl ItemIndex {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for ItemIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ItemIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ItemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemIndex {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemIndex {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ItemIndex {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// A single book to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Title as it appears in the input batch
    pub title: String,

    /// Authors in input order
    #[serde(default)]
    pub authors: Vec<String>,
}

impl WorkItem {
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            title: title.into(),
            authors,
        }
    }

    /// Returns the first author, or an empty string when there are none
    pub fn primary_author(&self) -> &str {
        self.authors.first().map(String::as_str).unwrap_or("")
    }
}

/// The full set of items submitted to one resolve call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    items: BTreeMap<ItemIndex, WorkItem>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, replacing any previous item with the same index
    pub fn insert(&mut self, index: impl Into<ItemIndex>, item: WorkItem) {
        self.items.insert(index.into(), item);
    }

    pub fn get(&self, index: &ItemIndex) -> Option<&WorkItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over indices in their stable order
    pub fn indices(&self) -> impl Iterator<Item = &ItemIndex> {
        self.items.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemIndex, &WorkItem)> {
        self.items.iter()
    }
}

impl FromIterator<(ItemIndex, WorkItem)> for Batch {
    fn from_iter<T: IntoIterator<Item = (ItemIndex, WorkItem)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Loads a batch from a JSON file
///
/// The file must contain an object mapping each index to
/// `{"title": "...", "authors": ["..."]}`.
///
/// # Arguments
///
/// * `path` - Path to the JSON batch file
///
/// # Returns
///
/// * `Ok(Batch)` - Parsed batch
/// * `Err(ScoutError)` - The file could not be read or is not a valid batch
pub fn load_batch(path: &Path) -> Result<Batch, ScoutError> {
    let content = std::fs::read_to_string(path)?;
    let batch: Batch = serde_json::from_str(&content)?;

    if let Some((index, _)) = batch.iter().find(|(_, item)| item.title.trim().is_empty()) {
        return Err(ScoutError::InvalidBatch(format!(
            "item {} has an empty title",
            index
        )));
    }

    Ok(batch)
}
