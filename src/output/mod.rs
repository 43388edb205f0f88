//! Output module for resolve results
//!
//! This module handles:
//! - Writing per-index outcomes as a JSON document
//! - Summarising a resolve report for the terminal

pub mod stats;

pub use stats::{print_statistics, ResolveStatistics};

use crate::engine::ResolveReport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes the report's outcomes as a pretty-printed JSON array
///
/// Each element is `{ "index", "disposition", "record" }`, in batch order;
/// `record` is `null` for items that did not resolve.
///
/// # Arguments
///
/// * `path` - Destination file; replaced if it exists
/// * `report` - The report to write
///
/// # Returns
///
/// * `Ok(())` - Results written and flushed
/// * `Err(OutputError)` - Failed to create, serialize or flush
pub fn write_results(path: &Path, report: &ResolveReport) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &report.outcomes)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!(
        "Wrote {} outcomes to {}",
        report.outcomes.len(),
        path.display()
    );
    Ok(())
}
