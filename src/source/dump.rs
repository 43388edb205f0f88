//! Failure-page dumps
//!
//! When a page arrives without the structure an adapter expects, the raw
//! HTML is kept on disk so the selector rules can be fixed later.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Writes an unparseable page to the dump directory
///
/// File names are `<source>-<UTC timestamp>-<hash>.html`, where the hash is
/// derived from the title so arbitrary titles never produce unsafe paths.
///
/// # Arguments
///
/// * `dir` - Dump directory; created if missing
/// * `source` - Adapter name
/// * `title` - Title that was being fetched
/// * `content` - Page body
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(std::io::Error)` - The directory or file could not be written
pub fn dump_page(dir: &Path, source: &str, title: &str, content: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let file_name = format!(
        "{}-{}-{}.html",
        source,
        Utc::now().format("%Y%m%dT%H%M%S%.3f"),
        &digest[..16]
    );
    let path = dir.join(file_name);
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Dumps a page if a directory is configured, logging instead of failing
pub(crate) fn dump_if_configured(dir: Option<&Path>, source: &str, title: &str, content: &str) {
    let Some(dir) = dir else {
        return;
    };

    match dump_page(dir, source, title, content) {
        Ok(path) => tracing::warn!("Result block not found, page saved to {}", path.display()),
        Err(e) => tracing::warn!("Failed to save page for '{}': {}", title, e),
    }
}
