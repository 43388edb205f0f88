//! Shelf-Scout: a polite batch scraper for book metadata
//!
//! This crate resolves batches of books against unreliable HTML sources,
//! retrying transient failures over bounded passes and keeping an
//! append-only cache so resolved titles are never fetched twice.

pub mod cache;
pub mod config;
pub mod engine;
pub mod output;
pub mod source;
pub mod state;

use thiserror::Error;

/// Main error type for Shelf-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] engine::ResolveError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Shelf-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{Record, RecordCache, Schema};
pub use config::Config;
pub use engine::{ResolveEngine, ResolveError, ResolveReport, Termination};
pub use source::{FetchError, SourceAdapter};
pub use state::{Batch, Disposition, ItemIndex, WorkItem};
