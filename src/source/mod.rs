//! Source adapters that fetch one book's metadata from a web source
//!
//! This module contains:
//! - The `SourceAdapter` capability the engine depends on
//! - Failure classification (not found, fatal, transient)
//! - HTTP plumbing shared by the concrete adapters
//! - Concrete adapters for an Amazon-style store search and an
//!   OverDrive-style library catalogue

mod amazon;
mod dump;
mod http;
mod overdrive;

pub use amazon::AmazonAdapter;
pub use dump::dump_page;
pub use http::{build_http_client, fetch_page, Page, BROWSER_USER_AGENT};
pub use overdrive::OverdriveAdapter;

use crate::cache::{Record, Schema};
use crate::config::{SourceConfig, SourceKind};
use crate::{ConfigError, ScoutError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How a failed fetch should be treated by the retry engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The item does not exist at the source; never retried
    NotFound,

    /// The source has locked us out; the whole run must stop
    Fatal,

    /// Anything else; retried on the next pass
    Transient,
}

/// A classified adapter failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("not found: {reason}")]
    NotFound { reason: String },

    #[error("fatal: {reason}")]
    Fatal { reason: String },

    #[error("transient: {reason}")]
    Transient { reason: String },
}

impl FetchError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Fatal { .. } => FailureKind::Fatal,
            Self::Transient { .. } => FailureKind::Transient,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::NotFound { reason } | Self::Fatal { reason } | Self::Transient { reason } => {
                reason
            }
        }
    }
}

/// Capability to fetch one book's record from a source
///
/// Implementations own their retry-within-fetch behaviour and their
/// result schema, which doubles as the layout of their cache file.
///
/// This trait uses `async_trait` so the engine can hold a
/// `Box<dyn SourceAdapter>` chosen at runtime.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs and dump file names
    fn name(&self) -> &str;

    /// Column layout of the records this adapter produces
    fn schema(&self) -> &Schema;

    /// Fetches the record for one title
    ///
    /// # Arguments
    ///
    /// * `title` - Title from the input batch
    /// * `author` - First author, or an empty string
    ///
    /// # Returns
    ///
    /// * `Ok(Record)` - The adapter's data fields; the engine adds `index`
    ///   and `title_from_src`
    /// * `Err(FetchError)` - A classified failure
    async fn fetch(&self, title: &str, author: &str) -> Result<Record, FetchError>;
}

/// Per-fetch retry settings shared by the concrete adapters
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Requests issued per fetch while the result block is missing
    pub max_attempts: u32,

    /// Pause between those requests
    pub attempt_delay: Duration,

    /// Where unparseable pages are written, if anywhere
    pub dump_dir: Option<PathBuf>,
}

impl AdapterOptions {
    /// Builds options from configuration, falling back to the adapter's defaults
    pub fn from_config(config: &SourceConfig, defaults: AdapterOptions) -> Self {
        Self {
            max_attempts: config.max_attempts.unwrap_or(defaults.max_attempts),
            attempt_delay: config
                .attempt_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.attempt_delay),
            dump_dir: config.dump_dir.as_ref().map(PathBuf::from),
        }
    }
}

/// Builds the adapter selected by the configuration
///
/// # Arguments
///
/// * `config` - The source configuration
///
/// # Returns
///
/// * `Ok(Box<dyn SourceAdapter>)` - Ready-to-use adapter
/// * `Err(ScoutError)` - Invalid base URL or HTTP client construction failure
pub fn build_adapter(config: &SourceConfig) -> Result<Box<dyn SourceAdapter>, ScoutError> {
    let base_url = config.effective_base_url().ok_or_else(|| {
        ConfigError::Validation(format!(
            "source kind '{}' requires a base-url",
            config.kind.as_str()
        ))
    })?;
    let base_url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", base_url, e)))?;

    let client = build_http_client(config.user_agent.as_deref())?;
    tracing::info!("Using {} adapter against {}", config.kind.as_str(), base_url);

    let adapter: Box<dyn SourceAdapter> = match config.kind {
        SourceKind::Amazon => Box::new(AmazonAdapter::new(
            client,
            base_url,
            AdapterOptions::from_config(config, AmazonAdapter::default_options()),
        )),
        SourceKind::Overdrive => Box::new(OverdriveAdapter::new(
            client,
            base_url,
            AdapterOptions::from_config(config, OverdriveAdapter::default_options()),
        )),
    };

    Ok(adapter)
}

/// Returns true if `haystack` contains the title exactly as written
pub(crate) fn title_matches(haystack: &str, title: &str) -> bool {
    haystack.contains(title)
}
