use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Shelf-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Retry engine and pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of passes over the batch
    #[serde(rename = "max-passes", default = "default_max_passes")]
    pub max_passes: u32,

    /// Delay after every adapter call (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Pause between passes that leave items unresolved (seconds)
    #[serde(rename = "cooldown-secs", default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

fn default_max_passes() -> u32 {
    20
}

fn default_request_delay_ms() -> u64 {
    5_000
}

fn default_cooldown_secs() -> u64 {
    15 * 60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
            request_delay_ms: default_request_delay_ms(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl EngineConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Cache file configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Path to the tab-separated cache file; no path means no persistence
    #[serde(default)]
    pub path: Option<String>,
}

/// Which concrete adapter to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Amazon,
    Overdrive,
}

impl SourceKind {
    /// Base URL used when the configuration does not provide one
    ///
    /// OverDrive catalogues are per-library, so there is no default.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Amazon => Some("https://www.amazon.com/s"),
            Self::Overdrive => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amazon => "amazon",
            Self::Overdrive => "overdrive",
        }
    }
}

/// Source adapter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Adapter to use
    pub kind: SourceKind,

    /// Search endpoint queried by the adapter
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Requests issued per fetch before giving up on a missing result block
    #[serde(rename = "max-attempts", default)]
    pub max_attempts: Option<u32>,

    /// Delay between those requests (milliseconds)
    #[serde(rename = "attempt-delay-ms", default)]
    pub attempt_delay_ms: Option<u64>,

    /// Directory receiving pages whose structure could not be parsed
    #[serde(rename = "dump-dir", default)]
    pub dump_dir: Option<String>,

    /// Overrides the browser user agent sent with every request
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

impl SourceConfig {
    /// Returns the configured base URL or the adapter default
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.kind.default_base_url())
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON results file
    #[serde(rename = "results-path", default)]
    pub results_path: Option<String>,
}
