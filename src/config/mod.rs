//! Configuration module for Shelf-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shelf_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Engine will run at most {} passes", config.engine.max_passes);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, EngineConfig, OutputConfig, SourceConfig, SourceKind};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
