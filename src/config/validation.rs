use crate::config::types::{CacheConfig, Config, EngineConfig, OutputConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_cache_config(&config.cache)?;
    validate_source_config(&config.source)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates engine configuration
fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.max_passes < 1 || config.max_passes > 100 {
        return Err(ConfigError::Validation(format!(
            "max_passes must be between 1 and 100, got {}",
            config.max_passes
        )));
    }

    // Zero delays are allowed; they are only useful against local mirrors
    if config.request_delay_ms == 0 {
        tracing::warn!("request_delay_ms is 0, requests will not be paced");
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cache path cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let base_url = config.effective_base_url().ok_or_else(|| {
        ConfigError::Validation(format!(
            "source kind '{}' requires a base-url",
            config.kind.as_str()
        ))
    })?;

    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            base_url
        )));
    }

    if let Some(attempts) = config.max_attempts {
        if attempts < 1 {
            return Err(ConfigError::Validation(format!(
                "max_attempts must be >= 1, got {}",
                attempts
            )));
        }
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.results_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "results_path cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}
