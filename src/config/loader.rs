//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::secret::SecretString;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable carrying the signing key.
pub const ENV_SIGNING_KEY: &str = "INGEST_RELAY_SIGNING_KEY";
/// Environment variable overriding the downstream endpoint.
pub const ENV_ENDPOINT_URL: &str = "INGEST_RELAY_ENDPOINT_URL";
/// Environment variable overriding the asset identifier.
pub const ENV_ASSET_ID: &str = "INGEST_RELAY_ASSET_ID";
/// Environment variable overriding the key identifier.
pub const ENV_KEY_ID: &str = "INGEST_RELAY_KEY_ID";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(
        "Validation failed: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Validation(Vec<ValidationError>),
}

/// Parse a TOML configuration file without validating it.
pub fn read_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay secrets and identifiers supplied by the process environment.
///
/// `lookup` is `std::env::var` in the binary; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let downstream = &mut config.downstream;
    if let Some(key) = lookup(ENV_SIGNING_KEY) {
        downstream.signing_key = SecretString::new(key);
    }
    if let Some(url) = lookup(ENV_ENDPOINT_URL) {
        downstream.endpoint_url = url;
    }
    if let Some(asset_id) = lookup(ENV_ASSET_ID) {
        downstream.asset_id = asset_id;
    }
    if let Some(key_id) = lookup(ENV_KEY_ID) {
        downstream.key_id = key_id;
    }
}
