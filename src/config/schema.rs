//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::secret::SecretString;

/// Root configuration for the ingestion relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Downstream processor endpoint and signing material.
    pub downstream: DownstreamConfig,

    /// Transport headers read for request provenance.
    pub headers: HeaderConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Downstream endpoint configuration.
///
/// None of these values are defaulted: an empty field fails validation.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DownstreamConfig {
    /// URL the signed payload is POSTed to.
    pub endpoint_url: String,

    /// Value of the asset identifier header.
    pub asset_id: String,

    /// Value of the key identifier header.
    pub key_id: String,

    /// Shared HMAC secret.
    pub signing_key: SecretString,
}

/// Names of the inbound headers that carry caller provenance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Primary client IP header, set by the edge in front of the relay.
    pub client_ip: String,

    /// Fallback forwarded-for header.
    pub forwarded_for: String,

    /// User agent header.
    pub user_agent: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            client_ip: "cf-connecting-ip".to_string(),
            forwarded_for: "x-forwarded-for".to_string(),
            user_agent: "user-agent".to_string(),
        }
    }
}

/// Timeout configuration for the surrounding runtime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Downstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one inbound request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
