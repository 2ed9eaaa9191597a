//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Refuse to start without signing material and downstream identity
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("downstream.signing_key must be set")]
    MissingSigningKey,

    #[error("downstream.endpoint_url must be set")]
    MissingEndpoint,

    #[error("downstream.endpoint_url '{url}' is invalid: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("downstream.{field} must be set")]
    MissingIdentifier { field: &'static str },

    #[error("downstream.{field} is not a valid header value")]
    InvalidIdentifier { field: &'static str },

    #[error("headers.{field} '{value}' is not a valid header name")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("{field} '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let downstream = &config.downstream;

    if downstream.signing_key.is_empty() {
        errors.push(ValidationError::MissingSigningKey);
    }

    if downstream.endpoint_url.is_empty() {
        errors.push(ValidationError::MissingEndpoint);
    } else {
        match Url::parse(&downstream.endpoint_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidEndpoint {
                url: downstream.endpoint_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidEndpoint {
                url: downstream.endpoint_url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    for (field, value) in [("asset_id", &downstream.asset_id), ("key_id", &downstream.key_id)] {
        if value.is_empty() {
            errors.push(ValidationError::MissingIdentifier { field });
        } else if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidIdentifier { field });
        }
    }

    let headers = &config.headers;
    for (field, value) in [
        ("client_ip", &headers.client_ip),
        ("forwarded_for", &headers.forwarded_for),
        ("user_agent", &headers.user_agent),
    ] {
        if HeaderName::from_bytes(value.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName {
                field,
                value: value.clone(),
            });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "connect_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "request_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
