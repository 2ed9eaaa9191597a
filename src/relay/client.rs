//! Downstream relay client.
//!
//! # Responsibilities
//! - POST the signed payload with the protocol headers
//! - Decide success from status and response text
//! - Surface status and truncated body on failure
//!
//! # Design Decisions
//! - One request, one response: no retries, redirects are not followed
//! - No request deadline here; the surrounding runtime owns timeouts
//! - Success is a case-insensitive "success" substring in the body, as the
//!   processor replies in free text

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::{DownstreamConfig, TimeoutConfig};
use crate::signing::SignedEnvelope;

pub const HEADER_ASSET_ID: &str = "x-asset-id";
pub const HEADER_KEY_ID: &str = "x-key-id";
pub const HEADER_TIMESTAMP: &str = "x-signature-timestamp";
pub const HEADER_BODY_HASH: &str = "x-body-sha256";
pub const HEADER_SIGNATURE: &str = "x-signature";

/// Longest downstream body echoed back to the caller, in characters.
pub const MAX_ECHOED_BODY_CHARS: usize = 3000;

const SUCCESS_MARKER: &str = "success";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid downstream endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("failed to build downstream client: {0}")]
    Build(reqwest::Error),

    #[error("downstream request failed: {0}")]
    Transport(reqwest::Error),

    #[error("downstream answered {status} without success marker")]
    Rejected { status: u16, body: String },
}

impl RelayError {
    /// Downstream status, 0 when no response arrived.
    pub fn status(&self) -> u16 {
        match self {
            RelayError::Rejected { status, .. } => *status,
            _ => 0,
        }
    }

    /// Truncated downstream response text, empty when none arrived.
    pub fn body(&self) -> &str {
        match self {
            RelayError::Rejected { body, .. } => body,
            _ => "",
        }
    }
}

/// Downstream acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub status: u16,
}

/// Forwards signed envelopes to the configured endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: Url,
    asset_id: String,
    key_id: String,
}

impl RelayClient {
    pub fn new(downstream: &DownstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, RelayError> {
        let endpoint = Url::parse(&downstream.endpoint_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(RelayError::Build)?;

        Ok(Self {
            http,
            endpoint,
            asset_id: downstream.asset_id.clone(),
            key_id: downstream.key_id.clone(),
        })
    }

    /// Send one envelope and interpret the answer.
    pub async fn relay(&self, envelope: SignedEnvelope) -> Result<Accepted, RelayError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_ASSET_ID, &self.asset_id)
            .header(HEADER_KEY_ID, &self.key_id)
            .header(HEADER_TIMESTAMP, &envelope.timestamp)
            .header(HEADER_BODY_HASH, &envelope.body_hash)
            .header(HEADER_SIGNATURE, &envelope.signature)
            .body(envelope.body)
            .send()
            .await
            .map_err(RelayError::Transport)?;

        let status = response.status();
        // An unreadable body counts as empty and fails the marker check.
        let text = response.text().await.unwrap_or_default();

        if is_success(status, &text) {
            Ok(Accepted {
                status: status.as_u16(),
            })
        } else {
            Err(RelayError::Rejected {
                status: status.as_u16(),
                body: truncate_chars(&text, MAX_ECHOED_BODY_CHARS),
            })
        }
    }
}

pub fn is_success(status: StatusCode, text: &str) -> bool {
    status.is_success() && text.to_lowercase().contains(SUCCESS_MARKER)
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretString;
    use crate::signing::Signer;
    use axum::{http::HeaderMap, routing::post, Router};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[test]
    fn test_success_rule() {
        assert!(is_success(StatusCode::OK, "Success"));
        assert!(is_success(StatusCode::CREATED, "{\"result\":\"SUCCESS\"}"));
        assert!(!is_success(StatusCode::OK, "queued"));
        assert!(!is_success(StatusCode::OK, ""));
        assert!(!is_success(StatusCode::INTERNAL_SERVER_ERROR, "success"));
        // Known weak contract: the marker anywhere counts.
        assert!(is_success(StatusCode::OK, "unsuccessful"));
    }

    #[test]
    fn test_truncate_counts_characters() {
        let long = "é".repeat(MAX_ECHOED_BODY_CHARS + 10);
        assert_eq!(truncate_chars(&long, MAX_ECHOED_BODY_CHARS).chars().count(), MAX_ECHOED_BODY_CHARS);
        assert_eq!(truncate_chars("short", MAX_ECHOED_BODY_CHARS), "short");
    }

    #[test]
    fn test_rejects_unparsable_endpoint() {
        let downstream = DownstreamConfig {
            endpoint_url: "not a url".into(),
            ..Default::default()
        };
        let err = RelayClient::new(&downstream, &TimeoutConfig::default()).unwrap_err();
        assert!(matches!(err, RelayError::InvalidEndpoint(_)));
    }

    type Captured = Arc<Mutex<Vec<(HeaderMap, Vec<u8>)>>>;

    async fn downstream(status: StatusCode, reply: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();
        let app = Router::new().route(
            "/ingest",
            post(move |headers: HeaderMap, body: axum::body::Bytes| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push((headers, body.to_vec()));
                    (status, reply)
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/ingest"), captured)
    }

    fn client_for(url: String) -> RelayClient {
        let downstream = DownstreamConfig {
            endpoint_url: url,
            asset_id: "asset-7".into(),
            key_id: "key-3".into(),
            signing_key: SecretString::from("k"),
        };
        RelayClient::new(&downstream, &TimeoutConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_relay_sends_protocol_headers() {
        let (url, captured) = downstream(StatusCode::OK, "success").await;
        let envelope = Signer::new(SecretString::from("k"))
            .sign(br#"{"rows":[]}"#.to_vec())
            .unwrap();

        let accepted = client_for(url).relay(envelope.clone()).await.unwrap();
        assert_eq!(accepted.status, 200);

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (headers, body) = &requests[0];
        assert_eq!(body, &envelope.body);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[HEADER_ASSET_ID], "asset-7");
        assert_eq!(headers[HEADER_KEY_ID], "key-3");
        assert_eq!(headers[HEADER_TIMESTAMP], envelope.timestamp.as_str());
        assert_eq!(headers[HEADER_BODY_HASH], envelope.body_hash.as_str());
        assert_eq!(headers[HEADER_SIGNATURE], envelope.signature.as_str());
    }

    #[tokio::test]
    async fn test_relay_surfaces_failure_status_and_body() {
        let (url, _) = downstream(StatusCode::INTERNAL_SERVER_ERROR, "fail: db down").await;
        let envelope = Signer::new(SecretString::from("k")).sign(b"{}".to_vec()).unwrap();

        let err = client_for(url).relay(envelope).await.unwrap_err();
        assert_eq!(err.status(), 500);
        assert_eq!(err.body(), "fail: db down");
    }

    #[tokio::test]
    async fn test_relay_without_marker_fails() {
        let (url, _) = downstream(StatusCode::OK, "queued").await;
        let envelope = Signer::new(SecretString::from("k")).sign(b"{}".to_vec()).unwrap();

        let err = client_for(url).relay(envelope).await.unwrap_err();
        assert!(matches!(err, RelayError::Rejected { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let followed: Arc<Mutex<usize>> = Arc::default();
        let hits = followed.clone();
        let app = Router::new()
            .route(
                "/ingest",
                post(|| async { (StatusCode::TEMPORARY_REDIRECT, [("location", "/moved")], "success") }),
            )
            .route(
                "/moved",
                axum::routing::any(move || {
                    let hits = hits.clone();
                    async move {
                        *hits.lock().unwrap() += 1;
                        "success"
                    }
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let envelope = Signer::new(SecretString::from("k")).sign(b"{}".to_vec()).unwrap();
        let err = client_for(format!("http://{addr}/ingest")).relay(envelope).await.unwrap_err();
        assert_eq!(err.status(), 307);
        assert_eq!(*followed.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_downstream_is_transport_error() {
        // Bind and drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let envelope = Signer::new(SecretString::from("k")).sign(b"{}".to_vec()).unwrap();
        let err = client_for(format!("http://{addr}/ingest")).relay(envelope).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
        assert_eq!(err.status(), 0);
        assert_eq!(err.body(), "");
    }
}
