//! HMAC-SHA256 request signing.
//!
//! The signed material is `timestamp + "." + body_hash`, where `body_hash`
//! is the base64 SHA-256 of the exact bytes sent. Binding the timestamp into
//! the MAC means a captured envelope cannot be replayed under a fresh
//! timestamp; the verifier rejects stale ones.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::SecretString;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("signing key rejected by HMAC: {0}")]
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("timestamp '{0}' is not RFC 3339")]
    MalformedTimestamp(String),

    #[error("timestamp is {skew_ms}ms away from now")]
    Stale { skew_ms: i64 },

    #[error("body hash does not match body")]
    BodyHashMismatch,

    #[error("signature is not valid base64")]
    MalformedSignature,

    #[error("signature does not match")]
    BadSignature,
}

/// Payload plus the protocol values that travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub timestamp: String,
    pub body_hash: String,
    pub signature: String,
    pub body: Vec<u8>,
}

/// Holds the shared secret; never exposes it.
#[derive(Debug, Clone)]
pub struct Signer {
    key: SecretString,
}

impl Signer {
    pub fn new(key: SecretString) -> Self {
        Self { key }
    }

    /// Sign `body` with the current time.
    pub fn sign(&self, body: Vec<u8>) -> Result<SignedEnvelope, SignError> {
        self.sign_at(body, Utc::now())
    }

    pub fn sign_at(&self, body: Vec<u8>, at: DateTime<Utc>) -> Result<SignedEnvelope, SignError> {
        let timestamp = format_timestamp(at);
        let body_hash = body_hash(&body);
        let signature = self.signature_for(&timestamp, &body_hash)?;
        Ok(SignedEnvelope {
            timestamp,
            body_hash,
            signature,
            body,
        })
    }

    /// base64(HMAC-SHA256(key, timestamp "." body_hash))
    pub fn signature_for(&self, timestamp: &str, body_hash: &str) -> Result<String, SignError> {
        let mac = self.mac_over(timestamp, body_hash)?;
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Check an envelope the way the downstream processor does.
    pub fn verify(
        &self,
        envelope: &SignedEnvelope,
        now: DateTime<Utc>,
        max_skew: TimeDelta,
    ) -> Result<(), VerifyError> {
        let signed_at = DateTime::parse_from_rfc3339(&envelope.timestamp)
            .map_err(|_| VerifyError::MalformedTimestamp(envelope.timestamp.clone()))?
            .with_timezone(&Utc);
        let skew_ms = (now - signed_at).num_milliseconds();
        if skew_ms.abs() > max_skew.num_milliseconds() {
            return Err(VerifyError::Stale { skew_ms });
        }

        if body_hash(&envelope.body) != envelope.body_hash {
            return Err(VerifyError::BodyHashMismatch);
        }

        let expected = BASE64
            .decode(&envelope.signature)
            .map_err(|_| VerifyError::MalformedSignature)?;
        self.mac_over(&envelope.timestamp, &envelope.body_hash)
            .map_err(|_| VerifyError::BadSignature)?
            .verify_slice(&expected)
            .map_err(|_| VerifyError::BadSignature)
    }

    fn mac_over(&self, timestamp: &str, body_hash: &str) -> Result<HmacSha256, SignError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| SignError::Key(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body_hash.as_bytes());
        Ok(mac)
    }
}

/// base64(SHA-256(body))
pub fn body_hash(body: &[u8]) -> String {
    BASE64.encode(Sha256::digest(body))
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-19T08:30:00.123Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
