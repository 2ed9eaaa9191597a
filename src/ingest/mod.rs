//! Submission ingestion pipeline.
//!
//! # Data Flow
//! ```text
//! request body (stream or whole)
//!     → reader.rs (bounded read, 64 KiB ceiling)
//!     → submission.rs (bare array | wrapper object)
//!     → sanitize.rs (per-row canonical form, all-or-nothing)
//!     → payload.rs (rows + metadata + provenance, serialized once)
//!     → signing (body hash + HMAC over timestamp.body_hash)
//!     → relay (single POST to the downstream processor)
//! ```
//!
//! # Design Decisions
//! - Strictly sequential per request, no state shared between requests
//! - Every stage short-circuits the rest on failure
//! - The pipeline does not log; the HTTP layer reports outcomes

pub mod error;
pub mod payload;
pub mod reader;
pub mod sanitize;
pub mod submission;

use std::fmt::Display;

use axum::body::Bytes;
use futures_util::Stream;

use crate::config::RelayConfig;
use crate::relay::{Accepted, RelayClient, RelayError};
use crate::signing::{SignedEnvelope, Signer};

pub use error::{IngestError, RejectReason};
pub use payload::{CanonicalPayload, Provenance};
pub use reader::MAX_BODY_BYTES;
pub use sanitize::SanitizedRow;

/// Summary of a forwarded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub rows: usize,
    pub downstream_status: u16,
}

/// Validate, sanitize and sign a complete body without forwarding it.
pub fn build_envelope(
    body: &[u8],
    provenance: Provenance,
    signer: &Signer,
) -> Result<(SignedEnvelope, usize), IngestError> {
    let (raw_rows, metadata) = submission::parse_submission(body)?.into_parts();
    let rows = sanitize::sanitize_rows(raw_rows)?;
    let row_count = rows.len();

    let payload = payload::assemble(rows, metadata.as_ref(), provenance);
    let envelope = signer.sign(payload.to_bytes()?)?;
    Ok((envelope, row_count))
}

/// The full read → sanitize → assemble → sign → relay chain.
#[derive(Debug, Clone)]
pub struct Pipeline {
    signer: Signer,
    relay: RelayClient,
}

impl Pipeline {
    pub fn new(signer: Signer, relay: RelayClient) -> Self {
        Self { signer, relay }
    }

    /// Build from validated configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let signer = Signer::new(config.downstream.signing_key.clone());
        let relay = RelayClient::new(&config.downstream, &config.timeouts)?;
        Ok(Self::new(signer, relay))
    }

    /// Process a streamed body.
    pub async fn process<S, E>(&self, body: S, provenance: Provenance) -> Result<Receipt, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let bytes = reader::read_bounded(body, MAX_BODY_BYTES).await?;
        self.forward(&bytes, provenance).await
    }

    /// Process a body that was delivered in one piece.
    pub async fn process_bytes(&self, body: &[u8], provenance: Provenance) -> Result<Receipt, IngestError> {
        reader::check_whole(body, MAX_BODY_BYTES)?;
        self.forward(body, provenance).await
    }

    async fn forward(&self, body: &[u8], provenance: Provenance) -> Result<Receipt, IngestError> {
        let (envelope, rows) = build_envelope(body, provenance, &self.signer)?;
        let Accepted { status } = self.relay.relay(envelope).await?;
        Ok(Receipt {
            rows,
            downstream_status: status,
        })
    }
}
