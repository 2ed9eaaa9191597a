//! Error taxonomy for one submission.

use thiserror::Error;

use crate::ingest::reader::ReadError;
use crate::relay::RelayError;
use crate::signing::SignError;

/// Why a submission was refused before anything was forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("request body is not valid JSON")]
    InvalidJson,

    #[error("submission contains no rows")]
    EmptyRows,

    #[error("row failed validation (item_name={item_name:?}, qty={qty})")]
    InvalidRow { item_name: String, qty: i64 },
}

impl RejectReason {
    /// Caller-visible error code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::PayloadTooLarge { .. } => "payload_too_large",
            RejectReason::InvalidJson => "invalid_json",
            RejectReason::EmptyRows => "empty_rows",
            RejectReason::InvalidRow { .. } => "invalid_row",
        }
    }
}

/// Any terminal outcome of the pipeline other than acceptance.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Rejected(#[from] RejectReason),

    #[error("failed to encode canonical payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Forward(#[from] RelayError),
}

impl IngestError {
    /// Caller-visible error code.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Rejected(reason) => reason.code(),
            IngestError::Encode(_) | IngestError::Sign(_) => "internal_error",
            IngestError::Forward(_) => "forward_failed",
        }
    }
}

impl From<ReadError> for RejectReason {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Oversize { limit } => RejectReason::PayloadTooLarge { limit },
            // A body that stopped arriving mid-stream is not a JSON document.
            ReadError::Interrupted(_) => RejectReason::InvalidJson,
        }
    }
}

impl From<ReadError> for IngestError {
    fn from(err: ReadError) -> Self {
        IngestError::Rejected(err.into())
    }
}
