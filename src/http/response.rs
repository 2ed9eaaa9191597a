//! Caller-facing responses.
//!
//! # Responsibilities
//! - Map pipeline errors to HTTP status codes and error codes
//! - Carry diagnostics (offending row, downstream status/body) where useful
//!
//! # Design Decisions
//! - Every failure path yields a well-formed `{"ok": false, ...}` object
//! - Internal failures never echo error details to the caller

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ingest::{IngestError, RejectReason};

/// JSON answer returned to the submitting caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl IngestResponse {
    pub fn accepted() -> Self {
        Self {
            ok: true,
            error: None,
            item_name: None,
            qty: None,
            status: None,
            body: None,
        }
    }

    pub fn failed(code: &'static str) -> Self {
        Self {
            ok: false,
            error: Some(code),
            ..Self::accepted()
        }
    }
}

/// Error code for a request that outlived its deadline.
pub const TIMEOUT_CODE: &str = "timeout";

/// HTTP status for each terminal error.
pub fn status_for(err: &IngestError) -> StatusCode {
    match err {
        IngestError::Rejected(RejectReason::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        IngestError::Rejected(_) => StatusCode::BAD_REQUEST,
        IngestError::Forward(_) => StatusCode::BAD_GATEWAY,
        IngestError::Encode(_) | IngestError::Sign(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<&IngestError> for IngestResponse {
    fn from(err: &IngestError) -> Self {
        let mut response = IngestResponse::failed(err.code());
        match err {
            IngestError::Rejected(RejectReason::InvalidRow { item_name, qty }) => {
                response.item_name = Some(item_name.clone());
                response.qty = Some(*qty);
            }
            IngestError::Forward(relay) => {
                response.status = Some(relay.status());
                response.body = Some(relay.body().to_string());
            }
            _ => {}
        }
        response
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (status_for(&self), Json(IngestResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayError;
    use serde_json::json;

    #[test]
    fn test_accepted_shape() {
        assert_eq!(serde_json::to_value(IngestResponse::accepted()).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_invalid_row_carries_diagnostics() {
        let err = IngestError::Rejected(RejectReason::InvalidRow {
            item_name: "".into(),
            qty: 1,
        });
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(IngestResponse::from(&err)).unwrap(),
            json!({"ok": false, "error": "invalid_row", "item_name": "", "qty": 1})
        );
    }

    #[test]
    fn test_forward_failure_carries_downstream_status() {
        let err = IngestError::Forward(RelayError::Rejected {
            status: 500,
            body: "fail: db down".into(),
        });
        assert_eq!(status_for(&err), StatusCode::BAD_GATEWAY);
        assert_eq!(
            serde_json::to_value(IngestResponse::from(&err)).unwrap(),
            json!({"ok": false, "error": "forward_failed", "status": 500, "body": "fail: db down"})
        );
    }

    #[test]
    fn test_status_codes() {
        let too_large = IngestError::Rejected(RejectReason::PayloadTooLarge { limit: 1 });
        assert_eq!(status_for(&too_large), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(status_for(&IngestError::Rejected(RejectReason::EmptyRows)), StatusCode::BAD_REQUEST);
    }
}
