//! Request inspection.
//!
//! # Responsibilities
//! - Read the request ID set by the request-id middleware
//! - Extract caller provenance from configured transport headers
//! - Read the declared body length for early size rejection

use axum::http::{header::CONTENT_LENGTH, HeaderMap};

use crate::config::HeaderConfig;
use crate::ingest::Provenance;

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn request_id(headers: &HeaderMap) -> String {
    header_text(headers, X_REQUEST_ID).unwrap_or("unknown").to_string()
}

/// Source IP from the primary header, else forwarded-for, else empty.
/// Values are copied as received.
pub fn provenance(headers: &HeaderMap, names: &HeaderConfig) -> Provenance {
    let source_ip = header_text(headers, &names.client_ip)
        .or_else(|| header_text(headers, &names.forwarded_for))
        .unwrap_or_default()
        .to_string();
    let user_agent = header_text(headers, &names.user_agent)
        .unwrap_or_default()
        .to_string();

    Provenance {
        source_ip,
        user_agent,
    }
}

pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    header_text(headers, CONTENT_LENGTH.as_str())?.parse().ok()
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
