//! Canonical payload assembly.

use serde::Serialize;

use crate::ingest::sanitize::{safe_text, SanitizedRow};
use crate::ingest::submission::RawMetadata;

pub const ADDRESS_MAX_LEN: usize = 200;
pub const WHATSAPP_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 120;
pub const COORDINATE_MAX_LEN: usize = 32;

pub const STATUS_PENDING: &str = "pending";

/// Where a submission came from, as reported by transport headers.
///
/// Diagnostic only: copied into the payload verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub source_ip: String,
    pub user_agent: String,
}

/// Fully sanitized submission. Field order is the serialized order, which
/// keeps the body hash reproducible for identical content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalPayload {
    pub rows: Vec<SanitizedRow>,
    pub source_ip: String,
    pub user_agent: String,
    pub delivery_address: String,
    pub whatsapp: String,
    pub email: String,
    pub delivery_lat: String,
    pub delivery_lng: String,
    pub status: &'static str,
}

impl CanonicalPayload {
    /// Serialize to the exact bytes that are hashed and forwarded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Merge sanitized rows, wrapper metadata (if any) and provenance.
pub fn assemble(
    rows: Vec<SanitizedRow>,
    metadata: Option<&RawMetadata>,
    provenance: Provenance,
) -> CanonicalPayload {
    let (delivery_address, whatsapp, email, delivery_lat, delivery_lng) = match metadata {
        Some(m) => (
            safe_text(&m.delivery_address, ADDRESS_MAX_LEN),
            safe_text(&m.whatsapp, WHATSAPP_MAX_LEN),
            safe_text(&m.email, EMAIL_MAX_LEN),
            safe_text(&m.delivery_lat, COORDINATE_MAX_LEN),
            safe_text(&m.delivery_lng, COORDINATE_MAX_LEN),
        ),
        None => Default::default(),
    };

    CanonicalPayload {
        rows,
        source_ip: provenance.source_ip,
        user_agent: provenance.user_agent,
        delivery_address,
        whatsapp,
        email,
        delivery_lat,
        delivery_lng,
        status: STATUS_PENDING,
    }
}
