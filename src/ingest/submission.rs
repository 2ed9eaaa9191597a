//! Recognized shapes of an inbound submission.
//!
//! A submission is either a bare array of rows or an object with a `rows`
//! array next to optional delivery/contact fields. Deserialization picks the
//! shape; every other JSON document is rejected before any field is touched.

use serde::Deserialize;
use serde_json::Value;

use crate::ingest::error::RejectReason;

/// One untrusted row. Fields keep their raw JSON value for the sanitizer.
///
/// Built from any JSON value: a non-object element becomes a row with every
/// field missing, which then fails row validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawRow {
    pub timestamp: Value,
    pub item: Value,
    pub qty: Value,
    pub subtotal: Value,
    pub vat: Value,
    pub total: Value,
}

impl From<Value> for RawRow {
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        let mut take = |key: &str| fields.remove(key).unwrap_or(Value::Null);
        Self {
            timestamp: take("timestamp"),
            item: take("item"),
            qty: take("qty"),
            subtotal: take("subtotal"),
            vat: take("vat"),
            total: take("total"),
        }
    }
}

/// Optional delivery/contact fields carried by the wrapper form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetadata {
    pub delivery_address: Value,
    pub whatsapp: Value,
    pub email: Value,
    pub delivery_lat: Value,
    pub delivery_lng: Value,
}

/// Wrapper form of a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct Wrapper {
    pub rows: Vec<RawRow>,
    #[serde(default)]
    pub delivery_address: Value,
    #[serde(default)]
    pub whatsapp: Value,
    #[serde(default)]
    pub email: Value,
    #[serde(default)]
    pub delivery_lat: Value,
    #[serde(default)]
    pub delivery_lng: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSubmission {
    Rows(Vec<RawRow>),
    Wrapped(Wrapper),
}

impl RawSubmission {
    /// Split into rows and, for the wrapper form only, its metadata.
    pub fn into_parts(self) -> (Vec<RawRow>, Option<RawMetadata>) {
        match self {
            RawSubmission::Rows(rows) => (rows, None),
            RawSubmission::Wrapped(w) => (
                w.rows,
                Some(RawMetadata {
                    delivery_address: w.delivery_address,
                    whatsapp: w.whatsapp,
                    email: w.email,
                    delivery_lat: w.delivery_lat,
                    delivery_lng: w.delivery_lng,
                }),
            ),
        }
    }
}

/// Parse body bytes into one of the recognized shapes.
pub fn parse_submission(body: &[u8]) -> Result<RawSubmission, RejectReason> {
    let value: Value = serde_json::from_slice(body).map_err(|_| RejectReason::InvalidJson)?;
    serde_json::from_value(value).map_err(|_| RejectReason::EmptyRows)
}
