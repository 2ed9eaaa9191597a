//! Downstream relay subsystem.
//!
//! # Data Flow
//! ```text
//! SignedEnvelope
//!     → client.rs (POST body + asset/key/timestamp/hash/signature headers)
//!     → downstream processor
//!     → client.rs (status + "success" marker check)
//!     → Accepted | RelayError::Rejected { status, body }
//! ```

pub mod client;

pub use client::{Accepted, RelayClient, RelayError};
