//! Payload signing subsystem.
//!
//! # Data Flow
//! ```text
//! canonical payload bytes
//!     → signer.rs (SHA-256 body hash, timestamp capture)
//!     → signer.rs (HMAC-SHA256 over "timestamp.body_hash")
//!     → SignedEnvelope (consumed immediately by the relay client)
//! ```
//!
//! # Security Constraints
//! - The signing key comes from configuration, never from ambient state
//! - The key is never logged, returned or serialized
//! - Timestamp is captured at signing time, not at request arrival

pub mod signer;

pub use signer::{body_hash, format_timestamp, SignError, SignedEnvelope, Signer, VerifyError};
