//! Signed ingestion relay.
//!
//! Accepts untrusted order submissions, sanitizes them into a canonical
//! payload, signs it with HMAC-SHA256 and forwards it to a downstream
//! processor.

pub mod config;
pub mod http;
pub mod ingest;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod signing;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use ingest::Pipeline;
pub use lifecycle::Shutdown;
