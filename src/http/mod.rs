//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → request.rs (request ID, provenance headers, declared length)
//!     → ingest pipeline (read, sanitize, assemble, sign, relay)
//!     → response.rs (status code + {"ok": ...} body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::IngestResponse;
pub use server::{AppState, HttpServer};
