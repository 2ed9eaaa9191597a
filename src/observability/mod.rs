//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP layer (one event per submission outcome):
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (outcome counters, relay latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - The ingest pipeline itself emits nothing; the HTTP layer reports
//! - Request ID flows into every log event
//! - Signing keys and payload contents are never logged

pub mod logging;
pub mod metrics;
