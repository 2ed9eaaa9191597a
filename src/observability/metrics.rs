//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ingest_submissions_total` (counter): submissions by outcome code
//! - `ingest_relay_duration_seconds` (histogram): handling time by outcome
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record the outcome of one submission.
pub fn record_submission(outcome: &'static str, start_time: Instant) {
    metrics::counter!("ingest_submissions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("ingest_relay_duration_seconds", "outcome" => outcome)
        .record(start_time.elapsed().as_secs_f64());
}
