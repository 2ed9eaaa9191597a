//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use ingest_relay::config::{RelayConfig, SecretString};
use ingest_relay::{HttpServer, Shutdown};
use tokio::net::TcpListener;

pub const SIGNING_KEY: &str = "integration-signing-key";

/// One request as seen by the mock downstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub type CaptureLog = Arc<Mutex<Vec<Captured>>>;

/// Start a downstream processor that records every request and answers
/// with a fixed status and body.
pub async fn start_downstream(status: u16, reply: &'static str) -> (SocketAddr, CaptureLog) {
    let log: CaptureLog = Arc::default();
    let sink = log.clone();
    let status = StatusCode::from_u16(status).unwrap();

    let app = Router::new().route(
        "/ingest",
        post(move |headers: HeaderMap, body: Bytes| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(Captured { headers, body });
                (status, reply)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, log)
}

pub fn relay_config(downstream: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.downstream.endpoint_url = format!("http://{}/ingest", downstream);
    config.downstream.asset_id = "asset-42".into();
    config.downstream.key_id = "key-2026-10".into();
    config.downstream.signing_key = SecretString::from(SIGNING_KEY);
    config
}

/// Start the relay on an ephemeral port.
pub async fn start_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
