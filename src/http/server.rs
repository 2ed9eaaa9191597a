//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Hand submissions to the ingest pipeline
//! - Report each outcome (logs, metrics)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{HeaderConfig, RelayConfig};
use crate::http::request;
use crate::http::response::{IngestResponse, TIMEOUT_CODE};
use crate::ingest::{reader, IngestError, Pipeline, MAX_BODY_BYTES};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::relay::RelayError;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub headers: HeaderConfig,
}

/// HTTP server for the ingestion relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server from a validated configuration.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an already built pipeline.
    pub fn with_pipeline(config: RelayConfig, pipeline: Pipeline) -> Self {
        let state = AppState {
            pipeline: Arc::new(pipeline),
            headers: config.headers.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", post(ingest_handler))
            .route("/submit", post(ingest_handler))
            .route("/health", get(health_handler))
            .fallback(not_found_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::map_response(timeout_response))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `stop` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        stop: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoint = %self.config.downstream.endpoint_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait_for(stop))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Validate, sign and forward one submission.
async fn ingest_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request::request_id(&parts.headers);
    let provenance = request::provenance(&parts.headers, &state.headers);

    let result = match reader::check_declared(request::declared_length(&parts.headers), MAX_BODY_BYTES) {
        Ok(()) => state.pipeline.process(body.into_data_stream(), provenance).await,
        Err(e) => Err(IngestError::from(e)),
    };

    match result {
        Ok(receipt) => {
            tracing::info!(
                request_id = %request_id,
                rows = receipt.rows,
                downstream_status = receipt.downstream_status,
                "Submission forwarded"
            );
            metrics::record_submission("accepted", start_time);
            Json(IngestResponse::accepted()).into_response()
        }
        Err(err) => {
            let code = err.code();
            match &err {
                IngestError::Rejected(reason) => {
                    tracing::info!(request_id = %request_id, error = code, reason = %reason, "Submission rejected");
                }
                IngestError::Forward(relay) => {
                    tracing::warn!(
                        request_id = %request_id,
                        error = code,
                        downstream_status = relay.status(),
                        cause = %relay,
                        "Forwarding failed"
                    );
                }
                other => {
                    tracing::error!(request_id = %request_id, error = code, cause = %other, "Submission failed");
                }
            }
            metrics::record_submission(code, start_time);
            err.into_response()
        }
    }
}

async fn health_handler() -> Json<IngestResponse> {
    Json(IngestResponse::accepted())
}

/// Give deadline expiries the same JSON shape as every other failure.
async fn timeout_response(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    tracing::warn!(error = TIMEOUT_CODE, "Request deadline exceeded");
    (StatusCode::REQUEST_TIMEOUT, Json(IngestResponse::failed(TIMEOUT_CODE))).into_response()
}

async fn not_found_handler() -> Response {
    (StatusCode::NOT_FOUND, Json(IngestResponse::failed("not_found"))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretString;
    use axum::body::to_bytes;
    use futures_util::stream;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_config() -> RelayConfig {
        let mut config = RelayConfig::default();
        // Nothing listens on the discard port; a forwarding attempt fails fast.
        config.downstream.endpoint_url = "http://127.0.0.1:9/ingest".into();
        config.downstream.asset_id = "asset-1".into();
        config.downstream.key_id = "key-1".into();
        config.downstream.signing_key = SecretString::from("server-key");
        config
    }

    fn app() -> Router {
        HttpServer::new(test_config()).unwrap().router()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value, Option<String>) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let request_id = response
            .headers()
            .get(request::X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), request_id)
    }

    fn submit(body: impl Into<Body>) -> Request<Body> {
        Request::post("/submit")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body, request_id) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        assert!(request_id.is_some());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (status, body, _) = send(Request::get("/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"ok": false, "error": "not_found"}));
    }

    #[tokio::test]
    async fn test_get_on_ingest_path_is_method_not_allowed() {
        let response = app()
            .oneshot(Request::get("/submit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_empty_rows() {
        let (status, body, _) = send(submit(r#"{"rows":[],"email":"a@b.com"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"ok": false, "error": "empty_rows"}));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let (status, body, _) = send(submit("{rows:")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_json");
    }

    #[tokio::test]
    async fn test_invalid_row_reports_item() {
        let (status, body, _) = send(submit(
            r#"[{"timestamp":"t","item":"Tea","qty":1},{"timestamp":"t","item":"","qty":4}]"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"ok": false, "error": "invalid_row", "item_name": "", "qty": 4}));
    }

    #[tokio::test]
    async fn test_declared_oversize_rejected() {
        let request = Request::post("/submit")
            .header("content-length", (MAX_BODY_BYTES + 1).to_string())
            .body(Body::from(vec![b' '; MAX_BODY_BYTES + 1]))
            .unwrap();
        let (status, body, _) = send(request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_streamed_oversize_rejected() {
        let chunks = (0..3).map(|_| Ok::<_, std::io::Error>(vec![b' '; 30_000]));
        let request = Request::post("/")
            .body(Body::from_stream(stream::iter(chunks)))
            .unwrap();
        let (status, body, _) = send(request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_slow_downstream_times_out_with_json_body() {
        let slow = Router::new().route(
            "/ingest",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "success"
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, slow).await;
        });

        let mut config = test_config();
        config.downstream.endpoint_url = format!("http://{addr}/ingest");
        config.timeouts.request_secs = 1;
        let response = HttpServer::new(config)
            .unwrap()
            .router()
            .oneshot(submit(r#"[{"timestamp":"t","item":"Tea","qty":1}]"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"ok": false, "error": "timeout"}));
    }

    #[tokio::test]
    async fn test_unreachable_downstream_is_forward_failure() {
        let (status, body, _) = send(submit(r#"[{"timestamp":"t","item":"Tea","qty":1}]"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"ok": false, "error": "forward_failed", "status": 0, "body": ""}));
    }
}
