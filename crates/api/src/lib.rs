//! Fatigue Monitor API Server
//!
//! REST API hosting one fatigue analyzer per video stream.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod error;
mod routes;
pub mod settings;
pub mod stream;

pub use error::ApiError;
pub use settings::{LogSettings, ServerSettings, Settings, SettingsError};
pub use stream::{FrameInput, FrameOutcome, StreamSession};

/// Application state shared across handlers
pub struct AppState {
    /// Loaded settings
    pub settings: Settings,
    /// Analysis sessions by stream id
    pub streams: HashMap<String, StreamSession>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus exporter, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            streams: HashMap::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub type SharedState = Arc<RwLock<AppState>>;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_streams: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/streams/:id/frames", post(routes::frames::post_frame))
        .route("/api/v1/streams/:id/reset", post(routes::streams::reset_stream))
        .route("/api/v1/streams/:id/quality", get(routes::streams::get_quality))
        .route("/api/v1/streams/:id/window", get(routes::streams::get_window))
        .route("/api/v1/streams/:id/summary", post(routes::streams::post_summary))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_streams: state.streams.len(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging; `RUST_LOG` overrides the configured level
pub fn init_logging(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let builder = FmtSubscriber::builder().with_env_filter(filter).with_target(true);

    let result = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if let Err(e) = result {
        debug!("Tracing subscriber already installed: {}", e);
    }
}

/// Run the server
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let addr = settings.server.addr();

    let state = Arc::new(RwLock::new(AppState::new(settings).with_metrics(handle)));
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with(settings: Settings) -> Router {
        create_router(Arc::new(RwLock::new(AppState::new(settings))))
    }

    fn app() -> Router {
        app_with(Settings::default())
    }

    async fn call(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(path);
        let req = match body {
            Some(payload) => builder
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            json!({})
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({}))
        };
        (status, json)
    }

    async fn send_eyes(app: &Router, stream: &str, ear: f64, timestamp: u64) -> Value {
        let path = format!("/api/v1/streams/{stream}/frames");
        let body = json!({ "timestamp": timestamp, "eyes": { "left_ear": ear, "right_ear": ear } });
        let (status, json) = call(app, Method::POST, &path, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json
    }

    /// Calibrate at 100 ms spacing; returns the next timestamp
    async fn calibrate(app: &Router, stream: &str) -> u64 {
        let mut t = 0;
        while t <= 3_000 {
            send_eyes(app, stream, 0.30, t).await;
            t += 100;
        }
        t
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = call(&app(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["active_streams"], 0);
    }

    #[tokio::test]
    async fn test_frame_flow() {
        let app = app();

        let first = send_eyes(&app, "cab-1", 0.30, 0).await;
        assert_eq!(first["kind"], "calibrating");
        assert_eq!(first["isCalibrating"], true);
        assert_eq!(first["faceDetected"], true);
        assert!(first.get("alert").is_none());

        let mut t = calibrate(&app, "cab-1").await;
        let mut last = Value::Null;
        for _ in 0..10 {
            last = send_eyes(&app, "cab-1", 0.30, t).await;
            t += 100;
        }
        assert_eq!(last["kind"], "analyzed");
        assert_eq!(last["fatigueLevel"], "LOW");
        assert!(last["confidence"].as_f64().unwrap() > 0.0);

        let (_, health) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(health["active_streams"], 1);
    }

    #[tokio::test]
    async fn test_no_face_and_hold() {
        let app = app();
        let path = "/api/v1/streams/cab-2/frames";

        let (_, json) = call(&app, Method::POST, path, Some(json!({ "timestamp": 0, "landmarks": null }))).await;
        assert_eq!(json["kind"], "no_face");
        assert_eq!(json["faceDetected"], false);

        send_eyes(&app, "cab-2", 0.30, 100).await;
        let (_, json) = call(&app, Method::POST, path, Some(json!({ "timestamp": 600 }))).await;
        assert_eq!(json["kind"], "hold");
        assert_eq!(json["confidence"], 0.0);
    }

    #[tokio::test]
    async fn test_short_landmarks_rejected() {
        let app = app();
        let body = json!({ "timestamp": 0, "landmarks": [[0.0, 0.0], [1.0, 1.0]] });
        let (status, json) = call(&app, Method::POST, "/api/v1/streams/cab-3/frames", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], "keypoints_missing");
    }

    #[tokio::test]
    async fn test_sustained_closure_raises_alert() {
        let mut settings = Settings::default();
        settings.alerts.medium_required = 1_000;
        let app = app_with(settings);

        // Closing straight after calibration keeps the window uniform
        let mut t = calibrate(&app, "cab-4").await;
        let mut alerts = Vec::new();
        for _ in 0..40 {
            let json = send_eyes(&app, "cab-4", 0.05, t).await;
            if let Some(alert) = json.get("alert") {
                alerts.push(alert.clone());
            }
            t += 100;
        }
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0]["level"], "HIGH");
        assert_eq!(alerts[0]["severity"], "critical");

        let (status, summary) = call(&app, Method::POST, "/api/v1/streams/cab-4/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["peakFatigueLevel"], "HIGH");
        assert_eq!(summary["alertCount"], 1);
        assert_eq!(summary["baselineSuccessful"], true);
    }

    #[tokio::test]
    async fn test_quality_window_and_reset() {
        let app = app();

        let (status, json) = call(&app, Method::GET, "/api/v1/streams/cab-5/quality", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "stream_not_found");

        let mut t = calibrate(&app, "cab-5").await;
        for _ in 0..40 {
            send_eyes(&app, "cab-5", 0.30, t).await;
            t += 100;
        }

        let (_, quality) = call(&app, Method::GET, "/api/v1/streams/cab-5/quality", None).await;
        assert_eq!(quality["totalFrames"], 71);
        assert_eq!(quality["calibrationFrames"], 35);
        assert_eq!(quality["droppedFrames"], 0);

        let (status, window) = call(&app, Method::GET, "/api/v1/streams/cab-5/window", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(window["log"]["scanIntervalMs"], 100);
        assert_eq!(window["log"]["faceDetectedRatio"], 1.0);
        assert_eq!(window["log"]["deviceHash"], "cab-5");
        assert!(window["log"]["platform"].is_null());
        assert_eq!(window["shouldPersist"], true);

        let (status, _) = call(&app, Method::POST, "/api/v1/streams/cab-5/reset", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, quality) = call(&app, Method::GET, "/api/v1/streams/cab-5/quality", None).await;
        assert_eq!(quality["totalFrames"], 0);
        let (status, _) = call(&app, Method::GET, "/api/v1/streams/cab-5/window", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let json = send_eyes(&app, "cab-5", 0.30, t).await;
        assert_eq!(json["kind"], "calibrating");
    }

    #[tokio::test]
    async fn test_window_log_carries_platform() {
        let mut settings = Settings::default();
        settings.server.platform = Some("ios".to_string());
        let app = app_with(settings);

        let t = calibrate(&app, "cab-6").await;
        send_eyes(&app, "cab-6", 0.30, t).await;

        let (status, window) = call(&app, Method::GET, "/api/v1/streams/cab-6/window", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(window["log"]["deviceHash"], "cab-6");
        assert_eq!(window["log"]["platform"], "ios");
    }

    #[tokio::test]
    async fn test_stream_limit() {
        let mut settings = Settings::default();
        settings.server.max_streams = 1;
        let app = app_with(settings);

        send_eyes(&app, "a", 0.30, 0).await;
        let body = json!({ "timestamp": 0, "eyes": { "left_ear": 0.3, "right_ear": 0.3 } });
        let (status, json) = call(&app, Method::POST, "/api/v1/streams/b/frames", Some(body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "too_many_streams");
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (status, _) = call(&app(), Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
