//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules: a mock segmentation
//! server and recording implementations of the page collaborators.

#![allow(dead_code)]

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use slideview::config::Config;
use slideview::overlay::OverlayToggle;
use slideview::segmentation::JobIndicator;
use slideview::slide::TileSource;
use slideview::viewer::{LayerHandle, TiledViewer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock segmentation server
// ============================================================================

/// Scripted reply for `GET /check_segment_status`
#[derive(Debug, Clone)]
pub enum StatusReply {
    Status { status: &'static str, progress: f64 },
    Error(StatusCode),
    Garbage,
}

impl StatusReply {
    pub fn running(progress: f64) -> Self {
        StatusReply::Status {
            status: "Running",
            progress,
        }
    }

    pub fn done() -> Self {
        StatusReply::Status {
            status: "Done",
            progress: 100.0,
        }
    }
}

#[derive(Default)]
pub struct MockServerState {
    pub start_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub start_status: Mutex<Option<StatusCode>>,
    pub script: Mutex<VecDeque<StatusReply>>,
}

impl MockServerState {
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

async fn segment(State(state): State<Arc<MockServerState>>) -> impl IntoResponse {
    state.start_calls.fetch_add(1, Ordering::SeqCst);
    let forced = *state.start_status.lock().unwrap();
    match forced {
        Some(status) => (status, Json(json!({ "error": "forced" }))),
        None => (StatusCode::OK, Json(json!({ "status": "started" }))),
    }
}

async fn check_segment_status(
    State(state): State<Arc<MockServerState>>,
) -> axum::response::Response {
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    let next = state.script.lock().unwrap().pop_front();
    match next.unwrap_or(StatusReply::running(0.0)) {
        StatusReply::Status { status, progress } => {
            Json(json!({ "status": status, "progress": progress })).into_response()
        }
        StatusReply::Error(code) => code.into_response(),
        StatusReply::Garbage => (StatusCode::OK, "not json").into_response(),
    }
}

/// A running mock server
pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockServerState>,
}

/// Start a mock segmentation server on an ephemeral port
pub async fn spawn_mock_server(script: Vec<StatusReply>) -> MockServer {
    let state = Arc::new(MockServerState {
        script: Mutex::new(script.into()),
        ..Default::default()
    });

    let app = Router::new()
        .route("/segment", get(segment))
        .route("/check_segment_status", get(check_segment_status))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });

    MockServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Configuration with a fast poll interval for real-time tests
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.segmentation.poll_interval = Duration::from_millis(20);
    config.segmentation.request_timeout = Duration::from_secs(5);
    config
}

// ============================================================================
// Recording collaborators
// ============================================================================

/// Viewer that records every call
#[derive(Debug, Default)]
pub struct RecordingViewer {
    pub opened: Vec<TileSource>,
    pub added: Vec<(TileSource, f32)>,
    pub opacity: Vec<(LayerHandle, f32)>,
    pub scale_bar: Option<Option<f64>>,
    pub errors: Vec<String>,
    pub reloads: usize,
}

impl TiledViewer for RecordingViewer {
    fn open(&mut self, source: &TileSource) {
        self.opened.push(source.clone());
    }

    fn add_tiled_image(&mut self, source: &TileSource, opacity: f32) {
        self.added.push((source.clone(), opacity));
    }

    fn set_opacity(&mut self, layer: LayerHandle, opacity: f32) {
        self.opacity.push((layer, opacity));
    }

    fn set_scale_bar(&mut self, pixels_per_meter: Option<f64>) {
        self.scale_bar = Some(pixels_per_meter);
    }

    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn reload_page(&mut self) {
        self.reloads += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingToggle {
    pub enabled: bool,
    pub checked: bool,
    pub label: String,
}

impl OverlayToggle for RecordingToggle {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }
}

#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub trigger_enabled: bool,
    pub status: String,
    pub progress_text: String,
    pub progress_history: Vec<u8>,
}

impl JobIndicator for RecordingIndicator {
    fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = enabled;
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn set_progress_text(&mut self, text: &str) {
        self.progress_text = text.to_string();
    }

    fn set_progress_bar(&mut self, percent: u8) {
        self.progress_history.push(percent);
    }
}

/// Standard DZI document for fixtures
pub fn dzi(width: u64, height: u64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008" Format="jpeg" Overlap="0" TileSize="256">
    <Size Width="{}" Height="{}"/>
</Image>"#,
        width, height
    )
}

/// Initialize test logging for detailed output
pub fn init_test_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slideview=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
