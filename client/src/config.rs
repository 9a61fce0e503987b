//! Client configuration
//!
//! Configuration is loaded from environment variables, falling back to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the server exposing the segmentation endpoints
    pub server_url: String,
    /// Path to the JSON page data rendered by the server
    pub page_data_path: PathBuf,
    /// Trigger segmentation as soon as the session opens
    pub autostart_segmentation: bool,

    /// Segmentation job configuration
    pub segmentation: SegmentationConfig,

    /// Overlay configuration
    pub overlay: OverlayConfig,
}

/// Segmentation job polling configuration
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Period between status polls
    pub poll_interval: Duration,
    /// Consecutive failed polls before the job is marked failed (None = retry forever)
    pub max_consecutive_failures: Option<u32>,
    /// Total polls before the job is marked failed (None = poll forever)
    pub max_poll_attempts: Option<u32>,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
}

/// Overlay-related configuration
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Mask opacity while the overlay is shown
    pub visible_opacity: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            page_data_path: PathBuf::from("page.json"),
            autostart_segmentation: false,
            segmentation: SegmentationConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            max_consecutive_failures: None,
            max_poll_attempts: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            visible_opacity: 0.5,
        }
    }
}

/// Parse an optional limit where `0` or an empty value means "no limit"
fn parse_limit(val: &str) -> Option<Option<u32>> {
    if val.is_empty() {
        return Some(None);
    }
    match val.parse::<u32>() {
        Ok(0) => Some(None),
        Ok(n) => Some(Some(n)),
        Err(_) => None,
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("SLIDEVIEW_SERVER_URL")
            && !url.is_empty()
        {
            config.server_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(path) = env::var("SLIDEVIEW_PAGE_DATA")
            && !path.is_empty()
        {
            config.page_data_path = PathBuf::from(path);
        }
        if let Ok(val) = env::var("SEGMENT_AUTOSTART") {
            config.autostart_segmentation = val.to_lowercase() == "true" || val == "1";
        }

        // Segmentation config
        if let Ok(val) = env::var("SEGMENT_POLL_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
            && ms > 0
        {
            config.segmentation.poll_interval = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("SEGMENT_MAX_POLL_FAILURES")
            && let Some(limit) = parse_limit(&val)
        {
            config.segmentation.max_consecutive_failures = limit;
        }
        if let Ok(val) = env::var("SEGMENT_MAX_POLL_ATTEMPTS")
            && let Some(limit) = parse_limit(&val)
        {
            config.segmentation.max_poll_attempts = limit;
        }
        if let Ok(val) = env::var("SEGMENT_REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.segmentation.request_timeout = Duration::from_secs(secs);
        }

        // Overlay config
        if let Ok(val) = env::var("MASK_OPACITY")
            && let Ok(opacity) = val.parse::<f32>()
            && (0.0..=1.0).contains(&opacity)
        {
            config.overlay.visible_opacity = opacity;
        }

        config
    }
}
