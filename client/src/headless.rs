//! Terminal implementations of the page collaborators
//!
//! Used by the `slideview` binary to run a session without a browser: the viewer
//! and controls log what a real page would display.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::overlay::OverlayToggle;
use crate::segmentation::JobIndicator;
use crate::session::SessionEvent;
use crate::slide::TileSource;
use crate::viewer::{LayerHandle, LoadedLayers, TiledViewer, ViewerEvent};

/// Viewer that "opens" sources immediately and reports back on the event channel
pub struct HeadlessViewer {
    events: mpsc::UnboundedSender<SessionEvent>,
    layers: Vec<(LayerHandle, String, f32)>,
    reloads: usize,
}

impl HeadlessViewer {
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            events,
            layers: Vec::new(),
            reloads: 0,
        }
    }

    pub fn reloads(&self) -> usize {
        self.reloads
    }

    fn push_layer(&mut self, source: &TileSource, opacity: f32) -> LayerHandle {
        let handle = LayerHandle(self.layers.len());
        self.layers.push((handle, source.url().to_string(), opacity));
        handle
    }

    fn emit(&self, event: ViewerEvent) {
        if self.events.send(event.into()).is_err() {
            debug!("Session gone, viewer event dropped");
        }
    }
}

impl TiledViewer for HeadlessViewer {
    fn open(&mut self, source: &TileSource) {
        self.layers.clear();
        match source {
            TileSource::Inline(d) => info!(
                "Opening {} ({}x{}, {} levels, tiles at {})",
                d.url,
                d.width,
                d.height,
                d.level_count(),
                d.tiles_base_url()
            ),
            TileSource::Remote(url) => info!("Opening remote descriptor {}", url),
        }
        self.push_layer(source, 1.0);
    }

    fn add_tiled_image(&mut self, source: &TileSource, opacity: f32) {
        let Some(&(base, _, _)) = self.layers.first() else {
            warn!("Tiled image {} added before open, ignored", source.url());
            return;
        };
        let mask = self.push_layer(source, opacity);
        info!("Added tiled image {} at opacity {}", source.url(), opacity);
        self.emit(ViewerEvent::Opened(LoadedLayers { base, mask }));
    }

    fn set_opacity(&mut self, layer: LayerHandle, opacity: f32) {
        if let Some(entry) = self.layers.iter_mut().find(|(h, _, _)| *h == layer) {
            entry.2 = opacity;
            info!("Layer {} opacity -> {}", entry.1, opacity);
        }
    }

    fn set_scale_bar(&mut self, pixels_per_meter: Option<f64>) {
        match pixels_per_meter {
            Some(ppm) => info!("Scale bar: {:.0} px/m", ppm),
            None => info!("Scale bar hidden (no calibration)"),
        }
    }

    fn report_error(&mut self, message: &str) {
        error!("Viewer error: {}", message);
    }

    fn reload_page(&mut self) {
        self.reloads += 1;
        info!("Page reload requested");
    }
}

/// Overlay checkbox rendered as log lines
#[derive(Debug, Default)]
pub struct HeadlessToggle {
    pub enabled: bool,
    pub checked: bool,
    pub label: String,
}

impl OverlayToggle for HeadlessToggle {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
        info!("[overlay] {}", label);
    }
}

/// Segmentation progress rendered as log lines
#[derive(Debug, Default)]
pub struct HeadlessIndicator {
    pub trigger_enabled: bool,
    pub status: String,
    pub progress: u8,
}

impl JobIndicator for HeadlessIndicator {
    fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = enabled;
    }

    fn set_status_text(&mut self, text: &str) {
        if self.status != text {
            info!("[segmentation] {}", text);
        }
        self.status = text.to_string();
    }

    fn set_progress_text(&mut self, text: &str) {
        debug!("[segmentation] progress {}", text);
    }

    fn set_progress_bar(&mut self, percent: u8) {
        self.progress = percent;
    }
}
