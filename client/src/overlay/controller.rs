//! Segmentation mask visibility

use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::viewer::{LoadedLayers, TiledViewer};

use super::types::{OverlayState, OverlayToggle};

/// Label shown on the toggle while the mask can be displayed
pub const LABEL_AVAILABLE: &str = "Show segmentation";
/// Label shown on the toggle while no mask is available
pub const LABEL_UNAVAILABLE: &str = "Segmentation unavailable";

/// Manages the visible/hidden state of the mask layer.
///
/// The mask is never unloaded: hiding sets its opacity to zero so toggling
/// back is instantaneous. Until `attach` is called with the loaded layers,
/// visibility requests are ignored.
pub struct OverlayController<T> {
    toggle: T,
    state: OverlayState,
    layers: Option<LoadedLayers>,
    visible_opacity: f32,
}

impl<T: OverlayToggle> OverlayController<T> {
    /// Create a controller and render the initial capability on the toggle
    pub fn new(capable: bool, toggle: T, config: &OverlayConfig) -> Self {
        let mut controller = Self {
            toggle,
            state: OverlayState::default(),
            layers: None,
            visible_opacity: config.visible_opacity,
        };
        controller.render_capability(capable);
        controller.state.capable = capable;
        controller
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_capable(&self) -> bool {
        self.state.capable
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn layers(&self) -> Option<LoadedLayers> {
        self.layers
    }

    pub fn toggle(&self) -> &T {
        &self.toggle
    }

    /// Bind the controller to the layers the viewer reported as opened
    pub fn attach(&mut self, layers: LoadedLayers) {
        debug!(
            "Overlay attached: base={:?} mask={:?}",
            layers.base, layers.mask
        );
        self.layers = Some(layers);
    }

    /// Update availability of the overlay.
    ///
    /// Losing capability hides the mask and unchecks the toggle. The toggle is
    /// re-rendered even when the capability did not change.
    pub fn set_capable<V: TiledViewer + ?Sized>(&mut self, capable: bool, viewer: &mut V) {
        if capable != self.state.capable {
            info!("Overlay capability changed: {}", capable);
        }

        if !capable && self.state.visible {
            if let Some(layers) = self.layers {
                viewer.set_opacity(layers.mask, 0.0);
            }
            self.state.visible = false;
        }
        self.state.capable = capable;
        self.render_capability(capable);
    }

    /// Show or hide the mask layer.
    ///
    /// Returns `false` when the request was ignored because the overlay is not
    /// capable or the mask layer is not loaded yet.
    pub fn set_visible<V: TiledViewer + ?Sized>(&mut self, visible: bool, viewer: &mut V) -> bool {
        if !self.state.capable {
            debug!("Overlay toggle ignored: overlay not available");
            self.toggle.set_checked(self.state.visible);
            return false;
        }
        let Some(layers) = self.layers else {
            debug!("Overlay toggle ignored: mask layer not loaded");
            self.toggle.set_checked(self.state.visible);
            return false;
        };

        let opacity = if visible { self.visible_opacity } else { 0.0 };
        viewer.set_opacity(layers.mask, opacity);
        self.state.visible = visible;
        true
    }

    fn render_capability(&mut self, capable: bool) {
        self.toggle.set_enabled(capable);
        if capable {
            self.toggle.set_label(LABEL_AVAILABLE);
        } else {
            self.toggle.set_checked(false);
            self.toggle.set_label(LABEL_UNAVAILABLE);
        }
    }
}
