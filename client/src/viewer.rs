//! Tiled-image viewer seam
//!
//! The viewer library (tile fetching, decoding, rendering) lives outside this
//! crate. The session talks to it through `TiledViewer` and hears back through
//! `ViewerEvent`s delivered by the host.

use crate::slide::TileSource;

/// Opaque handle to a tiled image owned by the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub usize);

/// Base and mask layers, in the order they were added to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedLayers {
    pub base: LayerHandle,
    pub mask: LayerHandle,
}

/// Notifications from the viewer library
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// Both base and mask images have been opened
    Opened(LoadedLayers),
    /// The viewer failed to load a source (already reported by the viewer)
    LoadFailed(String),
}

/// Operations the session needs from the viewer library.
///
/// Calls are fire-and-forget: completion is reported later as a `ViewerEvent`.
pub trait TiledViewer {
    /// Open the base image
    fn open(&mut self, source: &TileSource);

    /// Add a secondary tiled image above the base
    fn add_tiled_image(&mut self, source: &TileSource, opacity: f32);

    /// Change the opacity of a loaded layer
    fn set_opacity(&mut self, layer: LayerHandle, opacity: f32);

    /// Configure the scale bar, `None` hides it
    fn set_scale_bar(&mut self, pixels_per_meter: Option<f64>);

    /// Show a load error through the viewer's own error UI
    fn report_error(&mut self, message: &str);

    /// Reload the whole page so fresh descriptors and tiles are fetched
    fn reload_page(&mut self);
}

impl<V: TiledViewer + ?Sized> TiledViewer for &mut V {
    fn open(&mut self, source: &TileSource) {
        (**self).open(source)
    }

    fn add_tiled_image(&mut self, source: &TileSource, opacity: f32) {
        (**self).add_tiled_image(source, opacity)
    }

    fn set_opacity(&mut self, layer: LayerHandle, opacity: f32) {
        (**self).set_opacity(layer, opacity)
    }

    fn set_scale_bar(&mut self, pixels_per_meter: Option<f64>) {
        (**self).set_scale_bar(pixels_per_meter)
    }

    fn report_error(&mut self, message: &str) {
        (**self).report_error(message)
    }

    fn reload_page(&mut self) {
        (**self).reload_page()
    }
}
