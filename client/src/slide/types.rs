//! Slide-related types and error definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Raw pyramid descriptor documents keyed by the URL they describe
pub type TileSourceMap = HashMap<String, String>;

/// Errors that can occur when parsing a deep-zoom descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid descriptor XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Invalid tile size: {0}")]
    InvalidTileSize(u32),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u64, height: u64 },
}

/// Errors that can occur when resolving tile sources for a slide
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Malformed descriptor for {url}: {reason}")]
    MalformedDescriptor { url: String, reason: String },
}

/// The base image being viewed, fixed at page render time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideDescriptor {
    /// URL of the slide (descriptor endpoint or inline map key)
    pub url: String,
    /// Microns per pixel (if the scanner reported one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microns_per_pixel: Option<f64>,
}

impl SlideDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            microns_per_pixel: None,
        }
    }

    pub fn with_mpp(mut self, mpp: f64) -> Self {
        self.microns_per_pixel = Some(mpp);
        self
    }

    /// Scale bar calibration in pixels per meter.
    ///
    /// Returns `None` unless the mpp value is a positive finite number.
    pub fn pixels_per_meter(&self) -> Option<f64> {
        match self.microns_per_pixel {
            Some(mpp) if mpp.is_finite() && mpp > 0.0 => Some(1e6 / mpp),
            _ => None,
        }
    }
}

/// Parsed deep-zoom (DZI) pyramid descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidDescriptor {
    /// URL the descriptor was loaded for; tile URLs are resolved against it
    pub url: String,
    /// Tile image format (jpeg, png, ...)
    pub format: String,
    /// Edge length of a square tile in pixels
    pub tile_size: u32,
    /// Pixels of overlap between neighbouring tiles
    pub overlap: u32,
    /// Full resolution width in pixels
    pub width: u64,
    /// Full resolution height in pixels
    pub height: u64,
}

impl PyramidDescriptor {
    /// Number of pyramid levels, from 1x1 up to full resolution
    pub fn level_count(&self) -> u32 {
        let max_dim = self.width.max(self.height).max(1);
        // ceil(log2(max_dim)) + 1
        let ceil_log2 = u64::BITS - (max_dim - 1).leading_zeros();
        ceil_log2 + 1
    }

    /// Image dimensions at a pyramid level (level_count - 1 = full resolution)
    pub fn level_dimensions(&self, level: u32) -> Option<(u64, u64)> {
        let max_level = self.level_count() - 1;
        if level > max_level {
            return None;
        }
        // A shift of 64 halves anything down to a single pixel
        let Some(scale) = 1u64.checked_shl(max_level - level) else {
            return Some((1, 1));
        };
        Some((
            self.width.div_ceil(scale).max(1),
            self.height.div_ceil(scale).max(1),
        ))
    }

    /// Base URL of the tile tree: `<url without extension>_files/`
    pub fn tiles_base_url(&self) -> String {
        let (dir, file) = match self.url.rfind('/') {
            Some(idx) => self.url.split_at(idx + 1),
            None => ("", self.url.as_str()),
        };
        let stem = match file.rfind('.') {
            Some(idx) if idx > 0 => &file[..idx],
            _ => file,
        };
        format!("{}{}_files/", dir, stem)
    }

    /// URL of a single tile
    pub fn tile_url(&self, level: u32, x: u32, y: u32) -> String {
        format!(
            "{}{}/{}_{}.{}",
            self.tiles_base_url(),
            level,
            x,
            y,
            self.format
        )
    }
}

/// A tile source handed to the viewer
#[derive(Debug, Clone, PartialEq)]
pub enum TileSource {
    /// Descriptor parsed from the inline map
    Inline(PyramidDescriptor),
    /// Descriptor URL the viewer fetches itself
    Remote(String),
}

impl TileSource {
    /// URL this source was built for
    pub fn url(&self) -> &str {
        match self {
            TileSource::Inline(descriptor) => &descriptor.url,
            TileSource::Remote(url) => url,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, TileSource::Inline(_))
    }
}

/// Base and mask sources for one slide
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSources {
    pub base: TileSource,
    pub mask: TileSource,
}
