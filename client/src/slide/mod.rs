//! Slide module for opening deep-zoom images
//!
//! This module provides:
//! - `TileSourceResolver` for choosing inline or remote descriptors
//! - DZI descriptor parsing into `PyramidDescriptor`
//! - Mask URL derivation for the segmentation layer

mod descriptor;
mod resolver;
mod types;

pub use descriptor::{parse_dzi, to_dzi_xml};
pub use resolver::{TileSourceResolver, derive_mask_url, resolve};
pub use types::{
    DescriptorError, PyramidDescriptor, ResolveError, ResolvedSources, SlideDescriptor,
    TileSource, TileSourceMap,
};
