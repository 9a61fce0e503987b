//! Tile source resolution for a slide and its segmentation mask

use tracing::debug;

use super::descriptor::parse_dzi;
use super::types::{ResolveError, ResolvedSources, TileSource, TileSourceMap};

/// Token in a slide URL that is swapped to find the companion mask
const SLIDE_TOKEN: &str = "slide";
const MASK_TOKEN: &str = "mask";

/// Derive the mask URL for a slide URL.
///
/// This is a narrow naming convention, not a path rewrite: the first occurrence
/// of the literal substring `slide` is replaced with `mask`, wherever it sits.
/// `/slides/a.dzi` becomes `/masks/a.dzi` and `/slide/123` becomes `/mask/123`.
/// A URL that contains `slide` elsewhere (for example in a file name before the
/// directory) is rewritten at that earlier position. URLs without the token are
/// returned unchanged.
pub fn derive_mask_url(slide_url: &str) -> String {
    slide_url.replacen(SLIDE_TOKEN, MASK_TOKEN, 1)
}

/// Decides how the base slide and its mask are opened.
///
/// In inline mode the page embedded the descriptor documents and both sources are
/// parsed here. In remote mode the URLs are handed to the viewer, which fetches
/// the descriptors itself. No network I/O happens in this type.
#[derive(Debug, Default)]
pub struct TileSourceResolver {
    tile_sources: Option<TileSourceMap>,
}

impl TileSourceResolver {
    pub fn new(tile_sources: Option<TileSourceMap>) -> Self {
        Self { tile_sources }
    }

    pub fn is_inline(&self, slide_url: &str) -> bool {
        self.tile_sources
            .as_ref()
            .is_some_and(|map| map.contains_key(slide_url))
    }

    pub fn resolve(&self, slide_url: &str) -> Result<ResolvedSources, ResolveError> {
        resolve(slide_url, self.tile_sources.as_ref())
    }
}

/// Resolve base and mask tile sources for `slide_url`
pub fn resolve(
    slide_url: &str,
    tile_sources: Option<&TileSourceMap>,
) -> Result<ResolvedSources, ResolveError> {
    let mask_url = derive_mask_url(slide_url);

    let Some(base_xml) = tile_sources.and_then(|map| map.get(slide_url)) else {
        debug!(
            "Remote tile sources: base={} mask={}",
            slide_url, mask_url
        );
        return Ok(ResolvedSources {
            base: TileSource::Remote(slide_url.to_string()),
            mask: TileSource::Remote(mask_url),
        });
    };

    let base = parse_dzi(slide_url, base_xml).map_err(|e| ResolveError::MalformedDescriptor {
        url: slide_url.to_string(),
        reason: e.to_string(),
    })?;

    let mask_xml = tile_sources
        .and_then(|map| map.get(&mask_url))
        .ok_or_else(|| ResolveError::MalformedDescriptor {
            url: mask_url.clone(),
            reason: "no inline descriptor for mask".to_string(),
        })?;

    let mask = parse_dzi(&mask_url, mask_xml).map_err(|e| ResolveError::MalformedDescriptor {
        url: mask_url.clone(),
        reason: e.to_string(),
    })?;

    debug!(
        "Inline tile sources: base={} ({}x{}) mask={}",
        slide_url, base.width, base.height, mask_url
    );

    Ok(ResolvedSources {
        base: TileSource::Inline(base),
        mask: TileSource::Inline(mask),
    })
}
