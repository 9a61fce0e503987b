//! Deep-zoom (DZI) descriptor parsing
//!
//! Parses documents of the form:
//!
//! ```xml
//! <Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
//!        Format="jpeg" Overlap="0" TileSize="256">
//!     <Size Width="10000" Height="8000"/>
//! </Image>
//! ```

use serde::Deserialize;

use super::types::{DescriptorError, PyramidDescriptor};

#[derive(Debug, Deserialize)]
struct DziImage {
    #[serde(rename = "@Format", default = "default_format")]
    format: String,
    #[serde(rename = "@Overlap", default)]
    overlap: u32,
    #[serde(rename = "@TileSize")]
    tile_size: u32,
    #[serde(rename = "Size")]
    size: DziSize,
}

#[derive(Debug, Deserialize)]
struct DziSize {
    #[serde(rename = "@Width")]
    width: u64,
    #[serde(rename = "@Height")]
    height: u64,
}

fn default_format() -> String {
    "jpeg".to_string()
}

/// Parse a DZI document, binding it to the URL it was loaded for
pub fn parse_dzi(url: &str, xml: &str) -> Result<PyramidDescriptor, DescriptorError> {
    let image: DziImage = quick_xml::de::from_str(xml)?;

    if image.tile_size == 0 {
        return Err(DescriptorError::InvalidTileSize(image.tile_size));
    }
    if image.size.width == 0 || image.size.height == 0 {
        return Err(DescriptorError::InvalidDimensions {
            width: image.size.width,
            height: image.size.height,
        });
    }

    Ok(PyramidDescriptor {
        url: url.to_string(),
        format: image.format,
        tile_size: image.tile_size,
        overlap: image.overlap,
        width: image.size.width,
        height: image.size.height,
    })
}

/// Render a descriptor back to DZI XML (used for fixtures and page data)
pub fn to_dzi_xml(descriptor: &PyramidDescriptor) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
       Format="{}"
       Overlap="{}"
       TileSize="{}">
    <Size Width="{}" Height="{}"/>
</Image>"#,
        descriptor.format,
        descriptor.overlap,
        descriptor.tile_size,
        descriptor.width,
        descriptor.height
    )
}
