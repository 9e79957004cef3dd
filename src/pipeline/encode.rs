//! Output encoding: `DynamicImage` → PNG bytes, and PNG → data URI.
//!
//! PNG is the only output format. It is lossless, so a heatmap pixel decodes
//! back to exactly the colour the scale produced. Downstream consumers
//! compare the two heatmaps pixel-for-pixel and JPEG artefacts would show up
//! as false differences.

use crate::error::HeatmapError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

pub const PNG_MIME: &str = "image/png";

/// Encode an image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, HeatmapError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| HeatmapError::Encode(e.to_string()))?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Wrap PNG bytes in a `data:` URI for inline display.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:{PNG_MIME};base64,{}", STANDARD.encode(png))
}
