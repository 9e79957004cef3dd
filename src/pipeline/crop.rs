//! Region cropping: cut a rectangle out of a [`PixelBuffer`].

use crate::buffer::{PixelBuffer, Rectangle};
use tracing::{debug, warn};

/// Crop `buffer` to `rect`, clamped to the buffer bounds.
///
/// Takes ownership so the no-op cases hand the same buffer straight back:
/// a rectangle covering the whole buffer is the identity, and a rectangle
/// that clamps to zero width or height returns the input unmodified rather
/// than a degenerate empty image. Otherwise a new row-major buffer with the
/// same channel count is allocated.
pub fn crop(buffer: PixelBuffer, rect: Rectangle) -> PixelBuffer {
    let clamped = rect.clamp_to(buffer.width(), buffer.height());

    if clamped.is_empty() {
        warn!(
            "Crop rectangle {:?} has no overlap with {}x{} buffer; keeping full image",
            rect,
            buffer.width(),
            buffer.height()
        );
        return buffer;
    }
    if clamped == buffer.bounds() {
        return buffer;
    }

    let bpp = buffer.channels().count() as usize;
    let stride = buffer.stride();
    let row_len = clamped.width as usize * bpp;
    let mut samples = Vec::with_capacity(row_len * clamped.height as usize);

    let src = buffer.samples();
    for y in clamped.y..clamped.y + clamped.height {
        let start = y as usize * stride + clamped.x as usize * bpp;
        samples.extend_from_slice(&src[start..start + row_len]);
    }

    debug!(
        "Cropped {}x{} → {}x{} at ({}, {})",
        buffer.width(),
        buffer.height(),
        clamped.width,
        clamped.height,
        clamped.x,
        clamped.y
    );

    // Length is row_len * height by construction.
    PixelBuffer::new(clamped.width, clamped.height, buffer.channels(), samples)
        .unwrap_or(buffer)
}
