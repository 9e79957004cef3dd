//! In-memory pixel storage shared by every pipeline stage.
//!
//! [`PixelBuffer`] is deliberately narrower than `image::DynamicImage`: it
//! only ever holds 8-bit grayscale or 8-bit RGB, which is all the pipeline
//! produces or consumes. Conversions to and from the `image` crate types are
//! provided at the edges so stages can reuse its codecs and the `imageproc`
//! algorithms without copying more than once.

use crate::error::HeatmapError;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Number of interleaved 8-bit samples per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channels {
    /// Single intensity channel.
    Gray,
    /// Red, green, blue.
    Rgb,
}

impl Channels {
    pub fn count(self) -> u8 {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }
}

/// A row-major, interleaved 8-bit image.
///
/// Invariant: `samples.len() == width * height * channels`. The only public
/// constructor that accepts raw samples checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: Channels,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, validating the length invariant.
    pub fn new(
        width: u32,
        height: u32,
        channels: Channels,
        samples: Vec<u8>,
    ) -> Result<Self, HeatmapError> {
        let expected = width as usize * height as usize * channels.count() as usize;
        if samples.len() != expected {
            return Err(HeatmapError::InvalidBuffer {
                width,
                height,
                channels: channels.count(),
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// A buffer with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: Channels, value: u8) -> Self {
        let len = width as usize * height as usize * channels.count() as usize;
        Self {
            width,
            height,
            channels,
            samples: vec![value; len],
        }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: Channels::Rgb,
            samples: image.into_raw(),
        }
    }

    pub fn from_gray(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: Channels::Gray,
            samples: image.into_raw(),
        }
    }

    /// Flatten any decoded image to 8-bit RGB, dropping alpha and extra depth.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb(rgb),
            other => Self::from_rgb(other.to_rgb8()),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels.count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Rectangle covering the whole buffer.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::full(self.width, self.height)
    }

    /// Single-channel luminance copy. Grayscale buffers are returned as-is.
    ///
    /// RGB is weighted with Rec. 709 coefficients (0.2126, 0.7152, 0.0722),
    /// not the Rec. 601 weights many vision libraries use.
    pub fn to_luma(&self) -> PixelBuffer {
        match self.channels {
            Channels::Gray => self.clone(),
            Channels::Rgb => Self::from_gray(self.to_dynamic().to_luma8()),
        }
    }

    /// Consuming variant of [`PixelBuffer::to_luma`]; avoids the copy when
    /// the buffer is already single-channel.
    pub fn into_luma(self) -> PixelBuffer {
        match self.channels {
            Channels::Gray => self,
            Channels::Rgb => self.to_luma(),
        }
    }

    /// Copy as a `GrayImage`, luminance-converted if RGB.
    pub fn to_gray_image(&self) -> GrayImage {
        match self.to_dynamic() {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        // Lengths are guaranteed by the constructor invariant, so
        // `from_raw` cannot fail here; fall back to an empty image anyway
        // rather than panic.
        match self.channels {
            Channels::Gray => GrayImage::from_raw(self.width, self.height, self.samples.clone())
                .map(DynamicImage::ImageLuma8)
                .unwrap_or_else(|| DynamicImage::new_luma8(0, 0)),
            Channels::Rgb => RgbImage::from_raw(self.width, self.height, self.samples.clone())
                .map(DynamicImage::ImageRgb8)
                .unwrap_or_else(|| DynamicImage::new_rgb8(0, 0)),
        }
    }

    /// Encode as PNG (grayscale or RGB, matching the channel count).
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, HeatmapError> {
        let mut buf = Vec::new();
        self.to_dynamic()
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| HeatmapError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

/// Axis-aligned integer rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The "no crop" sentinel for a `width` x `height` buffer.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersect with `[0, width) x [0, height)`.
    ///
    /// An origin outside the bounds yields an empty rectangle anchored at the
    /// clamped origin.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rectangle {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let right = self.x.saturating_add(self.width).min(width);
        let bottom = self.y.saturating_add(self.height).min(height);
        Rectangle::new(x, y, right - x, bottom - y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_sample_count() {
        let err = PixelBuffer::new(3, 2, Channels::Rgb, vec![0; 17]).unwrap_err();
        assert!(matches!(
            err,
            HeatmapError::InvalidBuffer {
                expected: 18,
                actual: 17,
                ..
            }
        ));
    }

    #[test]
    fn luma_uses_rec709_weights() {
        let samples = vec![255, 0, 0, 0, 255, 0, 0, 0, 255];
        let buf = PixelBuffer::new(3, 1, Channels::Rgb, samples).unwrap();
        // Rec. 601 would give 76, 150, 29.
        assert_eq!(buf.to_luma().samples(), &[54, 182, 18]);
    }

    #[test]
    fn from_dynamic_flattens_alpha() {
        let rgba = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 128]));
        let buf = PixelBuffer::from_dynamic(DynamicImage::ImageRgba8(rgba));
        assert_eq!(buf.channels(), Channels::Rgb);
        assert_eq!(buf.samples().len(), 4 * 3 * 3);
        assert_eq!(&buf.samples()[..3], &[10, 20, 30]);
    }

    #[test]
    fn luma_of_black_and_white_is_exact() {
        let mut samples = vec![0u8; 3];
        samples.extend_from_slice(&[255, 255, 255]);
        let buf = PixelBuffer::new(2, 1, Channels::Rgb, samples).unwrap();
        let gray = buf.to_luma();
        assert_eq!(gray.channels(), Channels::Gray);
        assert_eq!(gray.samples(), &[0, 255]);
    }

    #[test]
    fn into_luma_keeps_gray_buffer() {
        let buf = PixelBuffer::filled(5, 5, Channels::Gray, 42);
        let same = buf.clone().into_luma();
        assert_eq!(same, buf);
    }

    #[test]
    fn clamp_inside_is_unchanged() {
        let r = Rectangle::new(2, 3, 4, 5);
        assert_eq!(r.clamp_to(10, 10), r);
    }

    #[test]
    fn clamp_trims_overhang() {
        let r = Rectangle::new(8, 8, 10, 10).clamp_to(10, 12);
        assert_eq!(r, Rectangle::new(8, 8, 2, 4));
    }

    #[test]
    fn clamp_outside_is_empty() {
        let r = Rectangle::new(50, 1, 10, 10).clamp_to(10, 10);
        assert!(r.is_empty());
        assert_eq!(r.x, 10);
    }

    #[test]
    fn clamp_does_not_overflow() {
        let r = Rectangle::new(u32::MAX - 1, 0, u32::MAX, 5).clamp_to(10, 10);
        assert!(r.is_empty());
    }

    #[test]
    fn png_round_trip_keeps_dimensions() {
        let buf = PixelBuffer::filled(7, 3, Channels::Gray, 200);
        let png = buf.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 3));
    }
}
