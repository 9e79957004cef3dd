//! Heatmap rendering: single-channel intensity → diverging colour → PNG.
//!
//! Each 8-bit sample is normalised to `[-1, +1]` and looked up on a diverging
//! scale with red at −1, a neutral white midpoint at 0 and blue at +1. The
//! PNG has exactly the input dimensions: no axes, labels or padding, so a
//! heatmap pixel sits at the same coordinates as its source pixel.
//!
//! Rendering is a pure function of the buffer and a [`HeatmapStyle`]; there
//! is no global backend or colormap registry.

use crate::buffer::{Channels, PixelBuffer};
use crate::error::HeatmapError;
use crate::output::HeatmapImage;
use crate::pipeline::encode;
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// ColorBrewer RdBu, 11 classes, dark red → near-white → dark blue.
const RD_BU: [[u8; 3]; 11] = [
    [0x67, 0x00, 0x1f],
    [0xb2, 0x18, 0x2b],
    [0xd6, 0x60, 0x4d],
    [0xf4, 0xa5, 0x82],
    [0xfd, 0xdb, 0xc7],
    [0xf7, 0xf7, 0xf7],
    [0xd1, 0xe5, 0xf0],
    [0x92, 0xc5, 0xde],
    [0x43, 0x93, 0xc3],
    [0x21, 0x66, 0xac],
    [0x05, 0x30, 0x61],
];

/// Pure red → white → pure blue.
const RED_WHITE_BLUE: [[u8; 3]; 3] = [[0xff, 0x00, 0x00], [0xff, 0xff, 0xff], [0x00, 0x00, 0xff]];

/// Diverging colour scale. Anchors are evenly spaced over `[-1, +1]` with an
/// odd count, so the middle anchor is exactly the value-0 colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorScale {
    /// ColorBrewer RdBu; midpoint `#f7f7f7`. (default)
    #[default]
    RdBu,
    /// Linear pure red / white / pure blue; midpoint `#ffffff`.
    RedWhiteBlue,
}

impl ColorScale {
    fn anchors(self) -> &'static [[u8; 3]] {
        match self {
            ColorScale::RdBu => &RD_BU,
            ColorScale::RedWhiteBlue => &RED_WHITE_BLUE,
        }
    }

    /// Colour for a normalised value; inputs outside `[-1, +1]` are clamped.
    pub fn sample(self, value: f32) -> [u8; 3] {
        let anchors = self.anchors();
        let last = anchors.len() - 1;
        let t = ((value + 1.0) / 2.0).clamp(0.0, 1.0);
        let pos = t * last as f32;
        let i = (pos.floor() as usize).min(last - 1);
        let frac = pos - i as f32;

        let (lo, hi) = (anchors[i], anchors[i + 1]);
        let mut rgb = [0u8; 3];
        for c in 0..3 {
            let v = lo[c] as f32 + (hi[c] as f32 - lo[c] as f32) * frac;
            rgb[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        rgb
    }

    /// The value-0 colour.
    pub fn midpoint(self) -> [u8; 3] {
        let anchors = self.anchors();
        anchors[anchors.len() / 2]
    }
}

/// How 8-bit samples map onto `[-1, +1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// `2 * (s / 255) - 1`, independent of image content. (default)
    #[default]
    Fixed,
    /// The buffer's own minimum maps to −1 and maximum to +1. A constant
    /// buffer maps to 0.
    Stretch,
}

/// Call-time rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeatmapStyle {
    pub scale: ColorScale,
    pub normalization: Normalization,
}

/// Render with the default style (RdBu, fixed normalisation).
pub fn render(buffer: &PixelBuffer) -> Result<HeatmapImage, HeatmapError> {
    render_with(buffer, &HeatmapStyle::default())
}

/// Render `buffer`, which must be single-channel, as a PNG heatmap.
pub fn render_with(buffer: &PixelBuffer, style: &HeatmapStyle) -> Result<HeatmapImage, HeatmapError> {
    if buffer.channels() != Channels::Gray {
        return Err(HeatmapError::InvalidChannelCount {
            channels: buffer.channels().count(),
        });
    }

    let lut = build_lut(buffer.samples(), style);
    let mut rgb = Vec::with_capacity(buffer.samples().len() * 3);
    for &s in buffer.samples() {
        rgb.extend_from_slice(&lut[s as usize]);
    }

    let image = RgbImage::from_raw(buffer.width(), buffer.height(), rgb)
        .ok_or_else(|| HeatmapError::Internal("heatmap sample count mismatch".into()))?;
    let bytes = encode::encode_png(&DynamicImage::ImageRgb8(image))?;

    debug!(
        "Rendered {}x{} heatmap ({:?}, {:?})",
        buffer.width(),
        buffer.height(),
        style.scale,
        style.normalization
    );

    Ok(HeatmapImage::new(bytes, buffer.width(), buffer.height()))
}

/// Map a sample to `[-1, +1]`.
pub fn normalize(sample: u8, normalization: Normalization, min: u8, max: u8) -> f32 {
    match normalization {
        Normalization::Fixed => 2.0 * (sample as f32 / 255.0) - 1.0,
        Normalization::Stretch if max > min => {
            2.0 * ((sample as f32 - min as f32) / (max as f32 - min as f32)) - 1.0
        }
        Normalization::Stretch => 0.0,
    }
}

/// One colour per possible sample value.
fn build_lut(samples: &[u8], style: &HeatmapStyle) -> [[u8; 3]; 256] {
    let (min, max) = samples
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    let mut lut = [[0u8; 3]; 256];
    for (s, slot) in lut.iter_mut().enumerate() {
        let v = normalize(s as u8, style.normalization, min, max);
        *slot = style.scale.sample(v);
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(heatmap: &HeatmapImage) -> RgbImage {
        image::load_from_memory(heatmap.bytes())
            .expect("heatmap is a valid PNG")
            .to_rgb8()
    }

    fn near(a: [u8; 3], b: [u8; 3], tol: u8) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tol)
    }

    #[test]
    fn rejects_rgb_input() {
        let buf = PixelBuffer::filled(4, 4, Channels::Rgb, 0);
        let err = render(&buf).unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidChannelCount { channels: 3 }));
    }

    #[test]
    fn output_dimensions_match_input() {
        let buf = PixelBuffer::filled(37, 11, Channels::Gray, 64);
        let heatmap = render(&buf).unwrap();
        assert_eq!((heatmap.width(), heatmap.height()), (37, 11));
        assert_eq!(decode(&heatmap).dimensions(), (37, 11));
    }

    #[test]
    fn zero_is_red_extreme() {
        let heatmap = render(&PixelBuffer::filled(5, 5, Channels::Gray, 0)).unwrap();
        assert!(decode(&heatmap).pixels().all(|p| p.0 == RD_BU[0]));
    }

    #[test]
    fn full_is_blue_extreme() {
        let heatmap = render(&PixelBuffer::filled(5, 5, Channels::Gray, 255)).unwrap();
        assert!(decode(&heatmap).pixels().all(|p| p.0 == RD_BU[10]));
    }

    #[test]
    fn mid_intensity_is_near_neutral() {
        for s in [127u8, 128] {
            let heatmap = render(&PixelBuffer::filled(3, 3, Channels::Gray, s)).unwrap();
            let mid = ColorScale::RdBu.midpoint();
            for p in decode(&heatmap).pixels() {
                assert!(near(p.0, mid, 8), "sample {s} → {:?}", p.0);
            }
        }
    }

    #[test]
    fn render_is_deterministic() {
        let samples: Vec<u8> = (0..64 * 32).map(|i| (i * 7 % 256) as u8).collect();
        let buf = PixelBuffer::new(64, 32, Channels::Gray, samples).unwrap();
        let a = render(&buf).unwrap();
        let b = render(&buf).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn scale_endpoints_and_midpoint() {
        assert_eq!(ColorScale::RdBu.sample(-1.0), RD_BU[0]);
        assert_eq!(ColorScale::RdBu.sample(0.0), [0xf7, 0xf7, 0xf7]);
        assert_eq!(ColorScale::RdBu.sample(1.0), RD_BU[10]);
        assert_eq!(ColorScale::RedWhiteBlue.sample(0.0), [255, 255, 255]);
        assert_eq!(ColorScale::RedWhiteBlue.sample(-1.0), [255, 0, 0]);
        assert_eq!(ColorScale::RedWhiteBlue.sample(1.0), [0, 0, 255]);
        // Out-of-range values clamp.
        assert_eq!(ColorScale::RdBu.sample(-3.0), RD_BU[0]);
    }

    #[test]
    fn dominant_channel_is_monotonic() {
        // Red half: green rises towards white. Blue half: red falls away.
        let mut prev_g = 0u8;
        let mut prev_r = 255u8;
        for s in 0..=255u8 {
            let v = normalize(s, Normalization::Fixed, 0, 255);
            let [r, g, _] = ColorScale::RdBu.sample(v);
            if v <= 0.0 {
                assert!(g >= prev_g, "green dropped at sample {s}");
                prev_g = g;
            } else {
                assert!(r <= prev_r, "red rose at sample {s}");
                prev_r = r;
            }
        }
    }

    #[test]
    fn fixed_normalization_formula() {
        assert_eq!(normalize(0, Normalization::Fixed, 0, 0), -1.0);
        assert_eq!(normalize(255, Normalization::Fixed, 0, 0), 1.0);
        assert!(normalize(128, Normalization::Fixed, 0, 0) > 0.0);
        assert!(normalize(127, Normalization::Fixed, 0, 0) < 0.0);
    }

    #[test]
    fn stretch_uses_buffer_range() {
        let buf = PixelBuffer::new(2, 1, Channels::Gray, vec![100, 140]).unwrap();
        let style = HeatmapStyle {
            normalization: Normalization::Stretch,
            ..Default::default()
        };
        let img = decode(&render_with(&buf, &style).unwrap());
        assert_eq!(img.get_pixel(0, 0).0, RD_BU[0]);
        assert_eq!(img.get_pixel(1, 0).0, RD_BU[10]);
    }

    #[test]
    fn stretch_of_constant_buffer_is_midpoint() {
        let buf = PixelBuffer::filled(2, 2, Channels::Gray, 30);
        let style = HeatmapStyle {
            normalization: Normalization::Stretch,
            ..Default::default()
        };
        let img = decode(&render_with(&buf, &style).unwrap());
        assert!(img.pixels().all(|p| p.0 == ColorScale::RdBu.midpoint()));
    }
}
