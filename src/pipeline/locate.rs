//! Marker localisation: find the bounding box of the fiducial marker.
//!
//! The marker is assumed to be the largest dense region on the page once the
//! page is split into ink and paper. There is no content verification: the
//! locator only answers "where is the biggest blob of ink".
//!
//! ```text
//! RGB ─▶ luma ─▶ Otsu mask (ink = 255) ─▶ outer contours ─▶ max area ─▶ bbox
//! ```
//!
//! The locator never fails. When the page has no separable foreground the
//! full-buffer rectangle comes back, which the cropper treats as "keep the
//! whole image".
//!
//! ## Tie-breaking
//!
//! Contours are visited in the order border following discovers them, which
//! is raster-scan order of each contour's top-left-most pixel. When several
//! contours share the exact maximal area the **first** one wins. This is a
//! fixed policy rather than a geometric property.

use crate::buffer::{PixelBuffer, Rectangle};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;
use imageproc::point::Point;
use serde::Serialize;
use tracing::debug;

/// Background frame added around the binary mask.
const MASK_BORDER: u32 = 1;

/// What the locator saw, for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerReport {
    /// Rectangle to crop to. Equal to the full buffer when `found` is false.
    pub rect: Rectangle,
    /// Otsu level; `None` when the image has a single intensity.
    pub threshold: Option<u8>,
    /// Number of top-level outer contours considered.
    pub contours: usize,
    /// Enclosed polygon area of the winning contour, in square pixels.
    pub area: f64,
    /// Whether a contour was selected.
    pub found: bool,
}

impl MarkerReport {
    fn sentinel(rect: Rectangle, threshold: Option<u8>) -> Self {
        Self {
            rect,
            threshold,
            contours: 0,
            area: 0.0,
            found: false,
        }
    }
}

/// Bounding rectangle of the largest ink region, or the full buffer.
pub fn locate(buffer: &PixelBuffer) -> Rectangle {
    locate_with_report(buffer).rect
}

/// [`locate`], also returning threshold and contour statistics.
pub fn locate_with_report(buffer: &PixelBuffer) -> MarkerReport {
    let full = buffer.bounds();
    if buffer.is_empty() {
        return MarkerReport::sentinel(full, None);
    }

    let gray = buffer.to_gray_image();
    let Some((threshold, mask)) = binarize(&gray) else {
        debug!("Uniform intensity; no marker to locate");
        return MarkerReport::sentinel(full, None);
    };

    let outer: Vec<Contour<i32>> = find_contours::<i32>(&mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect();

    let Some((winner, area)) = largest(&outer) else {
        debug!(threshold, "No outer contours after binarisation");
        return MarkerReport::sentinel(full, Some(threshold));
    };

    let framed = bounding_rect(&outer[winner].points);
    let rect = Rectangle::new(
        framed.x.saturating_sub(MASK_BORDER),
        framed.y.saturating_sub(MASK_BORDER),
        framed.width,
        framed.height,
    );
    debug!(
        threshold,
        contours = outer.len(),
        area,
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "Marker located"
    );

    MarkerReport {
        rect,
        threshold: Some(threshold),
        contours: outer.len(),
        area,
        found: true,
    }
}

/// Otsu-binarise `gray`: pixels at or below the level (ink) become 255.
///
/// The mask carries a [`MASK_BORDER`] px background frame, so its
/// coordinates are shifted by that amount relative to `gray`. Border
/// following mislabels regions that touch the image edge; the frame keeps
/// every ink region strictly inside.
///
/// Returns `None` for single-intensity images, which have no two classes to
/// separate.
fn binarize(gray: &GrayImage) -> Option<(u8, GrayImage)> {
    let mut seen = [false; 256];
    for p in gray.pixels() {
        seen[p.0[0] as usize] = true;
    }
    if seen.iter().filter(|&&s| s).count() < 2 {
        return None;
    }

    let level = otsu_level(gray);
    let (w, h) = gray.dimensions();
    let mask = GrayImage::from_fn(w + 2 * MASK_BORDER, h + 2 * MASK_BORDER, |x, y| {
        let (gx, gy) = (x.wrapping_sub(MASK_BORDER), y.wrapping_sub(MASK_BORDER));
        if gx < w && gy < h && gray.get_pixel(gx, gy).0[0] <= level {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    Some((level, mask))
}

/// Index and area of the contour with maximal enclosed area; ties keep the
/// earliest index.
fn largest(contours: &[Contour<i32>]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, contour) in contours.iter().enumerate() {
        let area = polygon_area(&contour.points);
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((idx, area)),
        }
    }
    best
}

/// Shoelace area of the closed polygon through `points`.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice: i64 = 0;
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        twice += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    twice.unsigned_abs() as f64 / 2.0
}

/// Smallest axis-aligned rectangle containing every point (inclusive).
fn bounding_rect(points: &[Point<i32>]) -> Rectangle {
    let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
    let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if points.is_empty() {
        return Rectangle::new(0, 0, 0, 0);
    }
    Rectangle::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    )
}
