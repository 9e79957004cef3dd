//! Pipeline stages for one document.
//!
//! Each submodule implements exactly one transformation step and is
//! independently testable. Stages take their input by reference or by value
//! and always return a fresh value; nothing is mutated in place and nothing is
//! remembered between calls.
//!
//! ## Data Flow
//!
//! ```text
//! load ──▶ locate ──▶ crop ──▶ (luma) ──▶ heatmap ──▶ encode
//! (bytes)   (rect)    (RGB)    (gray)     (RGB)       (PNG)
//! ```
//!
//! 1. [`load`]    — sniff the format, decode raster images or rasterise
//!    page 1 of a PDF via pdfium
//! 2. [`locate`]  — Otsu binarisation and outer-contour search for the
//!    largest ink region
//! 3. [`crop`]    — clamp and apply the rectangle
//! 4. [`heatmap`] — normalise intensities and map them through a diverging
//!    colour scale
//! 5. [`encode`]  — PNG and data-URI helpers shared by the output types

pub mod crop;
pub mod encode;
pub mod heatmap;
pub mod load;
pub mod locate;
