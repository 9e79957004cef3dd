//! # fiducial-heatmap
//!
//! Locate a fiducial marker (a QR-code-like square) in two scanned or
//! rendered documents, crop each to the marker's bounding box, and render a
//! diverging red–white–blue intensity heatmap of each crop for side-by-side
//! comparison.
//!
//! ## Pipeline Overview
//!
//! ```text
//! original bytes ─┐                                   ┌─▶ cropped RGB + heatmap PNG
//!                 ├─ load ─▶ locate ─▶ crop ─▶ heatmap ┤
//! copy bytes ─────┘        (per side, in parallel)     └─▶ cropped RGB + heatmap PNG
//! ```
//!
//! Each side is processed independently: the heatmaps are **not** a
//! difference image, and the two crops are not aligned to each other.
//! Only the first page of a document (or first frame of an image) is used.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fiducial_heatmap::{process, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let original = std::fs::read("original.pdf")?;
//!     let copy = std::fs::read("copy.png")?;
//!
//!     let result = process(&original, &copy, &PipelineConfig::default())?;
//!     std::fs::write("original_heatmap.png", result.original.heatmap.bytes())?;
//!     std::fs::write("copy_heatmap.png", result.copy.heatmap.bytes())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fiducial-heatmap` binary (clap + anyhow + tracing-subscriber) |
//!
//! PDF input needs the pdfium shared library at runtime. It is looked up via
//! [`PipelineConfig::pdfium_library`], then `PDFIUM_LIB_PATH`, then the
//! system library path. Raster inputs never touch pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod buffer;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use buffer::{Channels, PixelBuffer, Rectangle};
pub use config::{FormatHint, PipelineConfig, PipelineConfigBuilder, DEFAULT_OVERSAMPLE};
pub use error::HeatmapError;
pub use output::{DocumentResult, DocumentSummary, HeatmapImage, PipelineResult, PipelineSummary};
pub use pipeline::crop::crop;
pub use pipeline::heatmap::{render, render_with, ColorScale, HeatmapStyle, Normalization};
pub use pipeline::load::{load, load_reader, Decoder, DocumentDecoder, Loader, RasterDecoder};
pub use pipeline::locate::{locate, locate_with_report, MarkerReport};
pub use process::{process, process_async, process_document, process_inputs, DocumentInput};
