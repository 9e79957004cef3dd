//! Error types for the fiducial-heatmap library.
//!
//! Every stage returns [`HeatmapError`]. The orchestrator hands the first
//! error it sees back to the caller unchanged, so a variant means the same
//! thing whether it came from [`crate::pipeline::load`] directly or from
//! [`crate::process`].
//!
//! Not finding a marker is **not** an error: the locator returns the
//! full-buffer rectangle instead and the pipeline carries on with the whole
//! page.

use thiserror::Error;

/// All errors returned by the fiducial-heatmap library.
#[derive(Debug, Error)]
pub enum HeatmapError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The bytes are neither a decodable raster image nor a renderable
    /// document page (or the input stream could not be read).
    #[error("Could not decode input: {detail}")]
    Decode { detail: String },

    /// A document was parsed successfully but contains no pages.
    #[error("Document has no pages; nothing to rasterise")]
    EmptyDocument,

    // ── Buffer errors ─────────────────────────────────────────────────────
    /// The heatmap renderer only accepts single-channel intensity buffers.
    #[error("Heatmap rendering needs a single-channel buffer, got {channels} channels")]
    InvalidChannelCount { channels: u8 },

    /// Sample storage does not match `width * height * channels`.
    #[error(
        "Pixel buffer of {width}x{height}x{channels} needs {expected} samples, got {actual}"
    )]
    InvalidBuffer {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The pdfium library could not be bound, so documents cannot be
    /// rasterised on this host. Raster images are unaffected.
    #[error(
        "PDF engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass an explicit library path."
    )]
    EngineUnavailable(String),

    /// PNG encoding of an output image failed.
    #[error("Image encoding failed: {0}")]
    Encode(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// A pipeline worker panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HeatmapError {
    pub(crate) fn decode(detail: impl std::fmt::Display) -> Self {
        HeatmapError::Decode {
            detail: detail.to_string(),
        }
    }
}
