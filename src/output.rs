//! Result types handed back to the caller.

use crate::buffer::{PixelBuffer, Rectangle};
use crate::pipeline::encode;
use crate::pipeline::locate::MarkerReport;
use serde::Serialize;

/// An encoded heatmap and its pixel dimensions. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl HeatmapImage {
    pub(crate) fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    /// PNG-encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &'static str {
        encode::PNG_MIME
    }

    /// `data:image/png;base64,…` for inline display.
    pub fn to_data_uri(&self) -> String {
        encode::png_data_uri(&self.bytes)
    }
}

/// Everything produced for one input document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    /// The input cropped to the marker (RGB, or the full page if none found).
    pub cropped: PixelBuffer,
    /// Heatmap of the cropped region's luminance.
    pub heatmap: HeatmapImage,
    /// Locator output, including the rectangle that was applied.
    pub marker: MarkerReport,
}

impl DocumentResult {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            marker: self.marker.rect,
            marker_found: self.marker.found,
            threshold: self.marker.threshold,
            cropped_width: self.cropped.width(),
            cropped_height: self.cropped.height(),
            heatmap_bytes: self.heatmap.bytes().len(),
        }
    }
}

/// The pair returned by [`crate::process`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub original: DocumentResult,
    pub copy: DocumentResult,
}

impl PipelineResult {
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            original: self.original.summary(),
            copy: self.copy.summary(),
        }
    }
}

/// Serialisable description of a [`DocumentResult`] without pixel data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub marker: Rectangle,
    pub marker_found: bool,
    pub threshold: Option<u8>,
    pub cropped_width: u32,
    pub cropped_height: u32,
    pub heatmap_bytes: usize,
}

/// Serialisable description of a [`PipelineResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub original: DocumentSummary,
    pub copy: DocumentSummary,
}
