//! Configuration types for a heatmap pipeline run.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The config is plain data: it is cloned into
//! each worker branch and never mutated while a run is in flight.

use crate::error::HeatmapError;
use crate::pipeline::heatmap::HeatmapStyle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default page oversampling factor for document inputs.
pub const DEFAULT_OVERSAMPLE: u32 = 4;

/// Largest accepted oversampling factor. An A4 page at 16x is already
/// roughly 9 500 x 13 500 px.
pub const MAX_OVERSAMPLE: u32 = 16;

/// Configuration for one two-document pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use fiducial_heatmap::{FormatHint, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .oversample(2)
///     .copy_format(FormatHint::Document)
///     .build()
///     .unwrap();
/// assert_eq!(config.oversample, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scale applied to both page axes when rasterising a document. Range: 1–16. Default: 4.
    ///
    /// Marker localisation works on pixels, and a printed marker may cover
    /// only a small part of a large page. At 1x (72 px per inch) a 2 cm
    /// marker is about 57 px wide; 4x gives it enough pixels for a clean
    /// contour. Raster inputs are always used at native resolution.
    pub oversample: u32,

    /// Declared format of the "original" input. Default: [`FormatHint::Auto`].
    pub original_format: FormatHint,

    /// Declared format of the "copy" input. Default: [`FormatHint::Auto`].
    pub copy_format: FormatHint,

    /// Colour scale and normalisation for both heatmaps.
    pub heatmap: HeatmapStyle,

    /// Run the two documents on separate threads. Default: true.
    pub parallel: bool,

    /// Explicit pdfium library path. Takes precedence over `PDFIUM_LIB_PATH`.
    pub pdfium_library: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            oversample: DEFAULT_OVERSAMPLE,
            original_format: FormatHint::default(),
            copy_format: FormatHint::default(),
            heatmap: HeatmapStyle::default(),
            parallel: true,
            pdfium_library: None,
        }
    }
}

impl PipelineConfig {
    /// Check the same constraints as [`PipelineConfigBuilder::build`].
    ///
    /// Needed for configs that bypass the builder: struct literals or values
    /// deserialised from a file. The pipeline entry points call it first.
    pub fn validate(&self) -> Result<(), HeatmapError> {
        check_oversample(self.oversample)
    }

    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn oversample(mut self, factor: u32) -> Self {
        self.config.oversample = factor;
        self
    }

    pub fn original_format(mut self, hint: FormatHint) -> Self {
        self.config.original_format = hint;
        self
    }

    pub fn copy_format(mut self, hint: FormatHint) -> Self {
        self.config.copy_format = hint;
        self
    }

    pub fn heatmap(mut self, style: HeatmapStyle) -> Self {
        self.config.heatmap = style;
        self
    }

    pub fn parallel(mut self, v: bool) -> Self {
        self.config.parallel = v;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, HeatmapError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Reject oversampling factors outside `1..=MAX_OVERSAMPLE`.
pub(crate) fn check_oversample(factor: u32) -> Result<(), HeatmapError> {
    if factor < 1 || factor > MAX_OVERSAMPLE {
        return Err(HeatmapError::InvalidConfig(format!(
            "oversample must be 1–{MAX_OVERSAMPLE}, got {factor}"
        )));
    }
    Ok(())
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Declared or sniffed input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormatHint {
    /// Decide from the leading bytes. (default)
    #[default]
    Auto,
    /// A single raster image (PNG, JPEG, BMP, TIFF, GIF).
    Raster,
    /// A paginated document (PDF); only page 1 is rendered.
    Document,
}

impl FormatHint {
    /// Map a file extension (with or without the leading dot, any case).
    ///
    /// Unknown extensions give [`FormatHint::Auto`] so content sniffing still
    /// gets a chance.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => FormatHint::Document,
            "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" | "gif" => FormatHint::Raster,
            _ => FormatHint::Auto,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }
}
