//! Two-document orchestration: load → locate → crop → luma → heatmap, twice.
//!
//! The two sides share nothing but the read-only config, so they run on
//! separate threads when [`PipelineConfig::parallel`] is set. Both branches
//! are always joined before a result is built, and no partial result is
//! ever returned: if either side fails the call fails. When both fail, the
//! original side's error is the one reported.

use crate::config::{FormatHint, PipelineConfig};
use crate::error::HeatmapError;
use crate::output::{DocumentResult, PipelineResult};
use crate::pipeline::{crop, heatmap, load::Loader, locate};
use std::time::Instant;
use tracing::{debug, info};

/// One side of the pair: encoded bytes plus their declared format.
#[derive(Debug, Clone, Copy)]
pub struct DocumentInput<'a> {
    pub bytes: &'a [u8],
    pub hint: FormatHint,
}

impl<'a> DocumentInput<'a> {
    pub fn new(bytes: &'a [u8], hint: FormatHint) -> Self {
        Self { bytes, hint }
    }
}

/// Run the pipeline on both documents, using the format hints from `config`.
///
/// # Errors
/// The first error from the original side, else from the copy side:
/// [`HeatmapError::Decode`], [`HeatmapError::EmptyDocument`],
/// [`HeatmapError::EngineUnavailable`] or an encoding failure;
/// [`HeatmapError::InvalidConfig`] if `config` fails
/// [`PipelineConfig::validate`].
pub fn process(
    original: &[u8],
    copy: &[u8],
    config: &PipelineConfig,
) -> Result<PipelineResult, HeatmapError> {
    process_inputs(
        DocumentInput::new(original, config.original_format),
        DocumentInput::new(copy, config.copy_format),
        config,
    )
}

/// [`process`] with per-side format hints supplied by the caller.
pub fn process_inputs(
    original: DocumentInput<'_>,
    copy: DocumentInput<'_>,
    config: &PipelineConfig,
) -> Result<PipelineResult, HeatmapError> {
    config.validate()?;
    let total_start = Instant::now();
    let loader = Loader::new(config.pdfium_library.clone());

    let (original, copy) = if config.parallel {
        std::thread::scope(|scope| {
            let copy_branch = scope.spawn(|| run_side("copy", copy, config, &loader));
            let original = run_side("original", original, config, &loader);
            let copy = copy_branch
                .join()
                .map_err(|_| HeatmapError::Internal("copy branch panicked".into()))
                .and_then(|r| r);
            (original, copy)
        })
    } else {
        // Sequential mode stops before touching the copy if the original fails.
        let original = run_side("original", original, config, &loader)?;
        (Ok(original), run_side("copy", copy, config, &loader))
    };

    let result = PipelineResult {
        original: original?,
        copy: copy?,
    };

    info!(
        "Pipeline complete in {}ms (parallel={})",
        total_start.elapsed().as_millis(),
        config.parallel
    );
    Ok(result)
}

/// Async wrapper: each side runs on Tokio's blocking pool and both are
/// joined before returning.
pub async fn process_async(
    original: Vec<u8>,
    copy: Vec<u8>,
    config: &PipelineConfig,
) -> Result<PipelineResult, HeatmapError> {
    config.validate()?;
    let original_cfg = config.clone();
    let copy_cfg = config.clone();

    let original_task = tokio::task::spawn_blocking(move || {
        let loader = Loader::new(original_cfg.pdfium_library.clone());
        let input = DocumentInput::new(&original, original_cfg.original_format);
        run_side("original", input, &original_cfg, &loader)
    });
    let copy_task = tokio::task::spawn_blocking(move || {
        let loader = Loader::new(copy_cfg.pdfium_library.clone());
        let input = DocumentInput::new(&copy, copy_cfg.copy_format);
        run_side("copy", input, &copy_cfg, &loader)
    });

    let (original, copy) = tokio::join!(original_task, copy_task);
    let original = original
        .map_err(|e| HeatmapError::Internal(format!("original task panicked: {}", e)))?;
    let copy = copy.map_err(|e| HeatmapError::Internal(format!("copy task panicked: {}", e)))?;

    Ok(PipelineResult {
        original: original?,
        copy: copy?,
    })
}

/// Run the single-document pipeline on `bytes`.
pub fn process_document(
    bytes: &[u8],
    hint: FormatHint,
    config: &PipelineConfig,
) -> Result<DocumentResult, HeatmapError> {
    config.validate()?;
    let loader = Loader::new(config.pdfium_library.clone());
    run_side("document", DocumentInput::new(bytes, hint), config, &loader)
}

fn run_side(
    side: &'static str,
    input: DocumentInput<'_>,
    config: &PipelineConfig,
    loader: &Loader,
) -> Result<DocumentResult, HeatmapError> {
    let start = Instant::now();

    // ── Step 1: Decode ───────────────────────────────────────────────────
    let page = loader.load(input.bytes, input.hint, config.oversample)?;
    let load_ms = start.elapsed().as_millis();

    // ── Step 2: Locate marker ────────────────────────────────────────────
    let marker = locate::locate_with_report(&page);
    if !marker.found {
        info!("[{}] No marker found; using the whole page", side);
    }

    // ── Step 3: Crop ─────────────────────────────────────────────────────
    let cropped = crop::crop(page, marker.rect);

    // ── Step 4: Heatmap of luminance ─────────────────────────────────────
    let intensity = cropped.to_luma();
    let heatmap = heatmap::render_with(&intensity, &config.heatmap)?;

    debug!("[{}] decode {}ms", side, load_ms);
    info!(
        "[{}] marker {:?} → {}x{} heatmap in {}ms",
        side,
        marker.rect,
        heatmap.width(),
        heatmap.height(),
        start.elapsed().as_millis()
    );

    Ok(DocumentResult {
        cropped,
        heatmap,
        marker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Rectangle;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn marker_png(size: u32, at: (u32, u32), side: u32) -> Vec<u8> {
        let mut img = RgbImage::from_pixel(size, size, Rgb([255, 255, 255]));
        for y in at.1..at.1 + side {
            for x in at.0..at.0 + side {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let a = marker_png(120, (10, 20), 30);
        let b = marker_png(90, (40, 5), 20);

        let par = process(&a, &b, &PipelineConfig::default()).unwrap();
        let seq_cfg = PipelineConfig::builder().parallel(false).build().unwrap();
        let seq = process(&a, &b, &seq_cfg).unwrap();

        assert_eq!(par.original.heatmap, seq.original.heatmap);
        assert_eq!(par.copy.heatmap, seq.copy.heatmap);
        assert_eq!(par.original.marker.rect, Rectangle::new(10, 20, 30, 30));
        assert_eq!(par.copy.marker.rect, Rectangle::new(40, 5, 20, 20));
    }

    #[test]
    fn original_error_wins_when_both_fail() {
        let err = process(b"bad original", b"%PDF-broken", &PipelineConfig::default())
            .unwrap_err();
        match err {
            HeatmapError::Decode { detail } => assert!(detail.contains("unrecognised")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sequential_copy_error_is_reported() {
        let good = marker_png(40, (5, 5), 10);
        let cfg = PipelineConfig::builder().parallel(false).build().unwrap();
        let err = process(&good, b"not an image", &cfg).unwrap_err();
        assert!(matches!(err, HeatmapError::Decode { .. }));
    }

    #[test]
    fn explicit_hints_override_config() {
        let png = marker_png(40, (5, 5), 10);
        let err = process_inputs(
            DocumentInput::new(&png, FormatHint::Raster),
            DocumentInput::new(b"%PDF-1.4", FormatHint::Raster),
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HeatmapError::Decode { .. }));
    }

    #[test]
    fn unvalidated_config_is_rejected_up_front() {
        let png = marker_png(40, (5, 5), 10);
        let config = PipelineConfig {
            oversample: 100,
            ..PipelineConfig::default()
        };
        let err = process(&png, &png, &config).unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidConfig(_)), "got: {err:?}");
        let err = process_document(&png, FormatHint::Auto, &config).unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidConfig(_)));
    }

    #[test]
    fn single_document_pipeline() {
        let png = marker_png(60, (20, 20), 15);
        let doc = process_document(&png, FormatHint::Auto, &PipelineConfig::default()).unwrap();
        assert_eq!((doc.cropped.width(), doc.cropped.height()), (15, 15));
        assert_eq!((doc.heatmap.width(), doc.heatmap.height()), (15, 15));
    }
}
