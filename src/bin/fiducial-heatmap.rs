//! CLI binary for fiducial-heatmap.
//!
//! A thin shim over the library crate: maps CLI flags to `PipelineConfig`,
//! runs the pipeline on two files and writes the crops and heatmaps into an
//! output directory. File naming lives here, never in the library.

use anyhow::{Context, Result};
use clap::Parser;
use fiducial_heatmap::{
    process, ColorScale, DocumentResult, FormatHint, HeatmapStyle, Normalization, PipelineConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compare a PDF original with a scanned copy
  fiducial-heatmap original.pdf copy.jpg

  # Write into a specific directory at 6x oversampling
  fiducial-heatmap -o out/ --oversample 6 original.pdf copy.pdf

  # Stretch each heatmap to its own intensity range
  fiducial-heatmap --normalization stretch original.png copy.png

  # Machine-readable summary
  fiducial-heatmap --json original.pdf copy.png > summary.json

OUTPUT FILES (in --out-dir):
  original_heatmap.png   copy_heatmap.png
  original_cropped.png   copy_cropped.png

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory) for PDF input
  RUST_LOG                Override log filter (e.g. fiducial_heatmap=debug)
"#;

/// Crop two documents to their fiducial marker and render intensity heatmaps.
#[derive(Parser, Debug)]
#[command(
    name = "fiducial-heatmap",
    version,
    about = "Crop two documents to their fiducial marker and render intensity heatmaps",
    long_about = "Locate the largest dense region (the fiducial marker) on the first page of \
each input, crop to its bounding box, and render a red-white-blue heatmap of the crop's \
intensity. Inputs may be PNG, JPEG, BMP, TIFF, GIF or PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The reference document.
    original: PathBuf,

    /// The document to compare against the original.
    copy: PathBuf,

    /// Directory for the generated images.
    #[arg(short, long, env = "FIDUCIAL_HEATMAP_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Page oversampling factor for PDF input (1–16).
    #[arg(long, env = "FIDUCIAL_HEATMAP_OVERSAMPLE", default_value_t = 4,
          value_parser = clap::value_parser!(u32).range(1..=16))]
    oversample: u32,

    /// Format of the original: auto, raster, document. Default: from extension.
    #[arg(long, env = "FIDUCIAL_HEATMAP_ORIGINAL_FORMAT", value_enum)]
    original_format: Option<FormatArg>,

    /// Format of the copy: auto, raster, document. Default: from extension.
    #[arg(long, env = "FIDUCIAL_HEATMAP_COPY_FORMAT", value_enum)]
    copy_format: Option<FormatArg>,

    /// Colour scale: rdbu or red-white-blue.
    #[arg(long, env = "FIDUCIAL_HEATMAP_SCALE", value_enum, default_value = "rdbu")]
    scale: ScaleArg,

    /// Intensity normalisation: fixed or stretch.
    #[arg(long, env = "FIDUCIAL_HEATMAP_NORMALIZATION", value_enum, default_value = "fixed")]
    normalization: NormalizationArg,

    /// Process the two documents one after the other.
    #[arg(long, env = "FIDUCIAL_HEATMAP_SEQUENTIAL")]
    sequential: bool,

    /// Explicit pdfium library path.
    #[arg(long, env = "FIDUCIAL_HEATMAP_PDFIUM")]
    pdfium: Option<PathBuf>,

    /// Print a JSON summary to stdout.
    #[arg(long, env = "FIDUCIAL_HEATMAP_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FIDUCIAL_HEATMAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FIDUCIAL_HEATMAP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Auto,
    Raster,
    Document,
}

impl From<FormatArg> for FormatHint {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Auto => FormatHint::Auto,
            FormatArg::Raster => FormatHint::Raster,
            FormatArg::Document => FormatHint::Document,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ScaleArg {
    Rdbu,
    RedWhiteBlue,
}

impl From<ScaleArg> for ColorScale {
    fn from(v: ScaleArg) -> Self {
        match v {
            ScaleArg::Rdbu => ColorScale::RdBu,
            ScaleArg::RedWhiteBlue => ColorScale::RedWhiteBlue,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum NormalizationArg {
    Fixed,
    Stretch,
}

impl From<NormalizationArg> for Normalization {
    fn from(v: NormalizationArg) -> Self {
        match v {
            NormalizationArg::Fixed => Normalization::Fixed,
            NormalizationArg::Stretch => Normalization::Stretch,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives enough feedback on its own, so library INFO logs
    // are only shown with --verbose or when the spinner is off.
    let show_progress = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    let original = std::fs::read(&cli.original)
        .with_context(|| format!("Failed to read original {:?}", cli.original))?;
    let copy = std::fs::read(&cli.copy)
        .with_context(|| format!("Failed to read copy {:?}", cli.copy))?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Processing");
        bar.set_message("locating markers…");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let start = Instant::now();
    let outcome = process(&original, &copy, &config);
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let result = outcome.context("Pipeline failed")?;

    // ── Persist ──────────────────────────────────────────────────────────
    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", cli.out_dir))?;
    let original_files = write_side(&cli.out_dir, "original", &result.original)?;
    let copy_files = write_side(&cli.out_dir, "copy", &result.copy)?;

    if cli.json {
        let summary = serde_json::json!({
            "original": {
                "input": cli.original,
                "heatmap": original_files.0,
                "cropped": original_files.1,
                "result": result.original.summary(),
            },
            "copy": {
                "input": cli.copy,
                "heatmap": copy_files.0,
                "cropped": copy_files.1,
                "result": result.copy.summary(),
            },
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        report_side("original", &result.original, &original_files.0);
        report_side("copy", &result.copy, &copy_files.0);
        eprintln!(
            "{} done in {}ms  →  {}",
            green("✔"),
            start.elapsed().as_millis(),
            bold(&cli.out_dir.display().to_string())
        );
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`. Format hints default to the file
/// extension.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let original_format = cli
        .original_format
        .map(FormatHint::from)
        .unwrap_or_else(|| FormatHint::from_path(&cli.original));
    let copy_format = cli
        .copy_format
        .map(FormatHint::from)
        .unwrap_or_else(|| FormatHint::from_path(&cli.copy));

    let mut builder = PipelineConfig::builder()
        .oversample(cli.oversample)
        .original_format(original_format)
        .copy_format(copy_format)
        .heatmap(HeatmapStyle {
            scale: cli.scale.into(),
            normalization: cli.normalization.into(),
        })
        .parallel(!cli.sequential);

    if let Some(ref lib) = cli.pdfium {
        builder = builder.pdfium_library(lib);
    }

    builder.build().context("Invalid configuration")
}

/// Write `<side>_heatmap.png` and `<side>_cropped.png`; returns both paths.
fn write_side(dir: &Path, side: &str, doc: &DocumentResult) -> Result<(PathBuf, PathBuf)> {
    let heatmap_path = dir.join(format!("{side}_heatmap.png"));
    std::fs::write(&heatmap_path, doc.heatmap.bytes())
        .with_context(|| format!("Failed to write {:?}", heatmap_path))?;

    let cropped_path = dir.join(format!("{side}_cropped.png"));
    let png = doc
        .cropped
        .to_png_bytes()
        .with_context(|| format!("Failed to encode {side} crop"))?;
    std::fs::write(&cropped_path, png)
        .with_context(|| format!("Failed to write {:?}", cropped_path))?;

    Ok((heatmap_path, cropped_path))
}

fn report_side(side: &str, doc: &DocumentResult, heatmap_path: &Path) {
    let r = doc.marker.rect;
    let marker = if doc.marker.found {
        format!("marker {}x{} at ({}, {})", r.width, r.height, r.x, r.y)
    } else {
        yellow("no marker, whole page used")
    };
    eprintln!(
        "  {} {:<8}  {}  {}",
        green("✓"),
        side,
        marker,
        dim(&heatmap_path.display().to_string())
    );
}
