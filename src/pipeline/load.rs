//! Input decoding: bytes of unknown format → 8-bit RGB [`PixelBuffer`].
//!
//! Two decoders share the [`Decoder`] contract:
//!
//! * [`RasterDecoder`] — PNG/JPEG/BMP/TIFF/GIF via the `image` crate, at
//!   native resolution. Multi-frame formats yield their first frame.
//! * [`DocumentDecoder`] — PDF via pdfium. Only page 1 is rasterised, scaled
//!   by the oversampling factor (pdfium's intrinsic resolution is 72 px per
//!   inch, so `oversample = 4` renders at 288 dpi).
//!
//! ## Why a process-wide lock for documents?
//!
//! pdfium is a single native library instance with global state. Binding and
//! rendering are therefore serialised behind [`ENGINE_LOCK`]; when both
//! pipeline branches receive PDFs the second one waits for the first page
//! render to finish. Raster decoding never takes the lock.

use crate::buffer::PixelBuffer;
use crate::config::{check_oversample, FormatHint};
use crate::error::HeatmapError;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Environment variable naming a pdfium library file (or its directory).
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// How far into the input a `%PDF-` header may appear.
const PDF_HEADER_WINDOW: usize = 1024;

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// Turns encoded input bytes into an RGB pixel buffer.
pub trait Decoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Decode `bytes`. `oversample` only affects vector/document input.
    fn decode(&self, bytes: &[u8], oversample: u32) -> Result<PixelBuffer, HeatmapError>;
}

/// Decoder for single raster images.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterDecoder;

impl Decoder for RasterDecoder {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn decode(&self, bytes: &[u8], _oversample: u32) -> Result<PixelBuffer, HeatmapError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| HeatmapError::decode(format!("raster image: {e}")))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(HeatmapError::decode("raster image has zero width or height"));
        }
        Ok(PixelBuffer::from_dynamic(image))
    }
}

/// Decoder for paginated documents, backed by pdfium.
#[derive(Debug, Default, Clone)]
pub struct DocumentDecoder {
    library: Option<PathBuf>,
}

impl DocumentDecoder {
    /// `library` overrides `PDFIUM_LIB_PATH` and the system search path.
    pub fn new(library: Option<PathBuf>) -> Self {
        Self { library }
    }
}

impl Decoder for DocumentDecoder {
    fn name(&self) -> &'static str {
        "document"
    }

    fn decode(&self, bytes: &[u8], oversample: u32) -> Result<PixelBuffer, HeatmapError> {
        // A poisoned lock only means another render panicked; pdfium itself
        // is re-bound below, so the guard is still usable.
        let _guard = ENGINE_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let pdfium = bind_engine(self.library.as_deref())?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| HeatmapError::decode(format!("document: {:?}", e)))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        if total_pages == 0 {
            return Err(HeatmapError::EmptyDocument);
        }
        if total_pages > 1 {
            debug!("Document has {} pages; rendering page 1 only", total_pages);
        }

        let page = pages
            .get(0)
            .map_err(|e| HeatmapError::decode(format!("page 1: {:?}", e)))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(oversample as f32);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| HeatmapError::decode(format!("rasterising page 1: {:?}", e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page 1 at {}x → {}x{} px",
            oversample,
            image.width(),
            image.height()
        );
        if image.width() == 0 || image.height() == 0 {
            return Err(HeatmapError::decode("page 1 rendered to an empty bitmap"));
        }

        Ok(PixelBuffer::from_dynamic(image))
    }
}

/// Bind pdfium from an explicit path, `PDFIUM_LIB_PATH`, or the system
/// library search path, in that order. Directory paths are completed with the
/// platform library name.
fn bind_engine(explicit: Option<&Path>) -> Result<Pdfium, HeatmapError> {
    let configured = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_ENV).map(PathBuf::from));

    let bindings = match configured {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(Pdfium::pdfium_platform_library_name())
            } else {
                path
            };
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path).map_err(|e| {
                HeatmapError::EngineUnavailable(format!("{}: {}", path.display(), e))
            })?
        }
        None => Pdfium::bind_to_system_library()
            .map_err(|e| HeatmapError::EngineUnavailable(e.to_string()))?,
    };

    Ok(Pdfium::new(bindings))
}

/// Guess the input format from its leading bytes.
///
/// A raster signature at offset 0 wins over a `%PDF-` marker further in,
/// since image metadata (JPEG comments, PNG text chunks) may quote one.
/// Returns `None` when the bytes match neither.
pub fn sniff(bytes: &[u8]) -> Option<FormatHint> {
    if image::guess_format(bytes).is_ok() {
        return Some(FormatHint::Raster);
    }
    let head = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    if head.windows(5).any(|w| w == b"%PDF-") {
        return Some(FormatHint::Document);
    }
    None
}

/// Entry point for the loading stage.
///
/// Holds the pdfium location so the orchestrator can thread one setting
/// through both branches.
#[derive(Debug, Default, Clone)]
pub struct Loader {
    pdfium_library: Option<PathBuf>,
}

impl Loader {
    pub fn new(pdfium_library: Option<PathBuf>) -> Self {
        Self { pdfium_library }
    }

    /// Pick the decoder for `hint`, sniffing `bytes` when the hint is `Auto`.
    pub fn decoder_for(
        &self,
        hint: FormatHint,
        bytes: &[u8],
    ) -> Result<Box<dyn Decoder>, HeatmapError> {
        let resolved = match hint {
            FormatHint::Auto => sniff(bytes).ok_or_else(|| {
                let mut magic = [0u8; 4];
                let n = bytes.len().min(4);
                magic[..n].copy_from_slice(&bytes[..n]);
                HeatmapError::decode(format!(
                    "unrecognised format ({} bytes, first bytes {:?})",
                    bytes.len(),
                    magic
                ))
            })?,
            explicit => explicit,
        };

        Ok(match resolved {
            FormatHint::Document => Box::new(DocumentDecoder::new(self.pdfium_library.clone())),
            _ => Box::new(RasterDecoder),
        })
    }

    /// Decode `bytes` into a 3-channel buffer.
    pub fn load(
        &self,
        bytes: &[u8],
        hint: FormatHint,
        oversample: u32,
    ) -> Result<PixelBuffer, HeatmapError> {
        check_oversample(oversample)?;
        if bytes.is_empty() {
            return Err(HeatmapError::decode("input is empty"));
        }

        let decoder = self.decoder_for(hint, bytes)?;
        let buffer = decoder.decode(bytes, oversample)?;
        info!(
            "Loaded {} input ({} bytes) → {}x{} px",
            decoder.name(),
            bytes.len(),
            buffer.width(),
            buffer.height()
        );
        Ok(buffer)
    }

    /// Read the whole stream, then [`Loader::load`] it.
    pub fn load_reader(
        &self,
        mut reader: impl Read,
        hint: FormatHint,
        oversample: u32,
    ) -> Result<PixelBuffer, HeatmapError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| HeatmapError::decode(format!("reading input stream: {e}")))?;
        self.load(&bytes, hint, oversample)
    }
}

/// Decode with the default pdfium lookup.
pub fn load(bytes: &[u8], hint: FormatHint, oversample: u32) -> Result<PixelBuffer, HeatmapError> {
    Loader::default().load(bytes, hint, oversample)
}

/// Decode a readable stream with the default pdfium lookup.
pub fn load_reader(
    reader: impl Read,
    hint: FormatHint,
    oversample: u32,
) -> Result<PixelBuffer, HeatmapError> {
    Loader::default().load_reader(reader, hint, oversample)
}
