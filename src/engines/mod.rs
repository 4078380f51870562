//! Extraction engine capabilities.
//!
//! Handlers depend on these narrow traits rather than on concrete engines, so
//! the PDF, OCR, spreadsheet and office readers can be swapped or faked.

pub mod autodetect;
pub mod convert;
pub mod ooxml;
pub mod pdf;

#[cfg(test)]
pub mod fakes;

use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;

use crate::config::ServiceConfig;
use crate::error::{EngineError, EngineResult};
use crate::ocr::tesseract::TesseractEngine;
use crate::ocr::OcrEngine;
use crate::sheet_parser::{CalamineReader, Workbook};

pub use autodetect::AutoDetectExtractor;
pub use convert::{LegacyPresentationReader, LibreOfficeConverter};
pub use ooxml::{DocxTableReader, PptxReader};
pub use pdf::{LopdfTextExtractor, PdftoppmRasterizer};

/// Rows of cell text, in document order.
pub type Rows = Vec<Vec<String>>;

/// Embedded text of a PDF plus its page count.
#[derive(Debug, Clone)]
pub struct PdfText {
    pub page_count: u32,
    pub text: String,
}

pub trait PdfTextExtractor: Send + Sync {
    fn extract(&self, data: &[u8]) -> EngineResult<PdfText>;
}

pub trait PdfRasterizer: Send + Sync {
    /// Render one 1-based page to an RGB raster.
    fn render_page(&self, data: &[u8], page_number: u32, dpi: u32) -> EngineResult<DynamicImage>;
}

pub trait SpreadsheetReader: Send + Sync {
    fn read(&self, data: &[u8]) -> EngineResult<Workbook>;
}

pub trait PresentationReader: Send + Sync {
    fn name(&self) -> &'static str;

    /// Text of every text-bearing shape, one list per slide.
    fn read_slides(&self, data: &[u8]) -> EngineResult<Vec<Vec<String>>>;
}

pub trait WordTableReader: Send + Sync {
    /// Top-level tables as rows of trimmed cell text.
    fn read_tables(&self, data: &[u8]) -> EngineResult<Vec<Rows>>;
}

pub trait DocumentConverter: Send + Sync {
    /// Convert `data` (named `file_name`) to the format with extension `target_ext`.
    fn convert(&self, file_name: &str, data: &[u8], target_ext: &str) -> EngineResult<Vec<u8>>;
}

/// Universal parser that detects the format itself.
pub trait UniversalExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, file_name: &str, data: &[u8]) -> EngineResult<String>;

    /// MIME type guessed from the file name alone.
    fn detect(&self, file_name: &str) -> String;
}

/// Every engine the standard handlers need, created once per process.
#[derive(Clone)]
pub struct Engines {
    pub pdf_text: Arc<dyn PdfTextExtractor>,
    pub rasterizer: Arc<dyn PdfRasterizer>,
    pub ocr: Arc<dyn OcrEngine>,
    pub spreadsheet: Arc<dyn SpreadsheetReader>,
    pub presentation: Arc<dyn PresentationReader>,
    pub legacy_presentation: Arc<dyn PresentationReader>,
    pub word_tables: Arc<dyn WordTableReader>,
    pub universal: Arc<dyn UniversalExtractor>,
    pub ocr_dpi: u32,
}

impl Engines {
    pub fn from_config(config: &ServiceConfig, tessdata: Option<PathBuf>) -> Self {
        let pdf_text: Arc<dyn PdfTextExtractor> = Arc::new(LopdfTextExtractor);
        let spreadsheet: Arc<dyn SpreadsheetReader> = Arc::new(CalamineReader);
        let converter: Arc<dyn DocumentConverter> =
            Arc::new(LibreOfficeConverter::new(config.libreoffice_bin.clone()));

        Self {
            pdf_text: pdf_text.clone(),
            rasterizer: Arc::new(PdftoppmRasterizer::new(config.pdftoppm_bin.clone())),
            ocr: Arc::new(TesseractEngine::new(
                config.tesseract_bin.clone(),
                config.ocr_language.clone(),
                tessdata,
            )),
            spreadsheet: spreadsheet.clone(),
            presentation: Arc::new(PptxReader),
            legacy_presentation: Arc::new(LegacyPresentationReader::new(converter.clone())),
            word_tables: Arc::new(DocxTableReader),
            universal: Arc::new(AutoDetectExtractor::new(pdf_text, spreadsheet, converter)),
            ocr_dpi: config.ocr_dpi,
        }
    }
}

/// Map a failure to spawn an external tool.
pub(crate) fn command_error(tool: &str, err: std::io::Error) -> EngineError {
    if err.kind() == std::io::ErrorKind::NotFound {
        EngineError::Unavailable(tool.to_string())
    } else {
        EngineError::tool(tool, err.to_string())
    }
}

/// Last lines of a tool's stderr, for error messages.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(3);
    lines[start..].join(" | ")
}
