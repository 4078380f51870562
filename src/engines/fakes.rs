//! Test doubles for every engine capability.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::DynamicImage;

use super::{
    DocumentConverter, Engines, PdfRasterizer, PdfText, PdfTextExtractor, PresentationReader,
    Rows, SpreadsheetReader, UniversalExtractor, WordTableReader,
};
use crate::error::{EngineError, EngineResult};
use crate::ocr::OcrEngine;
use crate::schema::detect_mime;
use crate::sheet_parser::Workbook;

pub struct FakePdfText {
    page_count: u32,
    text: Option<String>,
}

impl FakePdfText {
    pub fn with_text(page_count: u32, text: &str) -> Self {
        Self {
            page_count,
            text: Some(text.to_string()),
        }
    }

    pub fn corrupt() -> Self {
        Self {
            page_count: 0,
            text: None,
        }
    }
}

impl PdfTextExtractor for FakePdfText {
    fn extract(&self, _data: &[u8]) -> EngineResult<PdfText> {
        match &self.text {
            Some(text) => Ok(PdfText {
                page_count: self.page_count,
                text: text.clone(),
            }),
            None => Err(EngineError::decode("PDF", "not a PDF")),
        }
    }
}

/// Renders blank pages, failing on the listed page numbers.
#[derive(Default)]
pub struct FakeRasterizer {
    pub calls: AtomicUsize,
    failing_pages: Vec<u32>,
}

impl FakeRasterizer {
    pub fn failing_on(pages: &[u32]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing_pages: pages.to_vec(),
        }
    }
}

impl PdfRasterizer for FakeRasterizer {
    fn render_page(&self, _data: &[u8], page_number: u32, _dpi: u32) -> EngineResult<DynamicImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_pages.contains(&page_number) {
            return Err(EngineError::tool("fake-render", format!("page {} broke", page_number)));
        }
        Ok(DynamicImage::new_rgb8(4, 4))
    }
}

/// Returns a fixed text (or fails), counting invocations.
pub struct FakeOcr {
    pub calls: AtomicUsize,
    text: Option<String>,
}

impl FakeOcr {
    pub fn returning(text: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            text: None,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for FakeOcr {
    fn name(&self) -> &'static str {
        "Fake OCR"
    }

    fn recognize(&self, _image: &DynamicImage) -> EngineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| EngineError::tool("fake-ocr", "no language data"))
    }
}

pub struct FakeSpreadsheet {
    workbook: Option<Workbook>,
}

impl FakeSpreadsheet {
    pub fn returning(workbook: Workbook) -> Self {
        Self {
            workbook: Some(workbook),
        }
    }

    pub fn corrupt() -> Self {
        Self { workbook: None }
    }
}

impl SpreadsheetReader for FakeSpreadsheet {
    fn read(&self, _data: &[u8]) -> EngineResult<Workbook> {
        self.workbook
            .clone()
            .ok_or_else(|| EngineError::decode("spreadsheet", "not a workbook"))
    }
}

pub struct FakePresentation {
    name: &'static str,
    slides: Vec<Vec<String>>,
}

impl FakePresentation {
    pub fn new(name: &'static str, slides: &[&[&str]]) -> Self {
        Self {
            name,
            slides: slides
                .iter()
                .map(|shapes| shapes.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }
}

impl PresentationReader for FakePresentation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn read_slides(&self, _data: &[u8]) -> EngineResult<Vec<Vec<String>>> {
        Ok(self.slides.clone())
    }
}

pub struct FakeWordTables {
    pub calls: AtomicUsize,
    tables: Option<Vec<Rows>>,
}

impl FakeWordTables {
    pub fn returning(tables: Vec<Rows>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            tables: Some(tables),
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            tables: None,
        }
    }
}

impl WordTableReader for FakeWordTables {
    fn read_tables(&self, _data: &[u8]) -> EngineResult<Vec<Rows>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables
            .clone()
            .ok_or_else(|| EngineError::decode("DOCX", "broken table grid"))
    }
}

pub struct FakeUniversal {
    text: Result<String, String>,
}

impl FakeUniversal {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            text: Err(message.to_string()),
        }
    }
}

impl UniversalExtractor for FakeUniversal {
    fn name(&self) -> &'static str {
        "FakeUniversal"
    }

    fn extract(&self, _file_name: &str, _data: &[u8]) -> EngineResult<String> {
        self.text
            .clone()
            .map_err(|message| EngineError::tool("fake-universal", message))
    }

    fn detect(&self, file_name: &str) -> String {
        detect_mime(file_name)
    }
}

pub struct FakeConverter {
    output: Option<Vec<u8>>,
}

impl FakeConverter {
    pub fn returning(output: Vec<u8>) -> Self {
        Self {
            output: Some(output),
        }
    }

    pub fn unavailable() -> Self {
        Self { output: None }
    }
}

impl DocumentConverter for FakeConverter {
    fn convert(&self, _file_name: &str, _data: &[u8], _target_ext: &str) -> EngineResult<Vec<u8>> {
        self.output
            .clone()
            .ok_or_else(|| EngineError::Unavailable("fake-soffice".to_string()))
    }
}

/// Engines where nothing touches the host: PDFs carry embedded text, OCR
/// returns a fixed string, office readers return canned content.
pub fn fake_engines() -> Engines {
    Engines {
        pdf_text: Arc::new(FakePdfText::with_text(1, "embedded text")),
        rasterizer: Arc::new(FakeRasterizer::default()),
        ocr: Arc::new(FakeOcr::returning("ocr text")),
        spreadsheet: Arc::new(FakeSpreadsheet::returning(Workbook::default())),
        presentation: Arc::new(FakePresentation::new("fake-pptx", &[])),
        legacy_presentation: Arc::new(FakePresentation::new("fake-ppt", &[])),
        word_tables: Arc::new(FakeWordTables::returning(Vec::new())),
        universal: Arc::new(FakeUniversal::returning("universal text")),
        ocr_dpi: 300,
    }
}
