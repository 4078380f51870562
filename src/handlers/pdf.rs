//! PDF documents: embedded text first, OCR of rendered pages when there is none.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{ensure_not_empty, has_suffix, normalize_mime, DocumentHandler, UploadedFile};
use crate::engines::{PdfRasterizer, PdfTextExtractor};
use crate::error::ParseError;
use crate::ocr::OcrEngine;
use crate::schema::{DocumentText, Metadata, ParsedDocument};

pub struct PdfHandler {
    text: Arc<dyn PdfTextExtractor>,
    rasterizer: Arc<dyn PdfRasterizer>,
    ocr: Arc<dyn OcrEngine>,
    dpi: u32,
}

impl PdfHandler {
    pub fn new(
        text: Arc<dyn PdfTextExtractor>,
        rasterizer: Arc<dyn PdfRasterizer>,
        ocr: Arc<dyn OcrEngine>,
        dpi: u32,
    ) -> Self {
        Self {
            text,
            rasterizer,
            ocr,
            dpi,
        }
    }

    /// OCR every page, returning the marked-up text and per-page problems.
    fn ocr_pages(&self, file: &UploadedFile, page_count: u32) -> (String, Vec<String>) {
        let mut text = String::new();
        let mut issues = Vec::new();

        for page in 1..=page_count {
            let raster = match self.rasterizer.render_page(&file.data, page, self.dpi) {
                Ok(raster) => raster,
                Err(e) => {
                    warn!("Page {} of {} could not be rendered: {}", page, file.file_name, e);
                    issues.push(format!("OCR failed on page {}: {}", page, e));
                    continue;
                }
            };

            match self.ocr.recognize(&raster) {
                Ok(page_text) => {
                    text.push_str(&format!("\n=== OCR Page {} ===\n", page));
                    text.push_str(page_text.trim());
                    text.push('\n');
                }
                Err(e) => {
                    warn!("OCR failed on page {} of {}: {}", page, file.file_name, e);
                    issues.push(format!("OCR failed on page {}: {}", page, e));
                }
            }
        }

        (text, issues)
    }
}

impl DocumentHandler for PdfHandler {
    fn name(&self) -> &'static str {
        "PdfParser"
    }

    fn accepts(&self, content_type: Option<&str>, filename: &str) -> bool {
        normalize_mime(content_type).is_some_and(|m| m == "application/pdf")
            || has_suffix(filename, &[".pdf"])
    }

    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        ensure_not_empty(file)?;

        let extracted = self.text.extract(&file.data)?;
        let page_count = extracted.page_count;
        let embedded = extracted.text.trim();

        let (text, issues) = if !embedded.is_empty() {
            debug!(
                "PDF {}: {} chars of embedded text over {} page(s)",
                file.file_name,
                embedded.len(),
                page_count
            );
            (embedded.to_string(), Vec::new())
        } else {
            info!(
                "PDF {} has no text layer, running OCR on {} page(s) at {} DPI",
                file.file_name, page_count, self.dpi
            );
            let (ocr_text, issues) = self.ocr_pages(file, page_count);
            (ocr_text.trim().to_string(), issues)
        };

        Ok(ParsedDocument::new(
            DocumentText::single_page(text),
            Vec::new(),
            Metadata::for_upload(file, page_count, 0.95, "lopdf + Tesseract OCR"),
        )
        .with_issues(issues))
    }
}
