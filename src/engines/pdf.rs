//! PDF engines: embedded-text extraction (lopdf) and page rasterization (pdftoppm).

use std::process::Command;

use image::DynamicImage;
use lopdf::Document;
use tracing::debug;

use super::{command_error, stderr_tail, PdfRasterizer, PdfText, PdfTextExtractor};
use crate::error::{EngineError, EngineResult};

/// Embedded text extraction using lopdf.
pub struct LopdfTextExtractor;

impl PdfTextExtractor for LopdfTextExtractor {
    fn extract(&self, data: &[u8]) -> EngineResult<PdfText> {
        let doc = Document::load_mem(data).map_err(|e| EngineError::decode("PDF", e))?;

        let pages = doc.get_pages();
        let page_count = pages.len() as u32;
        let mut text = String::new();

        for (page_num, _) in pages {
            match doc.extract_text(&[page_num]) {
                Ok(content) => {
                    text.push_str(&content);
                    text.push('\n');
                }
                Err(e) => debug!("No extractable text on page {}: {}", page_num, e),
            }
        }

        Ok(PdfText { page_count, text })
    }
}

/// Page rasterization through poppler's `pdftoppm`.
///
/// Every call stages the document in its own temporary directory, so
/// concurrent renders never share files.
pub struct PdftoppmRasterizer {
    binary: String,
}

impl PdftoppmRasterizer {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn render_page(&self, data: &[u8], page_number: u32, dpi: u32) -> EngineResult<DynamicImage> {
        let dir = tempfile::Builder::new().prefix("pdf-render-").tempdir()?;
        let pdf_path = dir.path().join("input.pdf");
        std::fs::write(&pdf_path, data)?;

        let prefix = dir.path().join("page");
        let page = page_number.to_string();

        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-singlefile")
            .arg("-png")
            .arg(&pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| command_error(&self.binary, e))?;

        if !output.status.success() {
            return Err(EngineError::tool(&self.binary, stderr_tail(&output.stderr)));
        }

        let raster = image::open(prefix.with_extension("png")).map_err(|e| {
            EngineError::tool(&self.binary, format!("unreadable page {} raster: {}", page, e))
        })?;

        debug!(
            "Rendered page {} at {} DPI ({}x{})",
            page_number,
            dpi,
            raster.width(),
            raster.height()
        );

        Ok(DynamicImage::ImageRgb8(raster.to_rgb8()))
    }
}
