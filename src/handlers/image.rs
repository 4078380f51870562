//! Raster images, read with OCR.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ensure_not_empty, has_suffix, normalize_mime, DocumentHandler, UploadedFile};
use crate::error::ParseError;
use crate::ocr::OcrEngine;
use crate::schema::{DocumentText, Metadata, ParsedDocument};

const MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "image/tiff", "image/bmp"];
const SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".tif", ".bmp"];

pub struct ImageHandler {
    ocr: Arc<dyn OcrEngine>,
}

impl ImageHandler {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl DocumentHandler for ImageHandler {
    fn name(&self) -> &'static str {
        "ImageParser"
    }

    fn accepts(&self, content_type: Option<&str>, filename: &str) -> bool {
        normalize_mime(content_type).is_some_and(|m| MIME_TYPES.contains(&m.as_str()))
            || has_suffix(filename, SUFFIXES)
    }

    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        ensure_not_empty(file)?;

        let image = ::image::load_from_memory(&file.data).map_err(|e| {
            debug!("Image decode failed for {}: {}", file.file_name, e);
            ParseError::invalid(format!("Unsupported or corrupt image file: {}", file.file_name))
        })?;

        // OCR failure degrades to empty text.
        let text = match self.ocr.recognize(&image) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("OCR failed for {}: {}", file.file_name, e);
                String::new()
            }
        };

        Ok(ParsedDocument::new(
            DocumentText::single_page(text),
            Vec::new(),
            Metadata::for_upload(file, 1, 0.85, self.ocr.name()),
        ))
    }
}
