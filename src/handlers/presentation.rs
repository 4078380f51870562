//! PowerPoint decks, modern (`.pptx`) and legacy (`.ppt`).

use std::sync::Arc;

use tracing::debug;

use super::{ensure_not_empty, has_suffix, normalize_mime, DocumentHandler, UploadedFile};
use crate::engines::PresentationReader;
use crate::error::ParseError;
use crate::schema::{DocumentText, Metadata, ParsedDocument, SlideText};

const MODERN_CONFIDENCE: f64 = 0.93;
const LEGACY_CONFIDENCE: f64 = 0.90;

pub struct PresentationHandler {
    modern: Arc<dyn PresentationReader>,
    legacy: Arc<dyn PresentationReader>,
}

impl PresentationHandler {
    pub fn new(modern: Arc<dyn PresentationReader>, legacy: Arc<dyn PresentationReader>) -> Self {
        Self { modern, legacy }
    }

    /// `.pptx` reads as modern and `.ppt` as legacy. Any other name is
    /// decided by the zip signature.
    fn is_modern(file: &UploadedFile) -> bool {
        if has_suffix(&file.file_name, &[".pptx"]) {
            true
        } else if has_suffix(&file.file_name, &[".ppt"]) {
            false
        } else {
            file.data.starts_with(b"PK")
        }
    }
}

impl DocumentHandler for PresentationHandler {
    fn name(&self) -> &'static str {
        "PowerPointParser"
    }

    fn accepts(&self, content_type: Option<&str>, filename: &str) -> bool {
        has_suffix(filename, &[".pptx", ".ppt"])
            || normalize_mime(content_type)
                .is_some_and(|m| m.contains("presentation") || m.contains("powerpoint"))
    }

    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        ensure_not_empty(file)?;

        let (reader, confidence) = if Self::is_modern(file) {
            (&self.modern, MODERN_CONFIDENCE)
        } else {
            (&self.legacy, LEGACY_CONFIDENCE)
        };

        let slides: Vec<SlideText> = reader
            .read_slides(&file.data)?
            .into_iter()
            .enumerate()
            .map(|(index, shapes)| SlideText {
                slide_number: index as u32 + 1,
                text: shapes.join("\n").trim().to_string(),
            })
            .collect();

        debug!(
            "Read {} slide(s) from {} with {}",
            slides.len(),
            file.file_name,
            reader.name()
        );

        let slide_count = slides.len() as u32;
        Ok(ParsedDocument::new(
            DocumentText::Slided { slides },
            Vec::new(),
            Metadata::for_upload(file, slide_count, confidence, reader.name()),
        ))
    }
}
