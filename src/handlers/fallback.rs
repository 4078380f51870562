//! Catch-all handler backed by the auto-detecting extractor.

use std::sync::Arc;

use tracing::warn;

use super::{ensure_not_empty, DocumentHandler, UploadedFile};
use crate::engines::UniversalExtractor;
use crate::error::ParseError;
use crate::schema::{DocumentText, Metadata, ParsedDocument};

pub struct FallbackHandler {
    extractor: Arc<dyn UniversalExtractor>,
}

impl FallbackHandler {
    pub fn new(extractor: Arc<dyn UniversalExtractor>) -> Self {
        Self { extractor }
    }
}

impl DocumentHandler for FallbackHandler {
    fn name(&self) -> &'static str {
        "TikaParser"
    }

    fn accepts(&self, _content_type: Option<&str>, _filename: &str) -> bool {
        true
    }

    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        ensure_not_empty(file)?;

        let engine = self.extractor.name();
        let text = match self.extractor.extract(&file.file_name, &file.data) {
            Ok(text) => text,
            Err(e) => {
                warn!("{} could not parse {}: {}", engine, file.file_name, e);
                format!("[{} failed to parse content: {}]", engine, e)
            }
        };

        let confidence = if text.trim().is_empty() { 0.70 } else { 0.85 };
        // Type comes from the name, not from the reported content type.
        let file_type = self.extractor.detect(&file.file_name);

        Ok(ParsedDocument::new(
            DocumentText::Flat(text),
            Vec::new(),
            Metadata::with_file_type(file, file_type, 1, confidence, engine),
        ))
    }
}
