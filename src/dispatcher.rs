//! Ordered handler registry.
//!
//! The first handler whose predicate accepts a (content type, file name) pair
//! wins. The catch-all fallback is registered last, so with the standard
//! registry every upload finds a handler.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engines::Engines;
use crate::error::ParseError;
use crate::handlers::{
    DocumentHandler, FallbackHandler, ImageHandler, PdfHandler, PlainTextHandler,
    PresentationHandler, SpreadsheetHandler, UploadedFile, WordHandler,
};
use crate::schema::ParsedDocument;

/// Handler families known to the standard registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    PlainText,
    Spreadsheet,
    Presentation,
    Word,
    Pdf,
    Image,
    Fallback,
}

/// Standard registration order; specific handlers first, fallback last.
pub const REGISTRATION_ORDER: [HandlerKind; 7] = [
    HandlerKind::PlainText,
    HandlerKind::Spreadsheet,
    HandlerKind::Presentation,
    HandlerKind::Word,
    HandlerKind::Pdf,
    HandlerKind::Image,
    HandlerKind::Fallback,
];

impl HandlerKind {
    fn build(self, engines: &Engines) -> Arc<dyn DocumentHandler> {
        match self {
            Self::PlainText => Arc::new(PlainTextHandler),
            Self::Spreadsheet => Arc::new(SpreadsheetHandler::new(engines.spreadsheet.clone())),
            Self::Presentation => Arc::new(PresentationHandler::new(
                engines.presentation.clone(),
                engines.legacy_presentation.clone(),
            )),
            Self::Word => Arc::new(WordHandler::new(
                engines.universal.clone(),
                engines.word_tables.clone(),
            )),
            Self::Pdf => Arc::new(PdfHandler::new(
                engines.pdf_text.clone(),
                engines.rasterizer.clone(),
                engines.ocr.clone(),
                engines.ocr_dpi,
            )),
            Self::Image => Arc::new(ImageHandler::new(engines.ocr.clone())),
            Self::Fallback => Arc::new(FallbackHandler::new(engines.universal.clone())),
        }
    }
}

pub struct Registry {
    handlers: Vec<Arc<dyn DocumentHandler>>,
}

impl Registry {
    pub fn new(handlers: Vec<Arc<dyn DocumentHandler>>) -> Self {
        Self { handlers }
    }

    /// All seven handlers in [`REGISTRATION_ORDER`].
    pub fn standard(engines: &Engines) -> Self {
        Self::new(
            REGISTRATION_ORDER
                .iter()
                .map(|kind| kind.build(engines))
                .collect(),
        )
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// First handler accepting the pair. A panicking predicate counts as a refusal.
    pub fn select(
        &self,
        content_type: Option<&str>,
        filename: &str,
    ) -> Result<&dyn DocumentHandler, ParseError> {
        if filename.trim().is_empty() {
            return Err(ParseError::invalid("Filename cannot be null or empty"));
        }

        for handler in &self.handlers {
            let accepted = catch_unwind(AssertUnwindSafe(|| {
                handler.accepts(content_type, filename)
            }));
            match accepted {
                Ok(true) => return Ok(handler.as_ref()),
                Ok(false) => {}
                Err(_) => warn!(
                    "Handler {} panicked while matching {}; skipping",
                    handler.name(),
                    filename
                ),
            }
        }

        Err(ParseError::unsupported(format!(
            "No handler accepts {} ({})",
            filename,
            content_type.unwrap_or("no content type")
        )))
    }

    /// Select a handler for `file` and run it.
    pub fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        let handler = self.select(file.content_type.as_deref(), &file.file_name)?;
        debug!("Dispatching {} to {}", file.file_name, handler.name());

        let started = Instant::now();
        let document = handler.parse(file)?;
        info!(
            "{} parsed {} ({} bytes) in {:?}",
            handler.name(),
            file.file_name,
            file.size(),
            started.elapsed()
        );
        Ok(document)
    }
}
