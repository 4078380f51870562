//! Format handlers.
//!
//! Each handler answers two questions: does it accept a (MIME, filename) pair,
//! and how does it turn the uploaded bytes into a [`ParsedDocument`].

pub mod fallback;
pub mod image;
pub mod pdf;
pub mod presentation;
pub mod spreadsheet;
pub mod text;
pub mod word;

use crate::error::ParseError;
use crate::schema::ParsedDocument;

pub use fallback::FallbackHandler;
pub use self::image::ImageHandler;
pub use pdf::PdfHandler;
pub use presentation::PresentationHandler;
pub use spreadsheet::SpreadsheetHandler;
pub use text::PlainTextHandler;
pub use word::WordHandler;

/// An uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    /// Content type as reported by the client, if any.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Contract every format handler fulfils.
///
/// Handlers are created once and shared across request workers, so they must
/// be `Send + Sync` and keep no per-request state.
pub trait DocumentHandler: Send + Sync {
    /// Stable identity, used in logs.
    fn name(&self) -> &'static str;

    /// Pure, cheap acceptance predicate.
    fn accepts(&self, content_type: Option<&str>, filename: &str) -> bool;

    /// Parse the upload into the unified model.
    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError>;
}

// ============================================================================
// Matching helpers
// ============================================================================

/// Strip MIME parameters (`; charset=...`) and lower-case the essence.
pub fn normalize_mime(content_type: Option<&str>) -> Option<String> {
    let essence = content_type?.split(';').next()?.trim().to_lowercase();
    if essence.is_empty() {
        None
    } else {
        Some(essence)
    }
}

/// Case-insensitive suffix match against a list like `[".txt", ".md"]`.
pub fn has_suffix(filename: &str, suffixes: &[&str]) -> bool {
    let lower = filename.to_lowercase();
    suffixes.iter().any(|s| lower.ends_with(s))
}

/// Reject empty uploads up front.
pub fn ensure_not_empty(file: &UploadedFile) -> Result<(), ParseError> {
    if file.is_empty() {
        return Err(ParseError::invalid(format!(
            "Uploaded file is empty or invalid: {}",
            file.file_name
        )));
    }
    Ok(())
}
