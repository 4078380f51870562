//! Plain text, CSV, HTML, XML, JSON and Markdown read verbatim as UTF-8.

use tracing::debug;

use super::{ensure_not_empty, has_suffix, normalize_mime, DocumentHandler, UploadedFile};
use crate::error::ParseError;
use crate::schema::{DocumentText, Metadata, ParsedDocument};

/// Largest accepted text upload.
pub const MAX_TEXT_BYTES: usize = 10 * 1024 * 1024;

const MIME_TYPES: &[&str] = &[
    "text/plain",
    "text/csv",
    "text/html",
    "application/xml",
    "application/json",
    "text/markdown",
];
const SUFFIXES: &[&str] = &[".txt", ".csv", ".log", ".html", ".xml", ".json", ".md"];

pub struct PlainTextHandler;

impl DocumentHandler for PlainTextHandler {
    fn name(&self) -> &'static str {
        "TextParser"
    }

    fn accepts(&self, content_type: Option<&str>, filename: &str) -> bool {
        normalize_mime(content_type).is_some_and(|m| MIME_TYPES.contains(&m.as_str()))
            || has_suffix(filename, SUFFIXES)
    }

    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        ensure_not_empty(file)?;
        if file.data.len() > MAX_TEXT_BYTES {
            return Err(ParseError::invalid(format!(
                "Text file too large: {} bytes (limit {} bytes)",
                file.data.len(),
                MAX_TEXT_BYTES
            )));
        }

        let text = normalize_lines(&String::from_utf8_lossy(&file.data));
        debug!("Read {} chars of text from {}", text.len(), file.file_name);

        Ok(ParsedDocument::new(
            DocumentText::Flat(text),
            Vec::new(),
            Metadata::for_upload(file, 1, 0.99, self.name()),
        ))
    }
}

/// Lines joined with `\n`, whatever the original terminators; one trailing
/// terminator is dropped.
fn normalize_lines(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile::new(name, Some("text/plain".to_string()), data.to_vec())
    }

    #[test]
    fn test_accepts() {
        let h = PlainTextHandler;
        assert!(h.accepts(Some("text/csv; charset=utf-8"), "data"));
        assert!(h.accepts(None, "NOTES.MD"));
        assert!(h.accepts(Some("application/octet-stream"), "server.log"));
        assert!(!h.accepts(Some("application/pdf"), "a.pdf"));
    }

    #[test]
    fn test_trailing_newline_is_normalized() {
        let doc = PlainTextHandler.parse(&upload("a.txt", b"line1\nline2\n")).unwrap();
        assert_eq!(doc.text.as_flat(), Some("line1\nline2"));
        assert_eq!(doc.metadata.page_count, 1);
        assert_eq!(doc.metadata.extraction_confidence, 0.99);
        assert_eq!(doc.metadata.extracted_by, "TextParser");
        assert!(doc.tables.is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let doc = PlainTextHandler.parse(&upload("a.txt", b"a\r\nb\rc")).unwrap();
        assert_eq!(doc.text.as_flat(), Some("a\nb\nc"));
    }

    #[test]
    fn test_rejects_oversized_text() {
        let big = vec![b'a'; MAX_TEXT_BYTES + 1];
        let err = PlainTextHandler.parse(&upload("big.txt", &big)).unwrap_err();
        assert!(matches!(err, ParseError::InvalidInput(_)));

        let limit = vec![b'a'; MAX_TEXT_BYTES];
        assert!(PlainTextHandler.parse(&upload("limit.txt", &limit)).is_ok());
    }

    #[test]
    fn test_rejects_empty_upload() {
        let err = PlainTextHandler.parse(&upload("a.txt", b"")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidInput(_)));
    }
}
