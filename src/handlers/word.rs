//! Word documents: text through the universal extractor, tables from `.docx`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ensure_not_empty, has_suffix, normalize_mime, DocumentHandler, UploadedFile};
use crate::engines::{UniversalExtractor, WordTableReader};
use crate::error::ParseError;
use crate::schema::{DocumentText, Metadata, ParsedDocument, Table};

const TABLE_CONFIDENCE: f64 = 0.95;

pub struct WordHandler {
    extractor: Arc<dyn UniversalExtractor>,
    tables: Arc<dyn WordTableReader>,
}

impl WordHandler {
    pub fn new(extractor: Arc<dyn UniversalExtractor>, tables: Arc<dyn WordTableReader>) -> Self {
        Self { extractor, tables }
    }

    /// Table phase. Failures are logged and yield no tables.
    fn read_tables(&self, file: &UploadedFile) -> Vec<Table> {
        let grids = match self.tables.read_tables(&file.data) {
            Ok(grids) => grids,
            Err(e) => {
                warn!("Table extraction failed for {}: {}", file.file_name, e);
                return Vec::new();
            }
        };

        grids
            .into_iter()
            .filter(|rows| !rows.is_empty())
            .map(|mut rows| {
                let headers = rows.remove(0);
                Table::new(headers, rows).with_confidence(TABLE_CONFIDENCE)
            })
            .collect()
    }
}

impl DocumentHandler for WordHandler {
    fn name(&self) -> &'static str {
        "WordParser"
    }

    fn accepts(&self, content_type: Option<&str>, filename: &str) -> bool {
        normalize_mime(content_type).is_some_and(|m| m.contains("word"))
            || has_suffix(filename, &[".doc", ".docx"])
    }

    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        ensure_not_empty(file)?;

        let text = self
            .extractor
            .extract(&file.file_name, &file.data)?
            .trim()
            .to_string();

        let tables = if has_suffix(&file.file_name, &[".docx"]) {
            self.read_tables(file)
        } else {
            Vec::new()
        };

        debug!(
            "Word document {}: {} chars, {} table(s)",
            file.file_name,
            text.len(),
            tables.len()
        );

        Ok(ParsedDocument::new(
            DocumentText::Flat(text),
            tables,
            Metadata::for_upload(file, 1, 0.85, self.extractor.name()),
        ))
    }
}
