//! Excel workbooks: one table and one sheet entry per non-empty worksheet.

use std::sync::Arc;

use tracing::debug;

use super::{ensure_not_empty, has_suffix, normalize_mime, DocumentHandler, UploadedFile};
use crate::engines::SpreadsheetReader;
use crate::error::ParseError;
use crate::schema::{DocumentText, Metadata, ParsedDocument, SheetText, Table};

const MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];
const SUFFIXES: &[&str] = &[".xlsx", ".xls"];

pub struct SpreadsheetHandler {
    reader: Arc<dyn SpreadsheetReader>,
}

impl SpreadsheetHandler {
    pub fn new(reader: Arc<dyn SpreadsheetReader>) -> Self {
        Self { reader }
    }
}

/// Trimmed cells of the rows holding at least one non-blank cell.
fn kept_rows(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect()
}

impl DocumentHandler for SpreadsheetHandler {
    fn name(&self) -> &'static str {
        "calamine (ExcelParser)"
    }

    fn accepts(&self, content_type: Option<&str>, filename: &str) -> bool {
        normalize_mime(content_type).is_some_and(|m| MIME_TYPES.contains(&m.as_str()))
            || has_suffix(filename, SUFFIXES)
    }

    fn parse(&self, file: &UploadedFile) -> Result<ParsedDocument, ParseError> {
        ensure_not_empty(file)?;
        let workbook = self.reader.read(&file.data)?;

        let mut tables = Vec::new();
        let mut sheets = Vec::new();

        for sheet in &workbook.sheets {
            let mut rows = kept_rows(&sheet.rows).into_iter();
            let Some(headers) = rows.next() else {
                debug!("Sheet '{}' has no data, skipping", sheet.name);
                continue;
            };
            let rows: Vec<Vec<String>> = rows.collect();

            tables.push(Table::new(headers.clone(), rows.clone()));
            sheets.push(SheetText {
                sheet_name: sheet.name.clone(),
                headers,
                rows,
            });
        }

        debug!(
            "Workbook {}: {} of {} sheet(s) with data",
            file.file_name,
            sheets.len(),
            workbook.sheets.len()
        );

        Ok(ParsedDocument::new(
            DocumentText::Sheeted { sheets },
            tables,
            Metadata::for_upload(file, workbook.sheets.len() as u32, 0.97, self.name()),
        ))
    }
}
