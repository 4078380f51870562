//! Unified document model returned by every handler.
//!
//! Field names serialize in camelCase to match the public JSON contract.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::handlers::UploadedFile;

/// Generate ISO8601 timestamp (UTC, `Z` suffix) for the current instant.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Root parse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub text: DocumentText,
    #[serde(default)]
    pub tables: Vec<Table>,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_images: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

impl ParsedDocument {
    pub fn new(text: DocumentText, tables: Vec<Table>, metadata: Metadata) -> Self {
        Self {
            text,
            tables,
            metadata,
            extracted_images: None,
            issues: None,
        }
    }

    /// Attach non-fatal warnings; an empty list leaves `issues` absent.
    pub fn with_issues(mut self, issues: Vec<String>) -> Self {
        if !issues.is_empty() {
            self.issues = Some(issues);
        }
        self
    }
}

/// The polymorphic `text` field. The producing handler picks the shape.
///
/// Serialized without a tag: `Flat` is a bare JSON string, the others are
/// objects keyed by `pages`, `sheets` or `slides`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentText {
    Flat(String),
    Paged { pages: Vec<PageText> },
    Sheeted { sheets: Vec<SheetText> },
    Slided { slides: Vec<SlideText> },
}

impl DocumentText {
    /// A paged shape holding one page with the whole text.
    pub fn single_page(text: String) -> Self {
        Self::Paged {
            pages: vec![PageText {
                page_number: 1,
                text,
                tables: Vec::new(),
            }],
        }
    }

    #[cfg(test)]
    pub fn as_flat(&self) -> Option<&str> {
        match self {
            Self::Flat(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetText {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideText {
    pub slide_number: u32,
    pub text: String,
}

/// Tabular data. Rows may be ragged relative to the headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub structured_rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub confidence_score: f64,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            table_name: None,
            headers,
            rows,
            structured_rows: Vec::new(),
            confidence_score: 0.0,
        }
    }

    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence_score = score.clamp(0.0, 1.0);
        self
    }
}

/// File-level provenance. All seven fields are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub page_count: u32,
    pub extraction_confidence: f64,
    pub extracted_by: String,
    pub parse_date: String,
}

impl Metadata {
    /// Metadata for `file`, stamped with the current instant.
    ///
    /// `fileType` is the reported content type, or detected from the file
    /// name when the client sent none.
    pub fn for_upload(
        file: &UploadedFile,
        page_count: u32,
        confidence: f64,
        extracted_by: &str,
    ) -> Self {
        let file_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| detect_mime(&file.file_name));
        Self::with_file_type(file, file_type, page_count, confidence, extracted_by)
    }

    pub fn with_file_type(
        file: &UploadedFile,
        file_type: String,
        page_count: u32,
        confidence: f64,
        extracted_by: &str,
    ) -> Self {
        Self {
            file_name: file.file_name.clone(),
            file_type,
            file_size: file.size(),
            page_count: page_count.max(1),
            extraction_confidence: confidence.clamp(0.0, 1.0),
            extracted_by: extracted_by.to_string(),
            parse_date: now_iso8601(),
        }
    }
}

/// Guess a MIME type from a file name.
pub fn detect_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
