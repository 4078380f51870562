//! Auto-detecting universal extractor.
//!
//! Sniffs magic bytes first and the file name second, then routes to the
//! matching reader. Anything unrecognised is read as UTF-8 text, or yields an
//! empty string when the bytes look binary.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::ooxml::{package_has_part, read_docx_text, read_pptx_slides};
use super::{DocumentConverter, PdfTextExtractor, SpreadsheetReader, UniversalExtractor};
use crate::error::EngineResult;
use crate::schema::detect_mime;
use crate::sheet_parser::Workbook;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// How many leading bytes are inspected for NUL when telling text from binary.
const BINARY_PROBE_LEN: usize = 8000;

/// Format picked by [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniffed {
    Pdf,
    Docx,
    Pptx,
    Spreadsheet,
    LegacyWord,
    LegacyPresentation,
    Html,
    Text,
    Binary,
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Identify the format of `data`, using `file_name` only to break ties.
pub fn sniff(file_name: &str, data: &[u8]) -> Sniffed {
    let ext = extension(file_name);

    if data.starts_with(PDF_MAGIC) {
        return Sniffed::Pdf;
    }

    if data.starts_with(ZIP_MAGIC) {
        if package_has_part(data, "word/document.xml") {
            return Sniffed::Docx;
        }
        if package_has_part(data, "ppt/presentation.xml") {
            return Sniffed::Pptx;
        }
        if package_has_part(data, "xl/workbook.xml")
            || package_has_part(data, "xl/workbook.bin")
            || ext == "ods"
        {
            return Sniffed::Spreadsheet;
        }
        return Sniffed::Binary;
    }

    if data.starts_with(CFB_MAGIC) {
        return match ext.as_str() {
            "xls" => Sniffed::Spreadsheet,
            "ppt" | "pps" | "pot" => Sniffed::LegacyPresentation,
            _ => Sniffed::LegacyWord,
        };
    }

    let probe = &data[..data.len().min(BINARY_PROBE_LEN)];
    if probe.contains(&0) {
        return Sniffed::Binary;
    }

    let head = String::from_utf8_lossy(&probe[..probe.len().min(512)]).to_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("<!doctype html") || head.starts_with("<html") || ext == "html" || ext == "htm" {
        return Sniffed::Html;
    }

    Sniffed::Text
}

/// Universal parser routing to the format readers.
pub struct AutoDetectExtractor {
    pdf_text: Arc<dyn PdfTextExtractor>,
    spreadsheet: Arc<dyn SpreadsheetReader>,
    converter: Arc<dyn DocumentConverter>,
}

impl AutoDetectExtractor {
    pub fn new(
        pdf_text: Arc<dyn PdfTextExtractor>,
        spreadsheet: Arc<dyn SpreadsheetReader>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Self {
        Self {
            pdf_text,
            spreadsheet,
            converter,
        }
    }
}

impl UniversalExtractor for AutoDetectExtractor {
    fn name(&self) -> &'static str {
        "AutoDetectExtractor"
    }

    fn extract(&self, file_name: &str, data: &[u8]) -> EngineResult<String> {
        let format = sniff(file_name, data);
        debug!("Auto-detected {} as {:?}", file_name, format);

        match format {
            Sniffed::Pdf => Ok(self.pdf_text.extract(data)?.text),
            Sniffed::Docx => read_docx_text(data),
            Sniffed::Pptx => Ok(slides_to_text(read_pptx_slides(data)?)),
            Sniffed::Spreadsheet => Ok(workbook_to_text(&self.spreadsheet.read(data)?)),
            Sniffed::LegacyWord => {
                let docx = self.converter.convert(file_name, data, "docx")?;
                read_docx_text(&docx)
            }
            Sniffed::LegacyPresentation => {
                let pptx = self.converter.convert(file_name, data, "pptx")?;
                Ok(slides_to_text(read_pptx_slides(&pptx)?))
            }
            Sniffed::Html => Ok(html_to_text(&decode_text(data))),
            Sniffed::Text => Ok(decode_text(data)),
            Sniffed::Binary => Ok(String::new()),
        }
    }

    fn detect(&self, file_name: &str) -> String {
        detect_mime(file_name)
    }
}

fn decode_text(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

/// Shapes within a slide on separate lines, slides separated by a blank line.
fn slides_to_text(slides: Vec<Vec<String>>) -> String {
    slides
        .into_iter()
        .map(|shapes| shapes.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Each sheet as its name followed by tab-separated rows.
fn workbook_to_text(workbook: &Workbook) -> String {
    let mut out = String::new();
    for sheet in &workbook.sheets {
        out.push_str(&sheet.name);
        out.push('\n');
        for row in &sheet.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

// ============================================================================
// HTML
// ============================================================================

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "head", "template"];
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "h1", "h2", "h3", "h4", "h5", "h6", "br", "li", "tr", "td",
    "th", "pre", "blockquote",
];

fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());

    let raw = match body {
        Some(body) => element_text(&body),
        None => element_text(&document.root_element()),
    };

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Walk the subtree with an explicit stack; nesting depth is bounded only by
/// the upload size.
fn element_text(element: &ElementRef<'_>) -> String {
    enum Step {
        Enter,
        CloseBlock,
    }

    let mut text = String::new();
    let mut stack: Vec<_> = element.children().rev().map(|node| (node, Step::Enter)).collect();

    while let Some((node, step)) = stack.pop() {
        if let Step::CloseBlock = step {
            text.push('\n');
            continue;
        }

        if let Some(child) = ElementRef::wrap(node) {
            let tag = child.value().name();
            if SKIPPED_TAGS.contains(&tag) {
                continue;
            }
            if BLOCK_TAGS.contains(&tag) {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                stack.push((node, Step::CloseBlock));
            }
            stack.extend(node.children().rev().map(|inner| (inner, Step::Enter)));
        } else if let Some(fragment) = node.value().as_text() {
            text.push_str(fragment);
        }
    }

    text
}
