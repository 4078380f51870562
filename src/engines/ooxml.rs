//! Office Open XML readers: PowerPoint slides, Word body text and Word tables.
//!
//! Packages are opened with `zip`; parts are streamed through `quick-xml`.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{PresentationReader, Rows, WordTableReader};
use crate::error::{EngineError, EngineResult};

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open_archive<'a>(data: &'a [u8], format: &'static str) -> EngineResult<Archive<'a>> {
    ZipArchive::new(Cursor::new(data)).map_err(|e| EngineError::decode(format, e))
}

/// Largest inflated size accepted for a single package part.
const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

/// Read a package part as UTF-8; `None` when the part does not exist.
fn read_part(
    archive: &mut Archive<'_>,
    name: &str,
    format: &'static str,
) -> EngineResult<Option<String>> {
    read_part_limited(archive, name, format, MAX_PART_BYTES)
}

/// Like [`read_part`], failing once the part inflates past `limit` bytes,
/// whatever size the archive header declares.
fn read_part_limited(
    archive: &mut Archive<'_>,
    name: &str,
    format: &'static str,
    limit: u64,
) -> EngineResult<Option<String>> {
    let file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(EngineError::decode(format, e)),
    };
    if file.size() > limit {
        return Err(EngineError::decode(
            format,
            format!("{}: part exceeds {} bytes", name, limit),
        ));
    }

    let mut xml = String::new();
    file.take(limit + 1)
        .read_to_string(&mut xml)
        .map_err(|e| EngineError::decode(format, format!("{}: {}", name, e)))?;
    if xml.len() as u64 > limit {
        return Err(EngineError::decode(
            format,
            format!("{}: part exceeds {} bytes", name, limit),
        ));
    }
    Ok(Some(xml))
}

/// Value of an attribute matched by local name, prefixed (`r:id`) or not (`Id`).
fn attribute(element: &BytesStart<'_>, local: &[u8], prefixed: bool) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local && a.key.prefix().is_some() == prefixed)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

// ============================================================================
// PresentationML
// ============================================================================

/// Reader for `.pptx` packages.
pub struct PptxReader;

impl PresentationReader for PptxReader {
    fn name(&self) -> &'static str {
        "quick-xml (PresentationML)"
    }

    fn read_slides(&self, data: &[u8]) -> EngineResult<Vec<Vec<String>>> {
        read_pptx_slides(data)
    }
}

/// Shape texts of every slide, in presentation order.
pub fn read_pptx_slides(data: &[u8]) -> EngineResult<Vec<Vec<String>>> {
    let mut archive = open_archive(data, "PPTX")?;
    let parts = slide_parts(&mut archive)?;

    let mut slides = Vec::with_capacity(parts.len());
    for part in parts {
        let xml = read_part(&mut archive, &part, "PPTX")?.ok_or_else(|| {
            EngineError::decode("PPTX", format!("missing slide part {}", part))
        })?;
        slides.push(slide_shape_texts(&xml)?);
    }
    Ok(slides)
}

/// Slide part names, ordered by the presentation's slide id list.
///
/// Falls back to numeric `slideN.xml` order when the list cannot be resolved.
fn slide_parts(archive: &mut Archive<'_>) -> EngineResult<Vec<String>> {
    let presentation = read_part(archive, "ppt/presentation.xml", "PPTX")?
        .ok_or_else(|| EngineError::decode("PPTX", "missing ppt/presentation.xml"))?;
    let slide_ids = slide_relationship_ids(&presentation)?;

    let targets = match read_part(archive, "ppt/_rels/presentation.xml.rels", "PPTX")? {
        Some(rels) => relationship_targets(&rels)?,
        None => HashMap::new(),
    };

    let ordered: Vec<String> = slide_ids
        .iter()
        .filter_map(|id| targets.get(id))
        .map(|target| resolve_target("ppt", target))
        .collect();
    if !ordered.is_empty() {
        return Ok(ordered);
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

fn slide_relationship_ids(xml: &str) -> EngineResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event().map_err(|e| EngineError::decode("PPTX", e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(id) = attribute(&e, b"id", true) {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

fn relationship_targets(xml: &str) -> EngineResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event().map_err(|e| EngineError::decode("PPTX", e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attribute(&e, b"Id", false), attribute(&e, b"Target", false))
                {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Trimmed, non-empty text of each shape on a slide, in drawing order.
///
/// Paragraphs inside a shape are separated by `\n`. Graphic frames (tables,
/// charts) are not text shapes and are skipped.
fn slide_shape_texts(xml: &str) -> EngineResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();
    let mut shape: Option<String> = None;
    let mut paragraphs = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| EngineError::decode("PPTX slide", e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => {
                    shape = Some(String::new());
                    paragraphs = 0;
                }
                b"p" => {
                    if let Some(buf) = shape.as_mut() {
                        if paragraphs > 0 {
                            buf.push('\n');
                        }
                        paragraphs += 1;
                    }
                }
                b"t" => in_text = shape.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(buf) = shape.as_mut() {
                        if paragraphs > 0 {
                            buf.push('\n');
                        }
                        paragraphs += 1;
                    }
                }
                b"br" => {
                    if let Some(buf) = shape.as_mut() {
                        buf.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(buf) = shape.as_mut() {
                        let text = t.unescape().map_err(|e| EngineError::decode("PPTX slide", e))?;
                        buf.push_str(&text);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"sp" => {
                    if let Some(buf) = shape.take() {
                        let trimmed = buf.trim();
                        if !trimmed.is_empty() {
                            shapes.push(trimmed.to_string());
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(shapes)
}

// ============================================================================
// WordprocessingML
// ============================================================================

fn document_xml(data: &[u8]) -> EngineResult<String> {
    let mut archive = open_archive(data, "DOCX")?;
    read_part(&mut archive, "word/document.xml", "DOCX")?
        .ok_or_else(|| EngineError::decode("DOCX", "missing word/document.xml"))
}

/// Body text of a `.docx`, one line per paragraph.
pub fn read_docx_text(data: &[u8]) -> EngineResult<String> {
    let xml = document_xml(data)?;
    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| EngineError::decode("DOCX", e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text = in_run,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => out.push('\n'),
                b"tab" if in_run => out.push('\t'),
                b"br" | b"cr" if in_run => out.push('\n'),
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    out.push_str(&t.unescape().map_err(|e| EngineError::decode("DOCX", e))?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Reader for tables in `.docx` packages.
pub struct DocxTableReader;

impl WordTableReader for DocxTableReader {
    fn read_tables(&self, data: &[u8]) -> EngineResult<Vec<Rows>> {
        read_docx_tables(data)
    }
}

/// Top-level body tables. Text of nested tables folds into the enclosing cell.
pub fn read_docx_tables(data: &[u8]) -> EngineResult<Vec<Rows>> {
    let xml = document_xml(data)?;
    let mut reader = Reader::from_str(&xml);

    let mut tables = Vec::new();
    let mut table: Rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Option<String> = None;
    let mut cell_paragraphs = 0usize;
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| EngineError::decode("DOCX", e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => {
                    depth += 1;
                    if depth == 1 {
                        table = Vec::new();
                    }
                }
                b"tr" if depth == 1 => row = Vec::new(),
                b"tc" if depth == 1 => {
                    cell = Some(String::new());
                    cell_paragraphs = 0;
                }
                b"p" => {
                    if let Some(buf) = cell.as_mut() {
                        if cell_paragraphs > 0 {
                            buf.push('\n');
                        }
                        cell_paragraphs += 1;
                    }
                }
                b"t" => in_text = cell.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tc" if depth == 1 => row.push(String::new()),
                b"p" => {
                    if let Some(buf) = cell.as_mut() {
                        if cell_paragraphs > 0 {
                            buf.push('\n');
                        }
                        cell_paragraphs += 1;
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(buf) = cell.as_mut() {
                        buf.push_str(&t.unescape().map_err(|e| EngineError::decode("DOCX", e))?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"tc" if depth == 1 => {
                    if let Some(buf) = cell.take() {
                        row.push(buf.trim().to_string());
                    }
                }
                b"tr" if depth == 1 => table.push(std::mem::take(&mut row)),
                b"tbl" => {
                    if depth == 1 {
                        tables.push(std::mem::take(&mut table));
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(tables)
}

/// Whether `data` is a zip package containing `part`.
pub fn package_has_part(data: &[u8], part: &str) -> bool {
    ZipArchive::new(Cursor::new(data))
        .map(|archive| archive.file_names().any(|name| name == part))
        .unwrap_or(false)
}
