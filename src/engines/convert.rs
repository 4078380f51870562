//! Legacy office formats through a headless LibreOffice.

use std::process::Command;
use std::sync::Arc;

use tracing::debug;

use super::ooxml::read_pptx_slides;
use super::{command_error, stderr_tail, DocumentConverter, PresentationReader};
use crate::error::{EngineError, EngineResult};

/// Converts documents with `soffice --headless --convert-to`.
pub struct LibreOfficeConverter {
    binary: String,
}

impl LibreOfficeConverter {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }
}

/// Extension of `file_name` reduced to ASCII alphanumerics, so client-supplied
/// names never reach the filesystem.
fn safe_extension(file_name: &str) -> String {
    let ext: String = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if ext.is_empty() {
        "bin".to_string()
    } else {
        ext
    }
}

impl DocumentConverter for LibreOfficeConverter {
    fn convert(&self, file_name: &str, data: &[u8], target_ext: &str) -> EngineResult<Vec<u8>> {
        let dir = tempfile::Builder::new().prefix("office-convert-").tempdir()?;
        let input = dir.path().join(format!("input.{}", safe_extension(file_name)));
        std::fs::write(&input, data)?;

        let output = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg(target_ext)
            .arg("--outdir")
            .arg(dir.path())
            .arg(&input)
            .output()
            .map_err(|e| command_error(&self.binary, e))?;

        if !output.status.success() {
            return Err(EngineError::tool(&self.binary, stderr_tail(&output.stderr)));
        }

        let converted = dir.path().join(format!("input.{}", target_ext));
        let bytes = std::fs::read(&converted).map_err(|e| {
            EngineError::tool(
                &self.binary,
                format!("no {} output for {}: {}", target_ext, file_name, e),
            )
        })?;

        debug!(
            "Converted {} to {} ({} -> {} bytes)",
            file_name,
            target_ext,
            data.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Reader for binary `.ppt` decks: converted to `.pptx`, then read as PresentationML.
pub struct LegacyPresentationReader {
    converter: Arc<dyn DocumentConverter>,
}

impl LegacyPresentationReader {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }
}

impl PresentationReader for LegacyPresentationReader {
    fn name(&self) -> &'static str {
        "LibreOffice + quick-xml (legacy PowerPoint)"
    }

    fn read_slides(&self, data: &[u8]) -> EngineResult<Vec<Vec<String>>> {
        let pptx = self.converter.convert("presentation.ppt", data, "pptx")?;
        read_pptx_slides(&pptx)
    }
}
