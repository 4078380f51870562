//! Tesseract OCR through its command-line interface.

use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::OcrEngine;
use crate::engines::{command_error, stderr_tail};
use crate::error::{EngineError, EngineResult};

/// Runs `tesseract <image> stdout -l <lang>`.
///
/// Each recognition is a separate process with its own staged image, so one
/// instance can serve concurrent requests.
pub struct TesseractEngine {
    binary: String,
    language: String,
    datapath: Option<PathBuf>,
}

impl TesseractEngine {
    pub fn new(binary: String, language: String, datapath: Option<PathBuf>) -> Self {
        Self {
            binary,
            language,
            datapath,
        }
    }

    fn command(&self, image_path: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language);
        if let Some(dir) = &self.datapath {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "Tesseract OCR"
    }

    fn recognize(&self, image: &DynamicImage) -> EngineResult<String> {
        let dir = tempfile::Builder::new().prefix("ocr-").tempdir()?;
        let image_path = dir.path().join("page.png");
        image
            .save_with_format(&image_path, ImageFormat::Png)
            .map_err(|e| EngineError::tool(&self.binary, format!("cannot stage image: {}", e)))?;

        let output = self
            .command(&image_path)
            .output()
            .map_err(|e| command_error(&self.binary, e))?;

        if !output.status.success() {
            return Err(EngineError::tool(&self.binary, stderr_tail(&output.stderr)));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "OCR recognized {} chars from {}x{} image",
            text.len(),
            image.width(),
            image.height()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_arguments() {
        let engine = TesseractEngine::new(
            "tesseract".to_string(),
            "eng".to_string(),
            Some(PathBuf::from("/data/tessdata")),
        );
        let cmd = engine.command(std::path::Path::new("/tmp/page.png"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["/tmp/page.png", "stdout", "-l", "eng", "--tessdata-dir", "/data/tessdata"]
        );
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let engine = TesseractEngine::new("tesseract-not-installed-here".to_string(), "eng".to_string(), None);
        let err = engine.recognize(&DynamicImage::new_rgb8(2, 2)).unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)));
    }
}
