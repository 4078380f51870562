//! Service configuration.
//!
//! Defaults, optionally overlaid by a JSON file named in `PARSER_CONFIG_FILE`,
//! then by individual environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_ENV: &str = "PARSER_CONFIG_FILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    /// Upper bound for a whole multipart request body.
    pub max_upload_bytes: usize,
    /// Explicit tessdata directory; wins over `TESSDATA_PREFIX` and probing.
    pub tessdata_path: Option<PathBuf>,
    pub ocr_language: String,
    pub ocr_dpi: u32,
    pub tesseract_bin: String,
    pub pdftoppm_bin: String,
    pub libreoffice_bin: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            max_upload_bytes: 100 * 1024 * 1024,
            tessdata_path: None,
            ocr_language: "eng".to_string(),
            ocr_dpi: 300,
            tesseract_bin: "tesseract".to_string(),
            pdftoppm_bin: "pdftoppm".to_string(),
            libreoffice_bin: "soffice".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load_from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: ServiceConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Overlay values from `lookup` (normally `std::env::var`).
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PARSER_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = get("PARSER_MAX_UPLOAD_BYTES") {
            match v.trim().parse() {
                Ok(n) => self.max_upload_bytes = n,
                Err(_) => warn!("Ignoring invalid PARSER_MAX_UPLOAD_BYTES: {}", v),
            }
        }
        if let Some(v) = get("OCR_TESSDATA_PATH") {
            self.tessdata_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("OCR_LANGUAGE") {
            self.ocr_language = v;
        }
        if let Some(v) = get("OCR_DPI") {
            match v.trim().parse() {
                Ok(n) if n > 0 => self.ocr_dpi = n,
                _ => warn!("Ignoring invalid OCR_DPI: {}", v),
            }
        }
        if let Some(v) = get("TESSERACT_BIN") {
            self.tesseract_bin = v;
        }
        if let Some(v) = get("PDFTOPPM_BIN") {
            self.pdftoppm_bin = v;
        }
        if let Some(v) = get("LIBREOFFICE_BIN") {
            self.libreoffice_bin = v;
        }
    }
}
