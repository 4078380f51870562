//! OCR capability and language-data resolution.
//!
//! The engine needs a tessdata directory. It is resolved once at startup from,
//! in order: an explicit configuration value, the `TESSDATA_PREFIX` environment
//! variable, then a per-OS probe list.

pub mod tesseract;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{info, warn};

use crate::error::EngineResult;

/// Environment variable conventionally pointing at tessdata.
pub const TESSDATA_ENV: &str = "TESSDATA_PREFIX";

/// Text recognition over a decoded raster.
///
/// Implementations are shared between request workers and must tolerate
/// concurrent calls.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &DynamicImage) -> EngineResult<String>;
}

/// Well-known tessdata locations for a host OS (`std::env::consts::OS` values).
pub fn probe_candidates(os: &str, user: Option<&str>) -> Vec<PathBuf> {
    match os {
        "windows" => {
            let mut paths = vec![PathBuf::from(r"C:\Program Files\Tesseract-OCR\tessdata")];
            if let Some(user) = user {
                paths.push(PathBuf::from(format!(
                    r"C:\Users\{}\Tesseract-OCR\tessdata",
                    user
                )));
            }
            paths
        }
        "macos" => vec![PathBuf::from("/usr/local/share/tessdata")],
        _ => vec![PathBuf::from("/usr/share/tesseract-ocr/4.00/tessdata")],
    }
}

/// First existing directory among explicit, environment and probed candidates.
pub fn resolve_from(
    explicit: Option<&Path>,
    env_value: Option<PathBuf>,
    probes: Vec<PathBuf>,
    is_dir: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env_value)
        .chain(probes)
        .find(|candidate| is_dir(candidate.as_path()))
}

/// Resolve the tessdata directory for this process and log the outcome once.
pub fn resolve_datapath(explicit: Option<&Path>) -> Option<PathBuf> {
    let env_value = std::env::var_os(TESSDATA_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let user = std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .ok();
    let probes = probe_candidates(std::env::consts::OS, user.as_deref());

    let resolved = resolve_from(explicit, env_value, probes, |p| p.is_dir());
    match &resolved {
        Some(path) => info!("OCR language data: {}", path.display()),
        None => warn!("No tessdata directory found; OCR will use the engine default and may fail"),
    }
    resolved
}
