//! Recognition settings.
//!
//! Stored as JSON in a platform-appropriate config directory. Missing fields
//! take their defaults, so older files keep loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use data::Language;
use serde::{Deserialize, Serialize};

use crate::{CustomThreshold, Theme, segment::SegmentThresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `Auto` detects the theme on every reward screen.
    pub theme: Theme,

    /// Foreground bands for `Custom` and undetected themes.
    pub custom_threshold: CustomThreshold,

    pub language: Language,

    /// Row density that opens a text line in snap-it captures.
    pub snap_row_text_density: f64,

    /// Density below which a row or column counts as empty in snap-it captures.
    pub snap_row_empty_density: f64,

    /// Number of OCR engines to run in parallel.
    pub ocr_engines: usize,

    /// Folder holding the OCR models. Searched for when unset.
    pub ocr_dir: Option<PathBuf>,

    /// When set, intermediate images of every run are written here.
    pub debug_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Auto,
            custom_threshold: CustomThreshold::default(),
            language: Language::English,
            snap_row_text_density: 0.015,
            snap_row_empty_density: 0.01,
            ocr_engines: 4,
            ocr_dir: None,
            debug_dir: None,
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("wfbuddy").join("ie.json"))
    }

    /// Load configuration from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("failed to load config; using defaults: {err:#}");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk. A missing file yields defaults.
    pub fn try_load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    pub fn segment_thresholds(&self) -> SegmentThresholds {
        SegmentThresholds {
            text_density: self.snap_row_text_density,
            empty_density: self.snap_row_empty_density,
        }
    }

    /// Locate the OCR models for the configured language.
    pub fn ocr_assets(&self) -> Result<OcrAssets> {
        resolve_ocr_assets(self.language.ocr_code(), self.ocr_dir.as_deref())
    }
}

// ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrAssets {
    pub detection: PathBuf,
    pub recognition: PathBuf,
    pub charset: PathBuf,
}

fn normalize_ocr_dir(dir: PathBuf) -> PathBuf {
    // Accept either the folder containing `ocr/` or the `ocr/` folder itself.
    if dir.join("detection.mnn").is_file() {
        dir
    } else {
        dir.join("ocr")
    }
}

/// Resolve OCR model paths.
///
/// `dir` wins when given. Otherwise `WFBUDDY_ASSETS_DIR`, the executable's
/// folder and the working directory are searched in that order.
pub fn resolve_ocr_assets(lang_code: &str, dir: Option<&Path>) -> Result<OcrAssets> {
    let recognition_name = format!("{lang_code}_recognition.mnn");
    let charset_name = format!("{lang_code}_charset.txt");

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = dir {
        candidates.push(dir.to_path_buf());
    } else {
        if let Some(dir) = std::env::var_os("WFBUDDY_ASSETS_DIR") {
            candidates.push(PathBuf::from(dir));
        }
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.to_path_buf());
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd);
        }
    }

    let mut tried = Vec::new();
    for base in candidates {
        let ocr_dir = normalize_ocr_dir(base);
        let detection = ocr_dir.join("detection.mnn");
        let recognition = ocr_dir.join(&recognition_name);
        let charset = ocr_dir.join(&charset_name);

        if detection.is_file() && recognition.is_file() && charset.is_file() {
            return Ok(OcrAssets {
                detection,
                recognition,
                charset,
            });
        }
        tried.push(ocr_dir);
    }

    bail!(
        "OCR model files not found. Expected ocr/detection.mnn, ocr/{recognition_name} and ocr/{charset_name}. Searched in:\n{}",
        tried
            .into_iter()
            .map(|p| format!("  - {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    )
}
