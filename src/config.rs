use crate::segment::TargetScript;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub processing: Processing,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub pdfium: Pdfium,
    #[serde(default)]
    pub translation: Translation,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    pub fn original_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.processed_dir).join("original")
    }

    pub fn english_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.processed_dir).join("english")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub raw_dir: String,
    pub processed_dir: String,
    pub logs_dir: String,
    pub models_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            raw_dir: "data/raw".into(),
            processed_dir: "data/processed".into(),
            logs_dir: "logs".into(),
            models_dir: "models".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Processing {
    pub enable_ocr: bool,
    pub ocr_dpi: u32,
    pub ocr_languages: String,
    /// Absent means every page is extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}
impl Default for Processing {
    fn default() -> Self {
        Self {
            enable_ocr: true,
            ocr_dpi: 300,
            ocr_languages: "eng+hin".into(),
            max_pages: None,
        }
    }
}

impl Processing {
    /// Render scale relative to the 72 pt/inch PDF user space, never below 1.0.
    pub fn render_scale(&self) -> f32 {
        (self.ocr_dpi as f32 / 72.0).max(1.0)
    }

    /// Effective page cap; zero is treated as "no cap".
    pub fn page_cap(&self) -> Option<usize> {
        self.max_pages.filter(|&n| n > 0).map(|n| n as usize)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ocr {
    pub tesseract_exe: String,
    pub fallback_languages: String,
    pub timeout_seconds: u64,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            tesseract_exe: "tesseract".into(),
            fallback_languages: "eng".into(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pdfium {
    /// Directory holding the pdfium shared library. Falls back to the system library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Translation {
    pub model: String,
    pub device_preference: String,
    pub max_new_tokens: usize,
    pub max_input_tokens: usize,
    pub chunk_chars: usize,
    pub batch_size: usize,
    pub default_source_tag: String,
    pub target_tag: String,
    pub target_script: TargetScript,
}
impl Default for Translation {
    fn default() -> Self {
        Self {
            model: "ai4bharat/indictrans2-indic-en-dist-200M".into(),
            device_preference: "mps".into(),
            max_new_tokens: 256,
            max_input_tokens: 512,
            chunk_chars: 512,
            batch_size: 4,
            default_source_tag: "hin_Deva".into(),
            target_tag: "eng_Latn".into(),
            target_script: TargetScript::Devanagari,
        }
    }
}

impl Translation {
    /// A configured identifier is used verbatim when it names an existing
    /// directory, otherwise it is looked up under `models_dir`.
    pub fn model_dir(&self, models_dir: &str) -> Option<PathBuf> {
        let id = self.model.trim();
        if id.is_empty() {
            return None;
        }
        let direct = PathBuf::from(id);
        if direct.is_dir() {
            return Some(direct);
        }
        Some(PathBuf::from(models_dir).join(id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Postprocess {
    pub normalize_unicode: bool,
    pub trim_trailing_whitespace: bool,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            trim_trailing_whitespace: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_prefix: String,
    pub retention_days: usize,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_prefix: "parliament".into(),
            retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
