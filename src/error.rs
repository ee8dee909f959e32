use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures while reading a PDF. `Open` is document-wide; the rest are per page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    #[error("failed to read text layer of page {page}: {reason}")]
    TextLayer { page: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum OcrError {
    /// A language pack named in the OCR profile is not installed.
    #[error("language data for '{language}' is unavailable: {message}")]
    ScriptPackUnavailable { language: String, message: String },

    #[error("ocr failed: {0}")]
    Failed(String),

    #[error("ocr exceeded timeout ({0:?})")]
    Timeout(Duration),

    #[error("ocr io: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding page image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("no translation model configured")]
    NotConfigured,

    #[error("model file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to load tokenizer: {0}")]
    Tokenizer(String),

    #[error("failed to create session for {}: {reason}", path.display())]
    Session { path: PathBuf, reason: String },
}

/// Runtime failures of an already loaded model.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unexpected model output: {0}")]
    Output(String),
}
