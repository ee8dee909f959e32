pub mod langid;
pub mod ocr;
pub mod pdf;

use crate::{config::Config, error::OcrError, postprocess::clean_page_text};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub use langid::detect_language;
pub use ocr::{OcrBackend, TesseractCli};
pub use pdf::{PageSource, PdfBackend, PdfiumBackend};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBlock {
    #[serde(rename = "page")]
    pub page_number: usize,
    pub language: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub source_path: PathBuf,
    pub blocks: Vec<PageBlock>,
}

impl DocumentExtraction {
    pub fn empty(source_path: &Path) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            blocks: Vec::new(),
        }
    }
}

/// Per-page text extraction, via OCR or the embedded text layer.
pub struct Extractor {
    cfg: Config,
    pdf: Box<dyn PdfBackend>,
    ocr: Box<dyn OcrBackend>,
}

impl Extractor {
    pub fn new(cfg: &Config, pdf: Box<dyn PdfBackend>, ocr: Box<dyn OcrBackend>) -> Self {
        Self {
            cfg: cfg.clone(),
            pdf,
            ocr,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let pdf = PdfiumBackend::new(cfg.pdfium.library_path.as_deref());
        let ocr = TesseractCli::new(
            &cfg.ocr.tesseract_exe,
            cfg.processing.ocr_dpi,
            cfg.ocr.timeout_seconds,
        );
        Self::new(cfg, Box::new(pdf), Box::new(ocr))
    }

    /// Never fails: an unreadable document yields zero blocks, a bad page is skipped.
    pub fn extract(&self, pdf_path: &Path) -> DocumentExtraction {
        let ocr_mode = self.cfg.processing.enable_ocr;
        if ocr_mode {
            info!("extracting (ocr) text from {}", pdf_path.display());
        } else {
            info!("extracting (native text) from {}", pdf_path.display());
        }

        let mut blocks = Vec::new();
        let opened = self.pdf.with_document(pdf_path, &mut |pages| {
            blocks = if ocr_mode {
                self.extract_with_ocr(pdf_path, pages)
            } else {
                self.extract_native(pdf_path, pages)
            };
        });

        if let Err(err) = opened {
            error!("{err}");
            return DocumentExtraction::empty(pdf_path);
        }

        DocumentExtraction {
            source_path: pdf_path.to_path_buf(),
            blocks,
        }
    }

    fn page_limit(&self, pdf_path: &Path, pages: &dyn PageSource) -> usize {
        let total = pages.page_count();
        if total == 0 {
            warn!("no pages detected in {}", pdf_path.display());
        }
        match self.cfg.processing.page_cap() {
            Some(cap) => total.min(cap),
            None => total,
        }
    }

    fn extract_with_ocr(&self, pdf_path: &Path, pages: &dyn PageSource) -> Vec<PageBlock> {
        let total = self.page_limit(pdf_path, pages);
        let scale = self.cfg.processing.render_scale();
        let mut blocks = Vec::with_capacity(total);

        for index in 0..total {
            let page_number = index + 1;
            let image = match pages.render(index, scale) {
                Ok(image) => image,
                Err(err) => {
                    error!("{} page {page_number}: {err}", pdf_path.display());
                    continue;
                }
            };

            if let Some(raw) = self.run_ocr(&image, pdf_path, page_number) {
                blocks.push(self.block(page_number, &raw));
            }
        }
        blocks
    }

    fn extract_native(&self, pdf_path: &Path, pages: &dyn PageSource) -> Vec<PageBlock> {
        let total = self.page_limit(pdf_path, pages);
        let mut blocks = Vec::with_capacity(total);

        for index in 0..total {
            let page_number = index + 1;
            match pages.text(index) {
                Ok(raw) => blocks.push(self.block(page_number, &raw)),
                Err(err) => error!("{} page {page_number}: {err}", pdf_path.display()),
            }
        }
        blocks
    }

    /// `None` means the page should be omitted. A page whose fallback pass also
    /// fails still yields `Some("")`.
    fn run_ocr(&self, image: &DynamicImage, pdf_path: &Path, page_number: usize) -> Option<String> {
        let profile = self.cfg.processing.ocr_languages.as_str();
        let fallback = self.cfg.ocr.fallback_languages.as_str();

        match self.ocr.recognize(image, profile) {
            Ok(text) => Some(text),
            Err(OcrError::ScriptPackUnavailable { language, message })
                if profile != fallback && !profile_contains(fallback, &language) =>
            {
                error!(
                    "ocr failed on {} page {page_number} (missing '{language}'): {message}",
                    pdf_path.display()
                );
                match self.ocr.recognize(image, fallback) {
                    Ok(text) => Some(text),
                    Err(err) => {
                        error!(
                            "{fallback}-only ocr fallback failed on {} page {page_number}: {err}",
                            pdf_path.display()
                        );
                        Some(String::new())
                    }
                }
            }
            Err(err) => {
                error!("ocr failed on {} page {page_number}: {err}", pdf_path.display());
                None
            }
        }
    }

    fn block(&self, page_number: usize, raw: &str) -> PageBlock {
        let text = clean_page_text(&self.cfg, raw);
        let language = detect_language(&text);
        PageBlock {
            page_number,
            language,
            text,
        }
    }
}

fn profile_contains(profile: &str, language: &str) -> bool {
    profile.split('+').any(|l| l.trim() == language)
}
