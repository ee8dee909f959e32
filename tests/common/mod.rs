#![allow(dead_code)]

use image::DynamicImage;
use parliament_pipeline::{
    error::{ExtractError, ModelLoadError, OcrError, TranslationError},
    extract::{OcrBackend, PageSource, PdfBackend},
    translate::{ModelLoader, Seq2SeqModel},
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub enum FakePage {
    Ok(String),
    RenderFails,
}

/// A document whose page `n` renders to an image `n` pixels wide, so the fake
/// OCR can tell pages apart.
pub struct FakePdf {
    pub pages: Vec<FakePage>,
    pub open_fails: bool,
}

impl FakePdf {
    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            pages: texts.iter().map(|t| FakePage::Ok(t.to_string())).collect(),
            open_fails: false,
        }
    }
}

impl PdfBackend for FakePdf {
    fn with_document(
        &self,
        path: &Path,
        visit: &mut dyn FnMut(&dyn PageSource),
    ) -> Result<(), ExtractError> {
        if self.open_fails {
            return Err(ExtractError::Open {
                path: path.to_path_buf(),
                reason: "not a PDF".into(),
            });
        }
        visit(&FakeDoc { pages: &self.pages });
        Ok(())
    }
}

struct FakeDoc<'a> {
    pages: &'a [FakePage],
}

impl PageSource for FakeDoc<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render(&self, index: usize, _scale: f32) -> Result<DynamicImage, ExtractError> {
        match &self.pages[index] {
            FakePage::Ok(_) => Ok(DynamicImage::new_luma8(index as u32 + 1, 1)),
            FakePage::RenderFails => Err(ExtractError::Render {
                page: index + 1,
                reason: "corrupt content stream".into(),
            }),
        }
    }

    fn text(&self, index: usize) -> Result<String, ExtractError> {
        match &self.pages[index] {
            FakePage::Ok(text) => Ok(text.clone()),
            FakePage::RenderFails => Err(ExtractError::TextLayer {
                page: index + 1,
                reason: "corrupt content stream".into(),
            }),
        }
    }
}

type OcrScript = dyn Fn(usize, &str) -> Result<String, OcrError> + Send + Sync;

/// OCR driven by a closure of `(page_number, languages)`, recording each call.
pub struct FakeOcr {
    script: Box<OcrScript>,
    pub calls: Arc<Mutex<Vec<(usize, String)>>>,
}

impl FakeOcr {
    pub fn new(
        script: impl Fn(usize, &str) -> Result<String, OcrError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the text of the matching page from `texts`.
    pub fn echo(texts: &[&str]) -> Self {
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        Self::new(move |page, _| Ok(texts[page - 1].clone()))
    }
}

impl OcrBackend for FakeOcr {
    fn recognize(&self, image: &DynamicImage, languages: &str) -> Result<String, OcrError> {
        let page = image.width() as usize;
        self.calls
            .lock()
            .unwrap()
            .push((page, languages.to_string()));
        (self.script)(page, languages)
    }
}

pub fn missing_hin() -> OcrError {
    OcrError::ScriptPackUnavailable {
        language: "hin".into(),
        message: "Failed loading language 'hin'".into(),
    }
}

/// Loader whose every attempt fails, counting attempts.
pub struct FailingLoader {
    pub attempts: Arc<AtomicUsize>,
}

impl ModelLoader for FailingLoader {
    fn load(&self) -> Result<Box<dyn Seq2SeqModel>, ModelLoadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ModelLoadError::NotConfigured)
    }
}

/// Model that "translates" by tagging each input, recording every batch.
pub struct TaggingModel {
    pub batches: Arc<Mutex<Vec<Vec<String>>>>,
    pub fail_when_contains: Option<String>,
}

impl Seq2SeqModel for TaggingModel {
    fn generate(
        &mut self,
        inputs: &[String],
        _max_new_tokens: usize,
    ) -> Result<Vec<String>, TranslationError> {
        self.batches.lock().unwrap().push(inputs.to_vec());
        if let Some(marker) = &self.fail_when_contains {
            if inputs.iter().any(|i| i.contains(marker.as_str())) {
                return Err(TranslationError::Inference("device lost".into()));
            }
        }
        Ok(inputs.iter().map(|i| format!("EN[{i}]")).collect())
    }
}

pub struct TaggingLoader {
    pub attempts: Arc<AtomicUsize>,
    pub batches: Arc<Mutex<Vec<Vec<String>>>>,
    pub fail_when_contains: Option<String>,
}

impl TaggingLoader {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(AtomicUsize::new(0)),
            batches: Arc::new(Mutex::new(Vec::new())),
            fail_when_contains: None,
        }
    }
}

impl ModelLoader for TaggingLoader {
    fn load(&self) -> Result<Box<dyn Seq2SeqModel>, ModelLoadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TaggingModel {
            batches: Arc::clone(&self.batches),
            fail_when_contains: self.fail_when_contains.clone(),
        }))
    }
}
