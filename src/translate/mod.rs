pub mod onnx;
pub mod tags;

use crate::{
    config::{Config, Translation},
    error::{ModelLoadError, TranslationError},
    extract::PageBlock,
    segment::{batches, chunk, segment},
};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub use onnx::{Device, OnnxLoader};
pub use tags::resolve_tag;

/// A loaded generation model. Outputs align positionally with `inputs`.
pub trait Seq2SeqModel: Send {
    fn generate(
        &mut self,
        inputs: &[String],
        max_new_tokens: usize,
    ) -> Result<Vec<String>, TranslationError>;
}

pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn Seq2SeqModel>, ModelLoadError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedBlock {
    pub page_number: usize,
    pub source_language: Option<String>,
    pub translated_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Unloaded,
    Loaded,
    Failed,
}

enum ModelState {
    Unloaded,
    Loaded(Box<dyn Seq2SeqModel>),
    /// Terminal: the single load attempt failed.
    Failed,
}

/// Translates target-script text to English, passing everything else through.
///
/// The model is loaded on first use, at most once. If that load fails the
/// engine stays in pass-through mode for the rest of its life.
pub struct TranslationEngine {
    settings: Translation,
    loader: Box<dyn ModelLoader>,
    state: Mutex<ModelState>,
}

impl TranslationEngine {
    pub fn new(settings: &Translation, loader: Box<dyn ModelLoader>) -> Self {
        Self {
            settings: settings.clone(),
            loader,
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.translation, Box::new(OnnxLoader::from_config(cfg)))
    }

    pub fn status(&self) -> ModelStatus {
        match &*self.lock() {
            ModelState::Unloaded => ModelStatus::Unloaded,
            ModelState::Loaded(_) => ModelStatus::Loaded,
            ModelState::Failed => ModelStatus::Failed,
        }
    }

    /// Loads the model if needed and reports whether translation is possible.
    pub fn is_available(&self) -> bool {
        self.with_model(|_| ()).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the loaded model; `None` when the model is unavailable.
    /// The lock is held across the load, so concurrent first callers wait for
    /// one attempt instead of racing.
    fn with_model<R>(&self, f: impl FnOnce(&mut dyn Seq2SeqModel) -> R) -> Option<R> {
        let mut state = self.lock();
        if matches!(*state, ModelState::Unloaded) {
            *state = match self.loader.load() {
                Ok(model) => ModelState::Loaded(model),
                Err(err) => {
                    warn!("translation disabled, model load failed: {err}");
                    ModelState::Failed
                }
            };
        }
        match &mut *state {
            ModelState::Loaded(model) => Some(f(model.as_mut())),
            _ => None,
        }
    }

    pub fn translate_blocks(&self, blocks: &[PageBlock]) -> Vec<TranslatedBlock> {
        blocks
            .iter()
            .map(|block| {
                let translated = self.translate_text(&block.text, block.language.as_deref());
                TranslatedBlock {
                    page_number: block.page_number,
                    source_language: block.language.clone(),
                    translated_text: if translated.is_empty() {
                        block.text.clone()
                    } else {
                        translated
                    },
                }
            })
            .collect()
    }

    /// Like [`try_translate_text`](Self::try_translate_text), but a failed batch
    /// returns the input unchanged.
    pub fn translate_text(&self, text: &str, source_language: Option<&str>) -> String {
        match self.try_translate_text(text, source_language) {
            Ok(translated) => translated,
            Err(err) => {
                warn!("translation failed, keeping original text: {err}");
                text.to_string()
            }
        }
    }

    pub fn try_translate_text(
        &self,
        text: &str,
        source_language: Option<&str>,
    ) -> Result<String, TranslationError> {
        let script = self.settings.target_script;
        if text.trim().is_empty() || !script.matches(text) {
            return Ok(text.to_string());
        }

        let src_tag = resolve_tag(source_language, &self.settings.default_source_tag);
        match self.with_model(|model| self.translate_segments(model, text, src_tag)) {
            Some(result) => result,
            None => Ok(text.to_string()),
        }
    }

    fn translate_segments(
        &self,
        model: &mut dyn Seq2SeqModel,
        text: &str,
        src_tag: &str,
    ) -> Result<String, TranslationError> {
        let mut parts = Vec::new();
        for seg in segment(text, self.settings.target_script) {
            if !seg.is_target_script || seg.text.trim().is_empty() {
                parts.push(seg.text);
                continue;
            }

            let chunks = chunk(&seg.text, self.settings.chunk_chars);
            let mut translated = Vec::with_capacity(chunks.len());
            for batch in batches(&chunks, self.settings.batch_size) {
                translated.extend(self.translate_batch(model, batch, src_tag)?);
            }
            parts.push(translated.join("\n").trim().to_string());
        }

        let joined = parts.join("\n").trim().to_string();
        Ok(if joined.is_empty() {
            text.to_string()
        } else {
            joined
        })
    }

    /// Whitespace-only chunks never reach the model and come back empty.
    fn translate_batch(
        &self,
        model: &mut dyn Seq2SeqModel,
        batch: &[String],
        src_tag: &str,
    ) -> Result<Vec<String>, TranslationError> {
        let prefixed: Vec<String> = batch
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("{src_tag} {} {}", self.settings.target_tag, c.trim()))
            .collect();
        if prefixed.is_empty() {
            return Ok(vec![String::new(); batch.len()]);
        }

        debug!("translating batch of {} chunks ({src_tag})", prefixed.len());
        let mut decoded = model
            .generate(&prefixed, self.settings.max_new_tokens)?
            .into_iter();

        Ok(batch
            .iter()
            .map(|c| {
                if c.trim().is_empty() {
                    String::new()
                } else {
                    decoded.next().unwrap_or_default()
                }
            })
            .collect())
    }
}
