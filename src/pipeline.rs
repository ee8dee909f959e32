use crate::{
    artifact::{english_artifact, original_artifact},
    config::Config,
    extract::{DocumentExtraction, Extractor},
    translate::{TranslatedBlock, TranslationEngine},
    util::{document_names, ensure_dir},
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedPaths {
    pub original: PathBuf,
    pub english: PathBuf,
}

/// Extraction, translation and the two JSON writes for one document at a time.
pub struct Pipeline {
    extractor: Arc<Extractor>,
    translator: Arc<TranslationEngine>,
    original_dir: PathBuf,
    english_dir: PathBuf,
}

impl Pipeline {
    pub fn new(cfg: &Config) -> Result<Self> {
        Self::with_components(
            cfg,
            Extractor::from_config(cfg),
            TranslationEngine::from_config(cfg),
        )
    }

    pub fn with_components(
        cfg: &Config,
        extractor: Extractor,
        translator: TranslationEngine,
    ) -> Result<Self> {
        let original_dir = cfg.original_dir();
        let english_dir = cfg.english_dir();
        ensure_dir(&original_dir)?;
        ensure_dir(&english_dir)?;

        Ok(Self {
            extractor: Arc::new(extractor),
            translator: Arc::new(translator),
            original_dir,
            english_dir,
        })
    }

    pub fn translator(&self) -> &TranslationEngine {
        &self.translator
    }

    async fn extract(&self, pdf_path: &Path) -> Result<DocumentExtraction> {
        let extractor = Arc::clone(&self.extractor);
        let path = pdf_path.to_path_buf();
        tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .with_context(|| format!("extraction task for {}", pdf_path.display()))
    }

    async fn translate(
        &self,
        extraction: DocumentExtraction,
    ) -> Result<(DocumentExtraction, Vec<TranslatedBlock>)> {
        let translator = Arc::clone(&self.translator);
        tokio::task::spawn_blocking(move || {
            let translated = translator.translate_blocks(&extraction.blocks);
            (extraction, translated)
        })
        .await
        .with_context(|| "translation task")
    }

    pub async fn process(&self, pdf_path: &Path) -> Result<ProcessedPaths> {
        let extraction = self.extract(pdf_path).await?;
        info!(
            "{}: extracted {} pages",
            pdf_path.display(),
            extraction.blocks.len()
        );
        self.write_document(pdf_path, extraction).await
    }

    /// Translates an existing extraction and writes both artifacts for it.
    pub async fn write_document(
        &self,
        pdf_path: &Path,
        extraction: DocumentExtraction,
    ) -> Result<ProcessedPaths> {
        let started = Instant::now();
        let (file_name, stem) = document_names(pdf_path)?;
        let (extraction, translated) = self.translate(extraction).await?;

        let original = original_artifact(&file_name, &extraction);
        let english = english_artifact(&file_name, &extraction, &translated);

        let paths = ProcessedPaths {
            original: self.original_dir.join(format!("{stem}.json")),
            english: self.english_dir.join(format!("{stem}.json")),
        };
        tokio::try_join!(
            write_json(&paths.original, &original),
            write_json(&paths.english, &english),
        )?;

        info!(
            "wrote {} and {} in {:.1}s",
            paths.original.display(),
            paths.english.display(),
            started.elapsed().as_secs_f32()
        );
        Ok(paths)
    }

    /// Documents are processed one after another; a failure is logged and the
    /// remaining documents still run.
    pub async fn process_all(&self, pdfs: &[PathBuf]) -> Vec<(PathBuf, Result<ProcessedPaths>)> {
        let mut results = Vec::with_capacity(pdfs.len());
        for pdf in pdfs {
            let result = self.process(pdf).await;
            if let Err(err) = &result {
                error!("processing {} failed: {err:#}", pdf.display());
            }
            results.push((pdf.clone(), result));
        }
        results
    }
}

async fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(payload)?;
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
