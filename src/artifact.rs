use crate::{extract::DocumentExtraction, translate::TranslatedBlock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalArtifact {
    pub source_pdf: String,
    pub pages: Vec<OriginalPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalPage {
    pub page: usize,
    pub language: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnglishArtifact {
    pub source_pdf: String,
    pub pages: Vec<EnglishPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnglishPage {
    pub page: usize,
    pub source_language: Option<String>,
    pub text: String,
}

pub fn original_artifact(source_pdf: &str, extraction: &DocumentExtraction) -> OriginalArtifact {
    OriginalArtifact {
        source_pdf: source_pdf.to_string(),
        pages: extraction
            .blocks
            .iter()
            .map(|b| OriginalPage {
                page: b.page_number,
                language: b.language.clone(),
                text: b.text.clone(),
            })
            .collect(),
    }
}

/// Follows the extraction's page order. A page without a translation keeps
/// its detected language and original text.
pub fn english_artifact(
    source_pdf: &str,
    extraction: &DocumentExtraction,
    translated: &[TranslatedBlock],
) -> EnglishArtifact {
    let by_page: HashMap<usize, &TranslatedBlock> =
        translated.iter().map(|t| (t.page_number, t)).collect();

    EnglishArtifact {
        source_pdf: source_pdf.to_string(),
        pages: extraction
            .blocks
            .iter()
            .map(|b| match by_page.get(&b.page_number) {
                Some(t) => EnglishPage {
                    page: b.page_number,
                    source_language: t.source_language.clone(),
                    text: t.translated_text.clone(),
                },
                None => EnglishPage {
                    page: b.page_number,
                    source_language: b.language.clone(),
                    text: b.text.clone(),
                },
            })
            .collect(),
    }
}
