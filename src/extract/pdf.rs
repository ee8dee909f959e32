use crate::error::ExtractError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Random access to the pages of one opened document. Indices are 0-based.
pub trait PageSource {
    fn page_count(&self) -> usize;
    fn render(&self, index: usize, scale: f32) -> Result<DynamicImage, ExtractError>;
    fn text(&self, index: usize) -> Result<String, ExtractError>;
}

pub trait PdfBackend: Send + Sync {
    /// Opens `path` and hands the pages to `visit`. The document is closed when
    /// `visit` returns.
    fn with_document(
        &self,
        path: &Path,
        visit: &mut dyn FnMut(&dyn PageSource),
    ) -> Result<(), ExtractError>;
}

/// pdfium bound at open time, from `library_dir` or the system library.
pub struct PdfiumBackend {
    library_dir: Option<PathBuf>,
}

impl PdfiumBackend {
    pub fn new(library_dir: Option<&str>) -> Self {
        Self {
            library_dir: library_dir.filter(|s| !s.is_empty()).map(PathBuf::from),
        }
    }

    pub fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let bindings = match &self.library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .or_else(|_| Pdfium::bind_to_system_library())?,
            None => Pdfium::bind_to_system_library()?,
        };
        Ok(Pdfium::new(bindings))
    }
}

impl PdfBackend for PdfiumBackend {
    fn with_document(
        &self,
        path: &Path,
        visit: &mut dyn FnMut(&dyn PageSource),
    ) -> Result<(), ExtractError> {
        let open_err = |reason: String| ExtractError::Open {
            path: path.to_path_buf(),
            reason,
        };
        let pdfium = self
            .bind()
            .map_err(|e| open_err(format!("binding pdfium: {e}")))?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| open_err(e.to_string()))?;

        debug!("opened {} with {} pages", path.display(), document.pages().len());
        visit(&PdfiumPages { document: &document });
        Ok(())
    }
}

struct PdfiumPages<'a, 'p> {
    document: &'a PdfDocument<'p>,
}

impl<'p> PdfiumPages<'_, 'p> {
    fn page(&self, index: usize) -> Result<PdfPage<'p>, PdfiumError> {
        let index = PdfPageIndex::try_from(index).map_err(|_| PdfiumError::PageIndexOutOfBounds)?;
        self.document.pages().get(index)
    }
}

impl PageSource for PdfiumPages<'_, '_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render(&self, index: usize, scale: f32) -> Result<DynamicImage, ExtractError> {
        let render_err = |e: PdfiumError| ExtractError::Render {
            page: index + 1,
            reason: e.to_string(),
        };
        let page = self.page(index).map_err(render_err)?;
        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .scale_page_by_factor(scale)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(render_err)?;
        Ok(bitmap.as_image())
    }

    fn text(&self, index: usize) -> Result<String, ExtractError> {
        let text_err = |e: PdfiumError| ExtractError::TextLayer {
            page: index + 1,
            reason: e.to_string(),
        };
        let page = self.page(index).map_err(text_err)?;
        let text = page.text().map_err(text_err)?;
        Ok(text.all())
    }
}
