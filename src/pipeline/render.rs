//! PDF rasterisation: open a document and render its pages to RGB rasters.
//!
//! Two traits form the seam between the pipeline and the PDF engine:
//!
//! * [`DocumentLoader`] opens a path and hands back a document handle.
//! * [`PageSource`] is that handle: page count, page sizes, page rasters.
//!
//! [`PdfiumLoader`] is the production implementation on top of
//! `pdfium-render`. [`MemoryLoader`] serves pre-rendered pages from memory,
//! which is how the cache, viewer and exporter are tested without a pdfium
//! binary on the machine.
//!
//! ## Why cap pixels as well as DPI?
//!
//! Page sizes vary wildly: an A0 poster at 300 DPI would produce a
//! 10,000 × 14,000 px image. `max_rendered_pixels` caps the longest edge
//! regardless of physical size, keeping memory bounded.

use crate::config::DarkModeConfig;
use crate::error::{DarkPdfError, PageError};
use crate::pipeline::input;
use image::RgbImage;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page dimensions in PDF points (1/72 inch), as given by the page box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter, used when no page size at all is known.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
}

/// One rasterised page: its physical size and the original (non-inverted) pixels.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub size: PageSize,
    pub image: RgbImage,
}

/// An open document handle.
///
/// Indices are 0-based; implementations report errors with 1-based page
/// numbers in [`PageError`].
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Physical size of a page without rendering it.
    fn page_size(&self, index: usize) -> Result<PageSize, PageError>;

    /// Rasterise a page to RGB.
    fn render_page(&self, index: usize) -> Result<RenderedPage, PageError>;
}

/// Opens documents, producing [`PageSource`] handles that borrow the loader.
pub trait DocumentLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, DarkPdfError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// Bind to a pdfium library.
///
/// Resolution order: the explicit `lib_path`, then a library in the current
/// working directory, then the system library.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, DarkPdfError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(path).map_err(|e| {
            DarkPdfError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
        })?,
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| DarkPdfError::PdfiumBindingFailed(format!("{:?}", e)))?,
    };
    Ok(Pdfium::new(bindings))
}

/// Production [`DocumentLoader`] backed by pdfium.
pub struct PdfiumLoader {
    pdfium: Pdfium,
    scale: f32,
    max_pixels: u32,
    password: Option<String>,
}

impl PdfiumLoader {
    /// Bind pdfium and capture the rendering settings from `config`.
    pub fn new(config: &DarkModeConfig) -> Result<Self, DarkPdfError> {
        let pdfium = bind_pdfium(config.pdfium_lib_path.as_deref())?;
        Ok(Self::with_pdfium(pdfium, config))
    }

    /// Use an already-bound pdfium instance.
    pub fn with_pdfium(pdfium: Pdfium, config: &DarkModeConfig) -> Self {
        Self {
            pdfium,
            scale: config.scale(),
            max_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
        }
    }
}

impl DocumentLoader for PdfiumLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, DarkPdfError> {
        let path = input::resolve_local(path)?;
        let password = self.password.as_deref();

        let document = self
            .pdfium
            .load_pdf_from_file(&path, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        DarkPdfError::WrongPassword { path: path.clone() }
                    } else {
                        DarkPdfError::PasswordRequired { path: path.clone() }
                    }
                } else {
                    DarkPdfError::CorruptPdf {
                        path: path.clone(),
                        detail: err_str,
                    }
                }
            })?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.scale)
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let source = PdfiumDocument {
            document,
            render_config,
        };
        info!("PDF loaded: {} pages", source.page_count());
        Ok(Box::new(source))
    }
}

/// A pdfium document handle; released when dropped.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    render_config: PdfRenderConfig,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, PageError> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| PageError::RenderFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize, PageError> {
        let page = self.page(index)?;
        Ok(PageSize::new(page.width().value, page.height().value))
    }

    fn render_page(&self, index: usize) -> Result<RenderedPage, PageError> {
        let page = self.page(index)?;
        let size = PageSize::new(page.width().value, page.height().value);

        let bitmap =
            page.render_with_config(&self.render_config)
                .map_err(|e| PageError::RenderFailed {
                    page: index + 1,
                    detail: format!("{:?}", e),
                })?;

        // pdfium renders BGRA onto an opaque white background; alpha carries nothing.
        let image = bitmap.as_image().to_rgb8();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );

        Ok(RenderedPage { size, image })
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// A view of another [`PageSource`] restricted to some of its pages.
///
/// Index `i` of the view maps to `indices[i]` of the inner document; errors
/// keep the inner document's page numbers.
pub struct SelectedPages<'s> {
    inner: &'s dyn PageSource,
    indices: Vec<usize>,
}

impl<'s> SelectedPages<'s> {
    pub fn new(inner: &'s dyn PageSource, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }

    /// Inner-document index of each page in the view.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    fn inner_index(&self, index: usize) -> Result<usize, PageError> {
        self.indices
            .get(index)
            .copied()
            .ok_or_else(|| PageError::RenderFailed {
                page: index + 1,
                detail: "page not in selection".into(),
            })
    }
}

impl PageSource for SelectedPages<'_> {
    fn page_count(&self) -> usize {
        self.indices.len()
    }

    fn page_size(&self, index: usize) -> Result<PageSize, PageError> {
        self.inner.page_size(self.inner_index(index)?)
    }

    fn render_page(&self, index: usize) -> Result<RenderedPage, PageError> {
        self.inner.render_page(self.inner_index(index)?)
    }
}

// ── In-memory documents ──────────────────────────────────────────────────

/// One page of a [`MemoryDocument`]: a size and either pixels or a render failure.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub size: PageSize,
    pub raster: Result<RgbImage, String>,
}

impl MemoryPage {
    pub fn ok(size: PageSize, image: RgbImage) -> Self {
        Self {
            size,
            raster: Ok(image),
        }
    }

    /// A page whose rasterisation always fails with `detail`.
    pub fn corrupt(size: PageSize, detail: impl Into<String>) -> Self {
        Self {
            size,
            raster: Err(detail.into()),
        }
    }
}

/// A document whose pages are already rasterised.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pub pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self { pages }
    }

    fn get(&self, index: usize) -> Result<&MemoryPage, PageError> {
        self.pages.get(index).ok_or_else(|| PageError::RenderFailed {
            page: index + 1,
            detail: format!("page index out of range (document has {})", self.pages.len()),
        })
    }
}

impl PageSource for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<PageSize, PageError> {
        Ok(self.get(index)?.size)
    }

    fn render_page(&self, index: usize) -> Result<RenderedPage, PageError> {
        let page = self.get(index)?;
        match &page.raster {
            Ok(image) => Ok(RenderedPage {
                size: page.size,
                image: image.clone(),
            }),
            Err(detail) => Err(PageError::RenderFailed {
                page: index + 1,
                detail: detail.clone(),
            }),
        }
    }
}

/// A [`DocumentLoader`] that serves [`MemoryDocument`]s registered by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<PathBuf, MemoryDocument>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `path`, replacing any previous entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, document: MemoryDocument) {
        self.documents.insert(path.into(), document);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, document: MemoryDocument) -> Self {
        self.insert(path, document);
        self
    }
}

impl DocumentLoader for MemoryLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, DarkPdfError> {
        self.documents
            .get(path)
            .map(|doc| Box::new(doc.clone()) as Box<dyn PageSource + 'a>)
            .ok_or_else(|| DarkPdfError::FileNotFound {
                path: path.to_path_buf(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn doc() -> MemoryDocument {
        MemoryDocument::new(vec![
            MemoryPage::ok(PageSize::new(100.0, 200.0), RgbImage::new(10, 20)),
            MemoryPage::corrupt(PageSize::new(300.0, 400.0), "bad stream"),
            MemoryPage::ok(
                PageSize::new(50.0, 50.0),
                RgbImage::from_pixel(5, 5, Rgb([1, 2, 3])),
            ),
        ])
    }

    #[test]
    fn memory_document_reports_failures_with_page_numbers() {
        let d = doc();
        assert_eq!(d.page_count(), 3);
        let err = d.render_page(1).unwrap_err();
        assert_eq!(err.page(), 2);
        assert_eq!(d.page_size(1).unwrap(), PageSize::new(300.0, 400.0));
        assert!(d.render_page(7).is_err());
    }

    #[test]
    fn selected_pages_maps_indices() {
        let d = doc();
        let view = SelectedPages::new(&d, vec![0, 2]);
        assert_eq!(view.page_count(), 2);
        assert_eq!(view.page_size(1).unwrap(), PageSize::new(50.0, 50.0));
        assert_eq!(view.render_page(1).unwrap().image.width(), 5);
        assert!(view.render_page(2).is_err());
    }

    #[test]
    fn memory_loader_unknown_path_is_not_found() {
        let loader = MemoryLoader::new().with("a.pdf", doc());
        assert!(loader.open(Path::new("a.pdf")).is_ok());
        assert!(matches!(
            loader.open(Path::new("b.pdf")),
            Err(DarkPdfError::FileNotFound { .. })
        ));
    }
}
