//! Viewer session: the open document, its cache and the current page.
//!
//! [`Session`] is the navigation state machine a front end drives:
//!
//! ```text
//!              open(ok)                     next / prev
//! NoDocument ───────────▶ DocumentLoaded(0) ◀──────────▶ DocumentLoaded(i)
//!     ▲                        │
//!     └── open(err) / close ───┘
//! ```
//!
//! Opening always releases the previous document first, so a failed open
//! leaves the session in `NoDocument` with no stale pages behind.

use crate::config::DarkModeConfig;
use crate::document::LoadedDocument;
use crate::error::DarkPdfError;
use crate::pipeline::cache::PageSlot;
use crate::pipeline::export::{self, ExportSummary};
use crate::pipeline::encode;
use crate::pipeline::render::{DocumentLoader, PageSize};
use image::DynamicImage;
use std::path::Path;
use tracing::{error, info};

/// Where the viewer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    NoDocument,
    DocumentLoaded { current: usize },
}

/// What to show for the current page, derived on demand from the cache.
#[derive(Debug, Clone)]
pub enum PageView {
    /// Display-ready copy of the inverted raster.
    Image {
        page_num: usize,
        size: PageSize,
        image: DynamicImage,
    },
    /// The page failed; show `message` instead of an image.
    Placeholder { page_num: usize, message: String },
}

impl PageView {
    pub fn page_num(&self) -> usize {
        match self {
            PageView::Image { page_num, .. } | PageView::Placeholder { page_num, .. } => *page_num,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, PageView::Placeholder { .. })
    }

    /// PNG bytes of the page image; None for placeholders.
    pub fn to_png(&self) -> Option<Result<Vec<u8>, image::ImageError>> {
        match self {
            PageView::Image { image, .. } => Some(encode::encode_png(image)),
            PageView::Placeholder { .. } => None,
        }
    }
}

/// Message shown in place of a page that could not be processed.
pub const PLACEHOLDER_MESSAGE: &str = "Error: Page could not be displayed";

/// A viewer session over one document loader.
pub struct Session<L> {
    loader: L,
    config: DarkModeConfig,
    document: Option<LoadedDocument>,
    current: usize,
}

impl<L: DocumentLoader> Session<L> {
    pub fn new(loader: L, config: DarkModeConfig) -> Self {
        Self {
            loader,
            config,
            document: None,
            current: 0,
        }
    }

    pub fn state(&self) -> ViewerState {
        match self.document {
            Some(_) => ViewerState::DocumentLoaded {
                current: self.current,
            },
            None => ViewerState::NoDocument,
        }
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn config(&self) -> &DarkModeConfig {
        &self.config
    }

    /// Open `path`, replacing any current document.
    ///
    /// The previous document is released before the new one is acquired.
    /// On failure the session is left in `NoDocument`.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), DarkPdfError> {
        let path = path.as_ref();
        self.close();

        let result = self.loader.open(path).and_then(|source| {
            LoadedDocument::build_viewable(
                path,
                source.as_ref(),
                self.config.progress_callback.as_deref(),
            )
        });

        match result {
            Ok(doc) => {
                info!(
                    "Opened {}: {}/{} pages inverted",
                    path.display(),
                    doc.cache().success_count(),
                    doc.page_count()
                );
                self.document = Some(doc);
                self.current = 0;
                Ok(())
            }
            Err(e) => {
                error!("Could not open or process PDF {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Drop the current document and return to `NoDocument`.
    pub fn close(&mut self) {
        if let Some(doc) = self.document.take() {
            info!("Closed {}", doc.path().display());
        }
        self.current = 0;
    }

    fn loaded(&self) -> Result<&LoadedDocument, DarkPdfError> {
        self.document.as_ref().ok_or(DarkPdfError::NoDocument)
    }

    pub fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, LoadedDocument::page_count)
    }

    /// Advance one page; a no-op on the last page. Returns the new index.
    pub fn next(&mut self) -> Result<usize, DarkPdfError> {
        let count = self.loaded()?.page_count();
        if self.current + 1 < count {
            self.current += 1;
        }
        Ok(self.current)
    }

    /// Go back one page; a no-op on the first page. Returns the new index.
    pub fn prev(&mut self) -> Result<usize, DarkPdfError> {
        self.loaded()?;
        if self.current > 0 {
            self.current -= 1;
        }
        Ok(self.current)
    }

    /// Jump to 0-based `index`, clamped to the last page.
    pub fn go_to(&mut self, index: usize) -> Result<usize, DarkPdfError> {
        let count = self.loaded()?.page_count();
        self.current = index.min(count.saturating_sub(1));
        Ok(self.current)
    }

    /// The view for the current page. Does not change navigation state.
    pub fn current_view(&self) -> Result<PageView, DarkPdfError> {
        let doc = self.loaded()?;
        let page_num = self.current + 1;
        match doc.slot(self.current) {
            Some(PageSlot::Inverted { size, image }) => Ok(PageView::Image {
                page_num,
                size: *size,
                image: DynamicImage::ImageRgb8(image.clone()),
            }),
            Some(PageSlot::Failed(_)) | None => Ok(PageView::Placeholder {
                page_num,
                message: PLACEHOLDER_MESSAGE.to_string(),
            }),
        }
    }

    /// Current page indicator: `Page: i/N`, with ` (Error)` for failed pages.
    pub fn page_label(&self) -> String {
        match &self.document {
            None => "Page: -/-".to_string(),
            Some(doc) => {
                let failed = doc.slot(self.current).is_some_and(PageSlot::is_failed);
                format!(
                    "Page: {}/{}{}",
                    self.current + 1,
                    doc.page_count(),
                    if failed { " (Error)" } else { "" }
                )
            }
        }
    }

    pub fn can_prev(&self) -> bool {
        self.document.is_some() && self.current > 0
    }

    pub fn can_next(&self) -> bool {
        self.document.is_some() && self.current + 1 < self.page_count()
    }

    /// Saving needs at least one cached page.
    pub fn can_save(&self) -> bool {
        self.document
            .as_ref()
            .is_some_and(|d| d.cache().success_count() > 0)
    }

    /// Export the inverted document to `dest`.
    pub fn export(&self, dest: impl AsRef<Path>) -> Result<ExportSummary, DarkPdfError> {
        let doc = self.loaded()?;
        export::export_pdf(doc, dest, self.config.placeholder_font_size).inspect_err(|e| {
            error!("Could not save inverted PDF: {}", e);
        })
    }
}
