//! An opened document: per-page metadata plus its fully built page cache.

use crate::error::DarkPdfError;
use crate::pipeline::cache::{build_page_cache, PageCache, PageSlot};
use crate::pipeline::render::{PageSize, PageSource};
use crate::progress::PageProgressCallback;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata for one source page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 0-based page index.
    pub index: usize,
    /// Page box size, or None if the page could not even be loaded.
    pub size: Option<PageSize>,
}

/// Page count and sizes, as reported by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub path: PathBuf,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

/// A document whose pages have been rasterised, inverted and cached.
///
/// The pdfium handle it was built from has already been released; everything
/// the viewer and exporter need lives here.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    path: PathBuf,
    pages: Vec<PageInfo>,
    cache: PageCache,
    placeholder_size: PageSize,
}

/// Size for placeholder pages: the first page's size, else the first known
/// size, else US Letter.
pub fn first_page_size(source: &dyn PageSource) -> PageSize {
    (0..source.page_count())
        .find_map(|i| source.page_size(i).ok())
        .unwrap_or(PageSize::LETTER)
}

/// Read every page's size without rendering.
pub fn page_infos(source: &dyn PageSource) -> Vec<PageInfo> {
    (0..source.page_count())
        .map(|index| PageInfo {
            index,
            size: source.page_size(index).ok(),
        })
        .collect()
}

impl LoadedDocument {
    /// Read page metadata and build the page cache from an open handle.
    ///
    /// Never fails: per-page problems become failure markers. Whether an
    /// empty or all-failed document is acceptable is the caller's decision.
    pub fn build(
        path: impl Into<PathBuf>,
        source: &dyn PageSource,
        progress: Option<&dyn PageProgressCallback>,
    ) -> Self {
        let pages = page_infos(source);
        let cache = build_page_cache(source, progress);
        let placeholder_size = first_page_size(source);
        Self {
            path: path.into(),
            pages,
            cache,
            placeholder_size,
        }
    }

    /// Override the placeholder page size, e.g. with the first page of the
    /// full document when `source` was only a selection of it.
    pub fn with_placeholder_size(mut self, size: PageSize) -> Self {
        self.placeholder_size = size;
        self
    }

    /// Build, then reject documents with nothing to show.
    pub fn build_viewable(
        path: impl Into<PathBuf>,
        source: &dyn PageSource,
        progress: Option<&dyn PageProgressCallback>,
    ) -> Result<Self, DarkPdfError> {
        let doc = Self::build(path, source, progress);
        doc.ensure_viewable()?;
        Ok(doc)
    }

    /// `EmptyDocument` for zero pages, `AllPagesFailed` when no slot holds an image.
    pub fn ensure_viewable(&self) -> Result<(), DarkPdfError> {
        if self.page_count() == 0 {
            return Err(DarkPdfError::EmptyDocument {
                path: self.path.clone(),
            });
        }
        if self.cache.success_count() == 0 {
            return Err(DarkPdfError::AllPagesFailed {
                total: self.page_count(),
                first_error: self
                    .cache
                    .first_error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn slot(&self, index: usize) -> Option<&PageSlot> {
        self.cache.get(index)
    }

    /// Size of page `index`: from its cache slot if it rendered, else from
    /// the page metadata.
    pub fn page_size(&self, index: usize) -> Option<PageSize> {
        match self.cache.get(index) {
            Some(PageSlot::Inverted { size, .. }) => Some(*size),
            _ => self.pages.get(index).and_then(|p| p.size),
        }
    }

    /// Size used for placeholder pages.
    pub fn placeholder_size(&self) -> PageSize {
        self.placeholder_size
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            path: self.path.clone(),
            page_count: self.page_count(),
            pages: self.pages.clone(),
        }
    }
}
