//! Error types for the pdf-darkmode library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DarkPdfError`] — **Fatal** for the operation at hand: the document
//!   cannot be opened (bad path, not a PDF, wrong password, nothing renderable)
//!   or the inverted copy cannot be written. Returned as `Err(DarkPdfError)`
//!   from [`crate::session::Session`] methods and the `convert*` entry points.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed to rasterise or
//!   invert. Stored in the failed [`crate::pipeline::cache::PageSlot`] so the
//!   remaining pages stay viewable and exportable.
//!
//! A fatal error never poisons the session: after an open or export failure
//! the caller can simply try again.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-darkmode library.
///
/// Page-level failures use [`PageError`] and are stored in the page cache
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum DarkPdfError {
    // ── Document open errors ──────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document opened but has no pages to invert.
    #[error("PDF '{path}' has no pages")]
    EmptyDocument { path: PathBuf },

    /// Every page failed to rasterise; there is nothing to view.
    #[error("Could not process any of the {total} pages.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// The output document could not be assembled or serialised.
    #[error("Could not build inverted PDF '{path}': {detail}")]
    ExportFailed { path: PathBuf, detail: String },

    /// Could not create, write or rename the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Session errors ────────────────────────────────────────────────────
    /// An operation that needs an open document was called without one.
    #[error("No PDF loaded or processed")]
    NoDocument,

    /// Selected page numbers exceed the actual page count.
    #[error("No selected page is in range (document has {total} pages)")]
    PageOutOfRange { total: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium in the current directory, install it system-wide,\n\
or pass its location with --pdfium-lib /path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DarkPdfError {
    /// `true` for failures that leave the session without a document.
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            DarkPdfError::FileNotFound { .. }
                | DarkPdfError::PermissionDenied { .. }
                | DarkPdfError::NotAPdf { .. }
                | DarkPdfError::CorruptPdf { .. }
                | DarkPdfError::PasswordRequired { .. }
                | DarkPdfError::WrongPassword { .. }
                | DarkPdfError::EmptyDocument { .. }
                | DarkPdfError::AllPagesFailed { .. }
        )
    }

    /// `true` for failures while writing the inverted copy.
    pub fn is_export_error(&self) -> bool {
        matches!(
            self,
            DarkPdfError::ExportFailed { .. } | DarkPdfError::OutputWriteFailed { .. }
        )
    }
}

/// A non-fatal error for a single page.
///
/// Stored in the page cache when a page fails. Page numbers are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed (corrupt page, unsupported content).
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered bitmap could not be turned into an inverted RGB image.
    #[error("Page {page}: inversion failed: {detail}")]
    InvertFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } | PageError::InvertFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_pages_failed_display() {
        let e = DarkPdfError::AllPagesFailed {
            total: 3,
            first_error: "Page 1: rasterisation failed: bad xobject".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 pages"), "got: {msg}");
        assert!(msg.contains("bad xobject"), "got: {msg}");
    }

    #[test]
    fn taxonomy_classification() {
        let open = DarkPdfError::EmptyDocument {
            path: PathBuf::from("a.pdf"),
        };
        assert!(open.is_open_error());
        assert!(!open.is_export_error());

        let export = DarkPdfError::ExportFailed {
            path: PathBuf::from("out.pdf"),
            detail: "disk full".into(),
        };
        assert!(export.is_export_error());
        assert!(!export.is_open_error());

        assert!(!DarkPdfError::NoDocument.is_open_error());
    }

    #[test]
    fn page_error_reports_page() {
        let e = PageError::RenderFailed {
            page: 2,
            detail: "unsupported content".into(),
        };
        assert_eq!(e.page(), 2);
        assert!(e.to_string().starts_with("Page 2:"));
    }
}
