//! # pdf-darkmode
//!
//! View and export colour-inverted ("dark mode") renderings of PDF documents.
//!
//! Every page is rasterised with pdfium, each RGB channel is replaced by its
//! complement, and the results are cached for the lifetime of the open
//! document. The cache can be browsed page by page through a [`Session`] or
//! written out as a new, image-only PDF whose pages keep the source page
//! sizes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate path and %PDF magic
//!  ├─ 2. Render  rasterise pages via pdfium (blocking, spawn_blocking in async API)
//!  ├─ 3. Invert  v → 255 - v per channel
//!  ├─ 4. Cache   one slot per page: inverted raster or failure marker
//!  └─ 5. Export  lopdf document, one full-page image per source page
//! ```
//!
//! A page that fails to render becomes a failure marker: the viewer shows a
//! placeholder for it and the exporter writes a placeholder page, while every
//! other page is processed normally.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_darkmode::{convert_to_file, DarkModeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DarkModeConfig::default();
//!     let stats = convert_to_file("paper.pdf", "paper-dark.pdf", &config).await?;
//!     eprintln!("{}/{} pages inverted", stats.processed_pages, stats.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive use
//!
//! ```rust,no_run
//! use pdf_darkmode::{DarkModeConfig, PdfiumLoader, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DarkModeConfig::default();
//! let mut session = Session::new(PdfiumLoader::new(&config)?, config);
//! session.open("paper.pdf")?;
//! session.next()?;
//! println!("{}", session.page_label());
//! session.export("paper-dark.pdf")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfdark` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DarkModeConfig, DarkModeConfigBuilder, PageSelection};
pub use convert::{
    convert, convert_to_file, convert_to_file_sync, convert_to_file_with, convert_with, inspect,
    inspect_with, ConversionOutput, ConversionStats,
};
pub use document::{DocumentSummary, LoadedDocument, PageInfo};
pub use error::{DarkPdfError, PageError};
pub use pipeline::cache::{build_page_cache, PageCache, PageSlot};
pub use pipeline::export::{export_pdf, ExportSummary};
pub use pipeline::invert::invert;
pub use pipeline::render::{
    DocumentLoader, MemoryDocument, MemoryLoader, MemoryPage, PageSize, PageSource, PdfiumLoader,
    RenderedPage,
};
pub use progress::{NoopProgressCallback, PageProgressCallback, ProgressCallback};
pub use session::{PageView, Session, ViewerState};
