//! Batch entry points: PDF in, inverted PDF out, no viewer involved.
//!
//! pdfium is a blocking C library, so the async functions here move all
//! rendering and export work onto `tokio::task::spawn_blocking`. The pdfium
//! instance is bound inside that blocking task and dropped with it. The
//! loader-generic `*_with` functions hold the actual logic and run on the
//! caller's thread.

use crate::config::DarkModeConfig;
use crate::document::{self, DocumentSummary, LoadedDocument};
use crate::error::DarkPdfError;
use crate::pipeline::export;
use crate::pipeline::render::{DocumentLoader, PdfiumLoader, SelectedPages};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Selected pages that were rasterised and inverted.
    pub processed_pages: usize,
    /// Selected pages written as placeholders.
    pub failed_pages: usize,
    /// Pages left out by the page selection.
    pub skipped_pages: usize,
    pub render_duration_ms: u64,
    pub export_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the written file (0 when nothing was written).
    pub output_bytes: u64,
}

/// A converted document held in memory.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub document: LoadedDocument,
    pub stats: ConversionStats,
}

/// Open `input` with `loader`, keep the selected pages and build their cache.
pub fn convert_with<L: DocumentLoader>(
    loader: &L,
    input: &Path,
    config: &DarkModeConfig,
) -> Result<ConversionOutput, DarkPdfError> {
    let start = Instant::now();
    let source = loader.open(input)?;
    let total_pages = source.page_count();
    if total_pages == 0 {
        return Err(DarkPdfError::EmptyDocument {
            path: input.to_path_buf(),
        });
    }

    let indices = config.pages.to_indices(total_pages);
    if indices.is_empty() {
        return Err(DarkPdfError::PageOutOfRange { total: total_pages });
    }
    debug!("Selected {} of {} pages", indices.len(), total_pages);

    let progress = config.progress_callback.as_deref();
    let document = if config.pages.is_all() {
        LoadedDocument::build_viewable(input, source.as_ref(), progress)?
    } else {
        // Placeholders follow the first page of the whole document, not of the selection.
        let placeholder_size = document::first_page_size(source.as_ref());
        let view = SelectedPages::new(source.as_ref(), indices);
        LoadedDocument::build_viewable(input, &view, progress)?
            .with_placeholder_size(placeholder_size)
    };
    drop(source);

    let stats = ConversionStats {
        total_pages,
        processed_pages: document.cache().success_count(),
        failed_pages: document.cache().failed_count(),
        skipped_pages: total_pages - document.page_count(),
        render_duration_ms: start.elapsed().as_millis() as u64,
        ..ConversionStats::default()
    };
    info!(
        "Inverted {}/{} selected pages in {}ms",
        stats.processed_pages,
        document.page_count(),
        stats.render_duration_ms
    );

    Ok(ConversionOutput { document, stats })
}

/// Convert `input` with `loader` and write the inverted PDF to `output`.
pub fn convert_to_file_with<L: DocumentLoader>(
    loader: &L,
    input: &Path,
    output: &Path,
    config: &DarkModeConfig,
) -> Result<ConversionStats, DarkPdfError> {
    let start = Instant::now();
    let ConversionOutput {
        document,
        mut stats,
    } = convert_with(loader, input, config)?;

    let export_start = Instant::now();
    let summary = export::export_pdf(&document, output, config.placeholder_font_size)?;
    stats.export_duration_ms = export_start.elapsed().as_millis() as u64;
    stats.total_duration_ms = start.elapsed().as_millis() as u64;
    stats.output_bytes = summary.bytes;
    Ok(stats)
}

/// Page count and sizes of `input` without rendering anything.
pub fn inspect_with<L: DocumentLoader>(
    loader: &L,
    input: &Path,
) -> Result<DocumentSummary, DarkPdfError> {
    let source = loader.open(input)?;
    let pages = document::page_infos(source.as_ref());
    Ok(DocumentSummary {
        path: input.to_path_buf(),
        page_count: pages.len(),
        pages,
    })
}

// ── pdfium-backed async API ─────────────────────────────────────────────

async fn run_blocking<T, F>(what: &'static str, f: F) -> Result<T, DarkPdfError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DarkPdfError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DarkPdfError::Internal(format!("{what} task panicked: {e}")))?
}

/// Render and invert a PDF into memory.
///
/// # Errors
/// Fatal errors only: unreadable input, not a PDF, zero pages, no selected
/// page in range, or every selected page failing. Individual page failures
/// are recorded in the returned cache.
pub async fn convert(
    input: impl AsRef<Path>,
    config: &DarkModeConfig,
) -> Result<ConversionOutput, DarkPdfError> {
    let input = input.as_ref().to_path_buf();
    let config = config.clone();
    info!("Starting conversion: {}", input.display());

    run_blocking("Render", move || {
        let loader = PdfiumLoader::new(&config)?;
        convert_with(&loader, &input, &config)
    })
    .await
}

/// Convert a PDF and write the inverted copy to `output_path`.
///
/// The output is written atomically (temp file + rename).
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &DarkModeConfig,
) -> Result<ConversionStats, DarkPdfError> {
    let input = input.as_ref().to_path_buf();
    let output: PathBuf = output_path.as_ref().to_path_buf();
    let config = config.clone();
    info!("Starting conversion: {} → {}", input.display(), output.display());

    run_blocking("Conversion", move || {
        let loader = PdfiumLoader::new(&config)?;
        convert_to_file_with(&loader, &input, &output, &config)
    })
    .await
}

/// Synchronous wrapper around [`convert_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_to_file_sync(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &DarkModeConfig,
) -> Result<ConversionStats, DarkPdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DarkPdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_to_file(input, output_path, config))
}

/// Read page count and page sizes without rendering.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &DarkModeConfig,
) -> Result<DocumentSummary, DarkPdfError> {
    let input = input.as_ref().to_path_buf();
    let config = config.clone();
    run_blocking("Inspect", move || {
        let loader = PdfiumLoader::new(&config)?;
        inspect_with(&loader, &input)
    })
    .await
}
