//! End-to-end tests against a real libpdfium.
//!
//! Source PDFs are generated on the fly with lopdf, so no fixture files are
//! needed, but libpdfium must be loadable. The tests are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 LD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture

use image::Rgb;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_darkmode::{
    convert, convert_to_file, inspect, DarkModeConfig, DarkPdfError, PageSelection, PageSize,
    PageView, PdfiumLoader, Session,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

/// Write a PDF with one page per entry of `sizes`, each with a black
/// 20×20 pt square at the bottom-left corner on an otherwise blank page.
fn write_sample_pdf(path: &Path, sizes: &[(f32, f32)]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for &(w, h) in sizes {
        let content = Content {
            operations: vec![
                Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
                Operation::new("re", vec![0.into(), 0.into(), 20.into(), 20.into()]),
                Operation::new("f", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            lopdf::Dictionary::new(),
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(w), Object::Real(h)],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn sample(dir: &Path, sizes: &[(f32, f32)]) -> PathBuf {
    let path = dir.join("sample.pdf");
    write_sample_pdf(&path, sizes);
    path
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_reports_page_sizes() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let input = sample(dir.path(), &[(612.0, 792.0), (842.0, 595.0)]);

    let summary = inspect(&input, &DarkModeConfig::default()).await.unwrap();
    assert_eq!(summary.page_count, 2);
    assert_eq!(summary.pages[1].size, Some(PageSize::new(842.0, 595.0)));
}

#[tokio::test]
async fn test_not_a_pdf_is_rejected() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.pdf");
    std::fs::write(&input, b"just some text, not a PDF").unwrap();

    let err = convert(&input, &DarkModeConfig::default()).await.unwrap_err();
    assert!(matches!(err, DarkPdfError::NotAPdf { .. }), "got {err:?}");
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_inverts_rendered_pixels() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let input = sample(dir.path(), &[(200.0, 100.0)]);

    let out = convert(&input, &DarkModeConfig::default()).await.unwrap();
    let image = out.document.slot(0).and_then(|s| s.image()).unwrap();

    // At 72 DPI one pixel is one point.
    assert_eq!(image.dimensions(), (200, 100));
    // Blank paper turns black, the black square turns white.
    assert_eq!(image.get_pixel(150, 10), &Rgb([0, 0, 0]));
    assert_eq!(image.get_pixel(5, 95), &Rgb([255, 255, 255]));
}

#[tokio::test]
async fn test_convert_to_file_keeps_page_sizes() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let input = sample(dir.path(), &[(612.0, 792.0), (300.0, 400.0), (842.0, 595.0)]);
    let output = dir.path().join("sample-dark.pdf");

    let config = DarkModeConfig::builder().dpi(144).build().unwrap();
    let stats = convert_to_file(&input, &output, &config).await.unwrap();
    assert_eq!(stats.processed_pages, 3);
    assert_eq!(stats.failed_pages, 0);

    let written = Document::load(&output).unwrap();
    assert_eq!(written.get_pages().len(), 3);

    let again = inspect(&output, &DarkModeConfig::default()).await.unwrap();
    let sizes: Vec<_> = again.pages.iter().filter_map(|p| p.size).collect();
    assert_eq!(
        sizes,
        vec![
            PageSize::new(612.0, 792.0),
            PageSize::new(300.0, 400.0),
            PageSize::new(842.0, 595.0),
        ]
    );
}

#[tokio::test]
async fn test_page_selection() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let input = sample(dir.path(), &[(100.0, 100.0), (200.0, 200.0), (300.0, 300.0)]);

    let config = DarkModeConfig::builder()
        .pages(PageSelection::Set(vec![1, 3]))
        .build()
        .unwrap();
    let out = convert(&input, &config).await.unwrap();
    assert_eq!(out.document.page_count(), 2);
    assert_eq!(out.document.page_size(1), Some(PageSize::new(300.0, 300.0)));
    assert_eq!(out.stats.skipped_pages, 1);
}

// ── Viewer session ───────────────────────────────────────────────────────────

#[test]
fn test_session_with_pdfium() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let input = sample(dir.path(), &[(100.0, 150.0), (150.0, 100.0)]);

    let config = DarkModeConfig::default();
    let mut session = Session::new(PdfiumLoader::new(&config).unwrap(), config);
    session.open(&input).unwrap();
    assert_eq!(session.page_label(), "Page: 1/2");

    session.next().unwrap();
    match session.current_view().unwrap() {
        PageView::Image { image, .. } => assert_eq!((image.width(), image.height()), (150, 100)),
        other => panic!("expected image, got {other:?}"),
    }

    let output = dir.path().join("viewer-dark.pdf");
    let summary = session.export(&output).unwrap();
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.placeholder_pages, 0);
}
