//! PDF export: write the cached inverted rasters as a new, image-only PDF.
//!
//! Page `i` of the output has the size of source page `i` and shows the
//! inverted raster stretched over the full page rectangle. A page whose slot
//! is a failure marker becomes a placeholder page, sized like the first
//! source page, carrying a one-line notice.
//!
//! The file is written to a temporary sibling of the destination and renamed
//! into place only after serialisation succeeded, so a failed export never
//! leaves a truncated PDF behind.

use crate::document::LoadedDocument;
use crate::error::DarkPdfError;
use crate::pipeline::cache::PageSlot;
use crate::pipeline::encode;
use crate::pipeline::render::PageSize;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Left margin and top offset (points) of the placeholder notice.
const NOTICE_INSET: f32 = 50.0;

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub pages: usize,
    pub placeholder_pages: usize,
    pub bytes: u64,
}

/// Text written on the placeholder page for 1-indexed `page_num`.
pub fn placeholder_notice(page_num: usize) -> String {
    format!("Page {} could not be processed.", page_num)
}

/// Assemble the output document in memory.
pub fn build_document(doc: &LoadedDocument, font_size: f32) -> Result<Document, String> {
    if doc.cache().is_empty() {
        return Err("document has no pages".to_string());
    }

    let mut out = Document::with_version("1.5");
    let pages_id = out.new_object_id();
    let font_id = out.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let fallback = doc.placeholder_size();
    let mut kids: Vec<Object> = Vec::with_capacity(doc.cache().len());

    for (index, slot) in doc.cache().slots().iter().enumerate() {
        let page_id = match slot {
            PageSlot::Inverted { size, image } => add_image_page(&mut out, pages_id, *size, image)?,
            PageSlot::Failed(e) => {
                warn!(
                    "Writing placeholder for page {} due to processing error: {}",
                    index + 1,
                    e
                );
                add_placeholder_page(&mut out, pages_id, fallback, font_id, index + 1, font_size)?
            }
        };
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    out.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = out.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = out.add_object(dictionary! {
        "Producer" => Object::string_literal(concat!("pdf-darkmode ", env!("CARGO_PKG_VERSION"))),
    });
    out.trailer.set("Root", catalog_id);
    out.trailer.set("Info", info_id);

    Ok(out)
}

fn media_box(size: PageSize) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        size.width.into(),
        size.height.into(),
    ])
}

fn add_page(
    out: &mut Document,
    pages_id: ObjectId,
    size: PageSize,
    operations: Vec<Operation>,
    resources: lopdf::Dictionary,
) -> Result<ObjectId, String> {
    let content = Content { operations }
        .encode()
        .map_err(|e| format!("content stream: {e}"))?;
    let content_id = out.add_object(Stream::new(lopdf::Dictionary::new(), content));
    Ok(out.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box(size),
        "Contents" => content_id,
        "Resources" => resources,
    }))
}

fn add_image_page(
    out: &mut Document,
    pages_id: ObjectId,
    size: PageSize,
    image: &RgbImage,
) -> Result<ObjectId, String> {
    let data = encode::encode_flate_rgb(image).map_err(|e| format!("image stream: {e}"))?;
    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
        },
        data,
    )
    .with_compression(false);
    let image_id = out.add_object(image_stream);

    // Image space is the unit square; scale it to the full page box.
    let operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                size.width.into(),
                Object::Integer(0),
                Object::Integer(0),
                size.height.into(),
                Object::Integer(0),
                Object::Integer(0),
            ],
        ),
        Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
        Operation::new("Q", vec![]),
    ];
    let resources = dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    };
    add_page(out, pages_id, size, operations, resources)
}

fn add_placeholder_page(
    out: &mut Document,
    pages_id: ObjectId,
    size: PageSize,
    font_id: ObjectId,
    page_num: usize,
    font_size: f32,
) -> Result<ObjectId, String> {
    let operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), font_size.into()]),
        Operation::new(
            "Td",
            vec![NOTICE_INSET.into(), (size.height - NOTICE_INSET).into()],
        ),
        Operation::new(
            "Tj",
            vec![Object::string_literal(placeholder_notice(page_num))],
        ),
        Operation::new("ET", vec![]),
    ];
    let resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };
    add_page(out, pages_id, size, operations, resources)
}

/// Export `doc` to `dest`, replacing any existing file only on success.
pub fn export_pdf(
    doc: &LoadedDocument,
    dest: impl AsRef<Path>,
    font_size: f32,
) -> Result<ExportSummary, DarkPdfError> {
    let dest = dest.as_ref();
    let export_failed = |detail: String| DarkPdfError::ExportFailed {
        path: dest.to_path_buf(),
        detail,
    };
    let write_failed = |source: std::io::Error| DarkPdfError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };

    let mut out = build_document(doc, font_size).map_err(export_failed)?;

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_failed)?;

    // Dropping `tmp` on any early return deletes the partial file.
    let mut tmp = tempfile::Builder::new()
        .prefix(".pdfdark-")
        .suffix(".pdf.tmp")
        .tempfile_in(&dir)
        .map_err(write_failed)?;

    out.save_to(&mut tmp)
        .map_err(|e| export_failed(format!("serialisation failed: {e}")))?;
    tmp.flush().map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    let bytes = tmp.as_file().metadata().map_err(write_failed)?.len();
    debug!("Serialised inverted PDF to {} ({} bytes)", tmp.path().display(), bytes);

    tmp.persist(dest).map_err(|e| write_failed(e.error))?;

    let placeholder_pages = doc.cache().failed_count();
    info!(
        "Inverted PDF saved to {} ({} pages, {} placeholders, {} bytes)",
        dest.display(),
        doc.cache().len(),
        placeholder_pages,
        bytes
    );

    Ok(ExportSummary {
        path: dest.to_path_buf(),
        pages: doc.cache().len(),
        placeholder_pages,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::{MemoryDocument, MemoryPage};
    use image::Rgb;

    fn loaded(pages: Vec<MemoryPage>) -> LoadedDocument {
        LoadedDocument::build("in.pdf", &MemoryDocument::new(pages), None)
    }

    fn media_box_of(doc: &Document, page_id: ObjectId) -> (f32, f32) {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
        (mb[2].as_float().unwrap(), mb[3].as_float().unwrap())
    }

    #[test]
    fn one_page_per_slot_with_source_sizes() {
        let doc = loaded(vec![
            MemoryPage::ok(PageSize::new(612.0, 792.0), RgbImage::new(6, 8)),
            MemoryPage::ok(PageSize::new(842.0, 595.0), RgbImage::new(8, 6)),
        ]);
        let out = build_document(&doc, 12.0).unwrap();
        let pages = out.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(media_box_of(&out, pages[&1]), (612.0, 792.0));
        assert_eq!(media_box_of(&out, pages[&2]), (842.0, 595.0));
    }

    #[test]
    fn failed_slot_becomes_placeholder_with_first_page_size() {
        let doc = loaded(vec![
            MemoryPage::ok(PageSize::new(400.0, 600.0), RgbImage::new(4, 6)),
            MemoryPage::corrupt(PageSize::new(100.0, 100.0), "bad"),
        ]);
        let out = build_document(&doc, 12.0).unwrap();
        let pages = out.get_pages();
        assert_eq!(media_box_of(&out, pages[&2]), (400.0, 600.0));
        let content = out.get_page_content(pages[&2]).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("(Page 2 could not be processed.) Tj"), "got: {text:?}");
        assert!(!text.contains("Do"), "placeholder must not draw an image");
    }

    #[test]
    fn image_xobject_carries_raster_dimensions() {
        let doc = loaded(vec![MemoryPage::ok(
            PageSize::new(72.0, 144.0),
            RgbImage::from_pixel(3, 5, Rgb([255, 255, 255])),
        )]);
        let out = build_document(&doc, 12.0).unwrap();
        let image = out
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(&b"Image"[..]))
            .expect("image xobject");
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 3);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 5);
        let raw = image.decompressed_content().unwrap();
        assert!(raw.iter().all(|&b| b == 0), "white page must be stored inverted");
    }

    #[test]
    fn summary_reports_written_size() {
        let doc = loaded(vec![MemoryPage::ok(PageSize::LETTER, RgbImage::new(4, 4))]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("sized.pdf");
        let summary = export_pdf(&doc, &dest, 12.0).unwrap();
        assert!(summary.bytes > 0);
        assert_eq!(summary.bytes, std::fs::metadata(&dest).unwrap().len());
    }

    #[test]
    fn empty_cache_is_an_export_error() {
        let doc = loaded(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let err = export_pdf(&doc, dir.path().join("x.pdf"), 12.0).unwrap_err();
        assert!(err.is_export_error());
        assert!(!dir.path().join("x.pdf").exists());
    }

    #[test]
    fn unwritable_destination_leaves_no_file() {
        let doc = loaded(vec![MemoryPage::ok(PageSize::LETTER, RgbImage::new(2, 2))]);
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be replaced by the rename.
        let dest = dir.path().join("taken");
        std::fs::create_dir(&dest).unwrap();
        let err = export_pdf(&doc, &dest, 12.0).unwrap_err();
        assert!(err.is_export_error(), "got {err:?}");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
