//! Pipeline stages for dark-mode PDF processing.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ invert ──▶ cache ──▶ encode ──▶ export
//! (path)    (pdfium)   (255-v)    (slots)   (flate)    (lopdf)
//! ```
//!
//! 1. [`input`]  — validate the user-supplied path before pdfium opens it
//! 2. [`render`] — open the document and rasterise pages to RGB
//! 3. [`invert`] — per-channel complement of each raster
//! 4. [`cache`]  — run render + invert for every page, recording failures
//! 5. [`encode`] — PNG previews and `/FlateDecode` image streams
//! 6. [`export`] — assemble and atomically write the image-only output PDF

pub mod cache;
pub mod encode;
pub mod export;
pub mod input;
pub mod invert;
pub mod render;
