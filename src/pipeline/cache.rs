//! Page cache: one inverted raster (or failure marker) per document page.
//!
//! The cache is built eagerly, in full and in page order, as soon as a
//! document is opened. A failing page is logged and recorded as
//! [`PageSlot::Failed`]; it never aborts the remaining pages, so
//! `cache.len() == page_count` holds for every document, including one where
//! every page failed.

use crate::error::PageError;
use crate::pipeline::invert;
use crate::pipeline::render::{PageSize, PageSource};
use crate::progress::PageProgressCallback;
use image::RgbImage;
use tracing::{debug, info, warn};

/// One cache slot.
#[derive(Debug, Clone)]
pub enum PageSlot {
    /// The page rendered; `image` is the inverted raster.
    Inverted { size: PageSize, image: RgbImage },
    /// The page could not be rendered or inverted.
    Failed(PageError),
}

impl PageSlot {
    pub fn is_failed(&self) -> bool {
        matches!(self, PageSlot::Failed(_))
    }

    /// The inverted raster, if this page succeeded.
    pub fn image(&self) -> Option<&RgbImage> {
        match self {
            PageSlot::Inverted { image, .. } => Some(image),
            PageSlot::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PageError> {
        match self {
            PageSlot::Inverted { .. } => None,
            PageSlot::Failed(e) => Some(e),
        }
    }
}

/// Ordered page slots, indexed 1:1 with the document's pages.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    slots: Vec<PageSlot>,
}

impl PageCache {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PageSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[PageSlot] {
        &self.slots
    }

    /// Number of pages holding an inverted raster.
    pub fn success_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.slots.len() - self.success_count()
    }

    /// The first recorded page error, if any.
    pub fn first_error(&self) -> Option<&PageError> {
        self.slots.iter().find_map(PageSlot::error)
    }
}

impl FromIterator<PageSlot> for PageCache {
    fn from_iter<I: IntoIterator<Item = PageSlot>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

/// Rasterise and invert one page.
pub fn process_page(source: &dyn PageSource, index: usize) -> PageSlot {
    let result = source
        .render_page(index)
        .and_then(|rendered| {
            let image = invert::invert_page(index + 1, &rendered.image)?;
            Ok(PageSlot::Inverted {
                size: rendered.size,
                image,
            })
        });

    match result {
        Ok(slot) => slot,
        Err(e) => PageSlot::Failed(e),
    }
}

/// Build the full cache for `source`, one slot per page, in page order.
pub fn build_page_cache(
    source: &dyn PageSource,
    progress: Option<&dyn PageProgressCallback>,
) -> PageCache {
    let total = source.page_count();
    if let Some(cb) = progress {
        cb.on_document_start(total);
    }

    let mut slots = Vec::with_capacity(total);
    for index in 0..total {
        let page_num = index + 1;
        if let Some(cb) = progress {
            cb.on_page_start(page_num, total);
        }

        let slot = process_page(source, index);
        match &slot {
            PageSlot::Inverted { image, .. } => {
                debug!(
                    "Inverted page {}/{} ({}x{} px)",
                    page_num,
                    total,
                    image.width(),
                    image.height()
                );
                if let Some(cb) = progress {
                    cb.on_page_complete(page_num, total);
                }
            }
            PageSlot::Failed(e) => {
                warn!("Could not process page {}: {}", page_num, e);
                if let Some(cb) = progress {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
            }
        }
        slots.push(slot);
    }

    let cache = PageCache { slots };
    info!(
        "Page cache built: {}/{} pages inverted",
        cache.success_count(),
        total
    );
    if let Some(cb) = progress {
        cb.on_document_complete(total, cache.success_count());
    }
    cache
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::{MemoryDocument, MemoryPage};
    use image::Rgb;
    use std::sync::Mutex;

    fn page(v: u8) -> MemoryPage {
        MemoryPage::ok(PageSize::new(72.0, 72.0), RgbImage::from_pixel(4, 4, Rgb([v, v, v])))
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PageProgressCallback for Recorder {
        fn on_document_start(&self, total_pages: usize) {
            self.events.lock().unwrap().push(format!("start {total_pages}"));
        }
        fn on_page_complete(&self, page_num: usize, _total_pages: usize) {
            self.events.lock().unwrap().push(format!("ok {page_num}"));
        }
        fn on_page_error(&self, page_num: usize, _total_pages: usize, _error: &str) {
            self.events.lock().unwrap().push(format!("err {page_num}"));
        }
        fn on_document_complete(&self, total_pages: usize, success_count: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {success_count}/{total_pages}"));
        }
    }

    #[test]
    fn empty_document_gives_empty_cache() {
        let cache = build_page_cache(&MemoryDocument::default(), None);
        assert!(cache.is_empty());
        assert_eq!(cache.success_count(), 0);
    }

    #[test]
    fn slots_hold_inverted_pixels() {
        let doc = MemoryDocument::new(vec![page(0), page(200)]);
        let cache = build_page_cache(&doc, None);
        assert_eq!(cache.len(), 2);
        assert_eq!(*cache.get(0).unwrap().image().unwrap().get_pixel(0, 0), Rgb([255; 3]));
        assert_eq!(*cache.get(1).unwrap().image().unwrap().get_pixel(3, 3), Rgb([55; 3]));
    }

    #[test]
    fn all_failed_keeps_length() {
        let doc = MemoryDocument::new(vec![
            MemoryPage::corrupt(PageSize::LETTER, "x"),
            MemoryPage::corrupt(PageSize::LETTER, "y"),
        ]);
        let cache = build_page_cache(&doc, None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.failed_count(), 2);
        assert_eq!(cache.first_error().unwrap().page(), 1);
    }

    #[test]
    fn progress_events_follow_page_order() {
        let doc = MemoryDocument::new(vec![
            page(1),
            MemoryPage::corrupt(PageSize::LETTER, "broken"),
            page(2),
        ]);
        let rec = Recorder::default();
        let cache = build_page_cache(&doc, Some(&rec));
        assert_eq!(cache.failed_count(), 1);
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start 3", "ok 1", "err 2", "ok 3", "done 2/3"]
        );
    }
}
