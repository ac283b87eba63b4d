//! Configuration types for dark-mode rendering and export.
//!
//! All rendering behaviour is controlled through [`DarkModeConfig`], built
//! via its [`DarkModeConfigBuilder`]. Nothing is persisted: every run starts
//! from the defaults below plus whatever the caller sets.

use crate::error::DarkPdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Points per inch in PDF user space.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Configuration for opening, inverting and exporting a PDF.
///
/// # Example
/// ```rust
/// use pdf_darkmode::DarkModeConfig;
///
/// let config = DarkModeConfig::builder()
///     .dpi(144)
///     .max_rendered_pixels(3000)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 144);
/// ```
#[derive(Clone)]
pub struct DarkModeConfig {
    /// Rendering DPI. Range: 36–600. Default: 72.
    ///
    /// 72 DPI renders one pixel per PDF point, the page's natural resolution.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// Caps either edge, scaling the other proportionally, so a poster-sized
    /// page cannot exhaust memory at high DPI.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    ///
    /// If None, the library next to the executable is tried first, then the
    /// system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Font size (points) of the notice written on placeholder pages. Default: 12.
    pub placeholder_font_size: f32,

    /// Page selection for batch conversion. Default: All pages.
    ///
    /// The interactive session always loads every page.
    pub pages: PageSelection,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DarkModeConfig {
    fn default() -> Self {
        Self {
            dpi: 72,
            max_rendered_pixels: 4000,
            password: None,
            pdfium_lib_path: None,
            placeholder_font_size: 12.0,
            pages: PageSelection::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DarkModeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DarkModeConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("placeholder_font_size", &self.placeholder_font_size)
            .field("pages", &self.pages)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl DarkModeConfig {
    /// Create a new builder for `DarkModeConfig`.
    pub fn builder() -> DarkModeConfigBuilder {
        DarkModeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Pixels per PDF point at the configured DPI.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / POINTS_PER_INCH
    }
}

/// Builder for [`DarkModeConfig`].
#[derive(Debug)]
pub struct DarkModeConfigBuilder {
    config: DarkModeConfig,
}

impl DarkModeConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(36, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn placeholder_font_size(mut self, size: f32) -> Self {
        self.config.placeholder_font_size = size;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DarkModeConfig, DarkPdfError> {
        let c = &self.config;
        if c.dpi < 36 || c.dpi > 600 {
            return Err(DarkPdfError::InvalidConfig(format!(
                "DPI must be 36–600, got {}",
                c.dpi
            )));
        }
        if !(c.placeholder_font_size.is_finite() && c.placeholder_font_size > 0.0) {
            return Err(DarkPdfError::InvalidConfig(format!(
                "Placeholder font size must be positive, got {}",
                c.placeholder_font_size
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// `true` when every page is selected.
    pub fn is_all(&self) -> bool {
        matches!(self, PageSelection::All)
    }
}

/// One comma-separated term of a page list: `7` or `3-9`.
fn parse_term(term: &str) -> Result<(usize, usize), String> {
    let number = |s: &str| -> Result<usize, String> {
        match s.trim().parse::<usize>() {
            Ok(0) => Err("page numbers start at 1".to_string()),
            Ok(n) => Ok(n),
            Err(_) => Err(format!("'{}' is not a page number", s.trim())),
        }
    };
    match term.split_once('-') {
        Some((a, b)) => {
            let (first, last) = (number(a)?, number(b)?);
            if first > last {
                return Err(format!("range {first}-{last} runs backwards"));
            }
            Ok((first, last))
        }
        None => number(term).map(|n| (n, n)),
    }
}

/// Parses `all`, a page list such as `2,5-7,12`, or a single page or range.
///
/// One term yields `Single` or `Range`; several terms are expanded into `Set`.
impl FromStr for PageSelection {
    type Err = DarkPdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let terms = s
            .split(',')
            .map(parse_term)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DarkPdfError::InvalidConfig(format!("page selection '{s}': {e}")))?;

        Ok(match terms.as_slice() {
            [(p, q)] if p == q => PageSelection::Single(*p),
            [(p, q)] => PageSelection::Range(*p, *q),
            _ => PageSelection::Set(terms.iter().flat_map(|&(p, q)| p..=q).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_at_natural_resolution() {
        let c = DarkModeConfig::default();
        assert_eq!(c.dpi, 72);
        assert!((c.scale() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = DarkModeConfig::builder().dpi(5000).build().unwrap();
        assert_eq!(c.dpi, 600);
        let c = DarkModeConfig::builder().dpi(1).build().unwrap();
        assert_eq!(c.dpi, 36);
    }

    #[test]
    fn builder_rejects_bad_font_size() {
        let err = DarkModeConfig::builder()
            .placeholder_font_size(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, DarkPdfError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let c = DarkModeConfig::builder().password("hunter2").build().unwrap();
        let s = format!("{c:?}");
        assert!(!s.contains("hunter2"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2] // deduplicated and sorted
        );
    }

    #[test]
    fn page_selection_from_str() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!(" ALL ".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("5".parse::<PageSelection>().unwrap(), PageSelection::Single(5));
        assert_eq!(
            "3-15".parse::<PageSelection>().unwrap(),
            PageSelection::Range(3, 15)
        );
        assert_eq!(
            "1, 3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
        assert_eq!(
            "2,5-7".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![2, 5, 6, 7])
        );
    }

    #[test]
    fn page_selection_rejects_bad_input() {
        for bad in ["0", "9-2", "1,,3", "x", "2-", "1,0-3"] {
            let err = bad.parse::<PageSelection>().unwrap_err();
            assert!(
                matches!(err, DarkPdfError::InvalidConfig(_)),
                "'{bad}' gave {err:?}"
            );
        }
    }
}
