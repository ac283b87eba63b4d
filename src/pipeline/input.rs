//! Input validation: check a user-supplied path before pdfium sees it.
//!
//! pdfium reports every load failure as an opaque error code. Checking
//! existence, read permission and the `%PDF` magic bytes first gives the
//! user an actionable message instead.

use crate::error::DarkPdfError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local PDF path: it must exist, be readable and start with `%PDF`.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, DarkPdfError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(DarkPdfError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            let n = read_prefix(&mut f, &mut magic);
            if n < magic.len() || &magic != b"%PDF" {
                return Err(DarkPdfError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DarkPdfError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DarkPdfError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Read up to `buf.len()` bytes, returning how many were read.
fn read_prefix(f: &mut std::fs::File, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match f.read(&mut buf[filled..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    filled
}
