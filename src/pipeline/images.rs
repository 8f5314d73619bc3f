//! Page image discovery: `<index>.<ext>` files in the images directory.
//!
//! Only stems made entirely of ASCII digits identify a page. Anything else
//! (`cover.jpg`, `12a.png`) is not a page and never influences range
//! resolution.

use crate::error::PdfSetError;
use crate::files;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions accepted as page images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// One numbered page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Zero-based page index parsed from the stem.
    pub index: usize,
    /// The stem as it appears on disk (`"007"` stays `"007"`).
    pub stem: String,
    pub path: PathBuf,
}

impl PageImage {
    /// Parse a path into a page image; `None` for non-images and
    /// non-numeric stems.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let index = parse_page_index(stem)?;
        Some(Self {
            index,
            stem: stem.to_string(),
            path: path.to_path_buf(),
        })
    }

    /// MIME type sent to the service with the image bytes.
    pub fn mime_type(&self) -> &'static str {
        mime_type_for(&self.path)
    }
}

/// Parse a page index from a file stem. Only plain ASCII digits qualify.
pub fn parse_page_index(stem: &str) -> Option<usize> {
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Guess the MIME type from the extension; unknown extensions are sent as JPEG.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}

/// List every numbered page image in `dir`, sorted by index.
///
/// When two files share an index (`3.jpg` and `3.png`) the first by name is
/// kept and the other is skipped with a warning.
pub fn list_page_images(dir: &Path) -> Result<Vec<PageImage>, PdfSetError> {
    if !dir.is_dir() {
        return Err(PdfSetError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut images: Vec<PageImage> = files::file_names(dir)?
        .iter()
        .filter_map(|name| PageImage::from_path(&dir.join(name)))
        .collect();
    images.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));

    let before = images.len();
    images.dedup_by(|later, kept| {
        let dup = later.index == kept.index;
        if dup {
            warn!(
                "Page {} has several images; keeping {}, skipping {}",
                kept.index,
                kept.path.display(),
                later.path.display()
            );
        }
        dup
    });
    debug!(
        "Found {} page images in {} ({} duplicates skipped)",
        images.len(),
        dir.display(),
        before - images.len()
    );
    Ok(images)
}

/// Highest page index among `images`.
pub fn max_image_index(images: &[PageImage]) -> Option<usize> {
    images.iter().map(|i| i.index).max()
}
