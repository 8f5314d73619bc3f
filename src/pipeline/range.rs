//! Processing-range resolution: which page indices a run should attempt.
//!
//! A run resumes at the *frontier*: the smallest index with no successful
//! transcript. Later transcripts do not move the frontier while an earlier
//! one is missing or failed, so a rerun always fills the first gap.
//!
//! ```text
//! transcripts: 0.md 1.md 2.fail.md 3.md      images: 0..=49
//! frontier = 2  →  range = 2..=49
//! ```

use crate::error::PdfSetError;
use crate::files;
use crate::pipeline::images::parse_page_index;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Pages attempted when no image lies at or beyond the frontier.
pub const DEFAULT_WINDOW: usize = 50;

/// Inclusive interval of page indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Index of a successful transcript file name (`"12.md"` → 12).
///
/// Failure markers (`12.fail.md`) and non-numeric stems return `None`.
pub fn transcript_index(file_name: &str) -> Option<usize> {
    parse_page_index(file_name.strip_suffix(".md")?)
}

/// Smallest index without a successful transcript among `names`.
pub fn resume_frontier<I, S>(names: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let done: HashSet<usize> = names
        .into_iter()
        .filter_map(|n| transcript_index(n.as_ref()))
        .collect();
    (0..).find(|i| !done.contains(i)).unwrap_or(0)
}

/// [`resume_frontier`] over the files of `output_dir` (0 if it doesn't exist).
pub fn resume_frontier_in(output_dir: &Path) -> Result<usize, PdfSetError> {
    Ok(resume_frontier(files::file_names(output_dir)?))
}

/// Combine explicit bounds with the auto rules.
///
/// * missing `start` → `frontier`
/// * missing `end`   → `max_image` when it is at or past `start`,
///   otherwise `start + DEFAULT_WINDOW - 1`, saturating at `usize::MAX`
pub fn resolve_range(
    explicit_start: Option<usize>,
    explicit_end: Option<usize>,
    frontier: usize,
    max_image: Option<usize>,
) -> Result<PageRange, PdfSetError> {
    let start = explicit_start.unwrap_or(frontier);
    let end = match explicit_end {
        Some(e) => e,
        None => match max_image {
            Some(m) if m >= start => m,
            _ => start.saturating_add(DEFAULT_WINDOW - 1),
        },
    };
    if start > end {
        return Err(PdfSetError::InvalidConfig(format!(
            "page range start {start} is after end {end}"
        )));
    }
    Ok(PageRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_index_ignores_markers_and_strays() {
        assert_eq!(transcript_index("4.md"), Some(4));
        assert_eq!(transcript_index("4.fail.md"), None);
        assert_eq!(transcript_index("0.rough.md"), None);
        assert_eq!(transcript_index("notes.md"), None);
        assert_eq!(transcript_index("4.txt"), None);
    }

    #[test]
    fn frontier_of_empty_dir_is_zero() {
        assert_eq!(resume_frontier(Vec::<String>::new()), 0);
    }

    #[test]
    fn frontier_respects_gaps() {
        assert_eq!(resume_frontier(["0.md", "1.md", "3.md", "4.md"]), 2);
        assert_eq!(resume_frontier(["1.md", "2.md"]), 0);
    }

    #[test]
    fn failed_page_is_a_gap() {
        assert_eq!(resume_frontier(["0.md", "1.fail.md", "2.md"]), 1);
    }

    #[test]
    fn fresh_directory_covers_all_images() {
        let r = resolve_range(None, None, 0, Some(9)).unwrap();
        assert_eq!(r, PageRange { start: 0, end: 9 });
    }

    #[test]
    fn resumes_after_done_pages() {
        let frontier = resume_frontier(["0.md", "1.md"]);
        let r = resolve_range(None, None, frontier, Some(49)).unwrap();
        assert_eq!(r, PageRange { start: 2, end: 49 });
    }

    #[test]
    fn falls_back_to_window_when_images_exhausted() {
        let r = resolve_range(None, None, 10, Some(9)).unwrap();
        assert_eq!(r, PageRange { start: 10, end: 59 });
        let r = resolve_range(None, None, 0, None).unwrap();
        assert_eq!(r, PageRange { start: 0, end: 49 });
    }

    #[test]
    fn explicit_bounds_win() {
        let r = resolve_range(Some(5), Some(7), 0, Some(100)).unwrap();
        assert_eq!(r, PageRange { start: 5, end: 7 });
        let r = resolve_range(Some(5), None, 0, Some(100)).unwrap();
        assert_eq!(r, PageRange { start: 5, end: 100 });
        let r = resolve_range(None, Some(3), 2, Some(100)).unwrap();
        assert_eq!(r, PageRange { start: 2, end: 3 });
    }

    #[test]
    fn window_saturates_near_usize_max() {
        let start = usize::MAX - 10;
        let r = resolve_range(Some(start), None, 0, Some(3)).unwrap();
        assert_eq!(r, PageRange { start, end: usize::MAX });
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(resolve_range(Some(8), Some(3), 0, None).is_err());
    }

    #[test]
    fn frontier_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0.md", "1.md", "2.fail.md", "3.md", "0.rough.md"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        assert_eq!(resume_frontier_in(dir.path()).unwrap(), 2);
        assert_eq!(resume_frontier_in(&dir.path().join("missing")).unwrap(), 0);
    }
}
