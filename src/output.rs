//! Result types produced by the OCR orchestrator.

use crate::pipeline::range::PageRange;
use serde::{Deserialize, Serialize};

/// The typed result of transcribing one page, after retries.
///
/// The orchestrator, not the retry loop, decides what a [`PageOutcome::Fatal`]
/// means for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageOutcome {
    /// The service returned usable text.
    Transcribed(String),
    /// The service withheld the content for policy reasons.
    Rejected(String),
    /// Every attempt failed; carries the last attempt's error.
    Fatal { attempts: u32, last_error: String },
}

impl PageOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PageOutcome::Fatal { .. })
    }
}

/// What happened to one page during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// Zero-based page index.
    pub index: usize,
    /// File stem shared by the image and its transcript.
    pub stem: String,
    /// Attempts used (1 = first try succeeded).
    pub attempts: u32,
    pub duration_ms: u64,
    pub outcome: PageOutcome,
}

/// Statistics for one orchestrator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrRunSummary {
    /// The range the run attempted.
    pub range: Option<PageRange>,
    /// Page images inside the range.
    pub total_pages: usize,
    /// Pages written as `<stem>.md`.
    pub transcribed_pages: usize,
    /// Pages written as `<stem>.fail.md`.
    pub rejected_pages: usize,
    pub total_duration_ms: u64,
    /// Per-page reports in index order.
    pub pages: Vec<PageReport>,
}
