//! Progress-callback trait for per-page OCR events.
//!
//! Inject an [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to receive events as
//! the orchestrator works through each batch.
//!
//! # Example
//!
//! ```rust
//! use pdf_set::{OcrConfig, OcrProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl OcrProgressCallback for Printer {
//!     fn on_page_complete(&self, stem: &str, completed: usize, total: usize) {
//!         eprintln!("[{completed}/{total}] {stem}.md");
//!     }
//! }
//!
//! let config = OcrConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each page.
///
/// Pages within a batch complete concurrently, so every method may be called
/// from several tasks at once. `completed` is taken from a shared atomic
/// counter and increases by exactly one per finished page.
pub trait OcrProgressCallback: Send + Sync {
    /// Called once before the first batch is dispatched.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the first request for a page is sent.
    fn on_page_start(&self, stem: &str) {
        let _ = stem;
    }

    /// Called when an attempt fails and the page is about to be retried.
    fn on_page_retry(&self, stem: &str, attempt: u32, error: &str) {
        let _ = (stem, attempt, error);
    }

    /// Called when a page's transcript has been written.
    fn on_page_complete(&self, stem: &str, completed: usize, total: usize) {
        let _ = (stem, completed, total);
    }

    /// Called when the service rejected a page and its marker was written.
    fn on_page_rejected(&self, stem: &str, completed: usize, total: usize) {
        let _ = (stem, completed, total);
    }

    /// Called when a page exhausted its attempts.
    fn on_page_fatal(&self, stem: &str, error: &str) {
        let _ = (stem, error);
    }

    /// Called once after the last batch drained (not called on a fatal stop).
    fn on_run_complete(&self, transcribed: usize, rejected: usize) {
        let _ = (transcribed, rejected);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;
