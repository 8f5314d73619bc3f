//! Per-page transcription with a bounded, fixed-delay retry loop.
//!
//! ## Retry Strategy
//!
//! Up to `max_attempts` attempts (default 5) with a constant
//! `retry_delay_ms` pause (default 2 s) between them. Every [`BackendError`]
//! and every empty text answer is retried. A policy rejection is final on
//! the first sighting. Only the page's own task sleeps; sibling pages in the
//! batch keep going.

use crate::backend::{OcrBackend, PageRequest, Recognition};
use crate::config::OcrConfig;
use crate::error::BackendError;
use crate::output::PageOutcome;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Outcome of one page plus bookkeeping.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub outcome: PageOutcome,
    /// Attempts actually made.
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Run the retry loop for one page.
///
/// Never returns an error: exhaustion is reported as
/// [`PageOutcome::Fatal`] so the caller decides what it means for the run.
pub async fn transcribe_page(
    backend: &dyn OcrBackend,
    request: &PageRequest,
    config: &OcrConfig,
) -> Transcription {
    let start = Instant::now();
    let max_attempts = config.max_attempts.max(1);
    let mut last_err = BackendError::EmptyResponse;

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            warn!(
                "Page {}: retry {}/{} after {}ms",
                request.page,
                attempt - 1,
                max_attempts - 1,
                config.retry_delay_ms
            );
            sleep(Duration::from_millis(config.retry_delay_ms)).await;
        }

        let result = backend.recognize(request).await;
        let err = match result {
            Ok(Recognition::Rejected(reason)) => {
                warn!("Page {}: rejected by {} ({})", request.page, backend.name(), reason);
                return finish(PageOutcome::Rejected(reason), attempt, start);
            }
            Ok(Recognition::Text(text)) if !text.trim().is_empty() => {
                debug!(
                    "Page {}: {} chars on attempt {}",
                    request.page,
                    text.chars().count(),
                    attempt
                );
                return finish(PageOutcome::Transcribed(text), attempt, start);
            }
            Ok(Recognition::Text(_)) => BackendError::EmptyResponse,
            Err(e) => e,
        };

        warn!("Page {}: attempt {} failed: {}", request.page, attempt, err);
        if let Some(ref cb) = config.progress_callback {
            if attempt < max_attempts {
                cb.on_page_retry(&request.page, attempt, &err.to_string());
            }
        }
        last_err = err;
    }

    finish(
        PageOutcome::Fatal {
            attempts: max_attempts,
            last_error: last_err.to_string(),
        },
        max_attempts,
        start,
    )
}

fn finish(outcome: PageOutcome, attempts: u32, start: Instant) -> Transcription {
    Transcription {
        outcome,
        attempts,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
