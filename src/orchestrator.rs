//! OCR orchestration: a directory of page images → one transcript per page.
//!
//! ## Batches, not a pool
//!
//! Pages are dispatched in fixed batches of `batch_size`. Every page of a
//! batch must finish before the next batch starts, so at most `batch_size`
//! requests are ever in flight and progress advances in a simple
//! completed/total count.
//!
//! ## Stop on the first exhausted page
//!
//! A page that fails every attempt stops the run: its batch siblings are
//! allowed to finish (and their files are written), then
//! [`PdfSetError::ExhaustedRetries`] is returned and no further batch is
//! started. A rerun resumes at the first missing transcript.

use crate::backend::{OcrBackend, PageRequest};
use crate::config::OcrConfig;
use crate::error::PdfSetError;
use crate::files;
use crate::output::{OcrRunSummary, PageOutcome, PageReport};
use crate::pipeline::encode::{encode_bytes, encode_page};
use crate::pipeline::images::{self, mime_type_for, PageImage};
use crate::pipeline::range::{self, PageRange};
use crate::pipeline::transcribe::{transcribe_page, Transcription};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Suffix of the empty marker written for a rejected page.
pub const FAIL_SUFFIX: &str = ".fail.md";

/// Where an orchestrator run reads and writes.
#[derive(Debug, Clone)]
pub struct OcrJob {
    pub images_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Explicit first index; `None` resumes at the frontier.
    pub start: Option<usize>,
    /// Explicit last index; `None` uses the highest image index.
    pub end: Option<usize>,
}

impl OcrJob {
    pub fn new(images_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            output_dir: output_dir.into(),
            start: None,
            end: None,
        }
    }

    pub fn with_range(mut self, start: Option<usize>, end: Option<usize>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// Path of the success transcript for `stem`.
pub fn transcript_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{stem}.md"))
}

/// Path of the rejection marker for `stem`.
pub fn fail_marker_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{stem}{FAIL_SUFFIX}"))
}

/// Resolve the processing range and the page images inside it.
pub fn plan_run(job: &OcrJob) -> Result<(PageRange, Vec<PageImage>), PdfSetError> {
    let all = images::list_page_images(&job.images_dir)?;
    if all.is_empty() {
        return Err(PdfSetError::NoImages {
            dir: job.images_dir.clone(),
        });
    }

    let frontier = range::resume_frontier_in(&job.output_dir)?;
    let page_range = range::resolve_range(
        job.start,
        job.end,
        frontier,
        images::max_image_index(&all),
    )?;
    info!(
        "Resume frontier {}; processing range {} ({} images on disk)",
        frontier,
        page_range,
        all.len()
    );

    let selected: Vec<PageImage> = all
        .into_iter()
        .filter(|img| page_range.contains(img.index))
        .collect();
    Ok((page_range, selected))
}

/// Transcribe every page image in the job's range.
///
/// # Errors
/// - images directory missing or empty
/// - an explicit range that matches no image
/// - a page exhausted its attempts ([`PdfSetError::ExhaustedRetries`])
/// - a transcript could not be written
pub async fn run_ocr(
    job: &OcrJob,
    backend: Arc<dyn OcrBackend>,
    config: &OcrConfig,
) -> Result<OcrRunSummary, PdfSetError> {
    let run_start = Instant::now();
    let (page_range, pages) = plan_run(job)?;

    if pages.is_empty() {
        if job.start.is_some() && job.end.is_some() {
            return Err(PdfSetError::NoImagesInRange {
                start: page_range.start,
                end: page_range.end,
                dir: job.images_dir.clone(),
            });
        }
        info!("Nothing to do: no page images in range {}", page_range);
        if let Some(ref cb) = config.progress_callback {
            cb.on_run_complete(0, 0);
        }
        return Ok(OcrRunSummary {
            range: Some(page_range),
            ..Default::default()
        });
    }

    files::ensure_dir(&job.output_dir)?;

    let total = pages.len();
    let batch_size = config.batch_size.max(1);
    let completed = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);
    info!(
        "Transcribing {} pages with {} in batches of {}",
        total,
        backend.name(),
        batch_size
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut reports: Vec<PageReport> = Vec::with_capacity(total);
    for (batch_no, batch) in pages.chunks(batch_size).enumerate() {
        debug!("Batch {}: {} pages", batch_no + 1, batch.len());

        let results = join_all(batch.iter().map(|image| {
            process_page(
                image,
                backend.as_ref(),
                &job.output_dir,
                config,
                &completed,
                &rejected,
                total,
            )
        }))
        .await;

        let mut stop: Option<PdfSetError> = None;
        for result in results {
            match result {
                Ok(report) => {
                    if let PageOutcome::Fatal {
                        attempts,
                        ref last_error,
                    } = report.outcome
                    {
                        stop.get_or_insert(PdfSetError::ExhaustedRetries {
                            page: report.stem.clone(),
                            attempts,
                            last_error: last_error.clone(),
                        });
                    }
                    reports.push(report);
                }
                Err(e) => {
                    stop.get_or_insert(e);
                }
            }
        }
        if let Some(e) = stop {
            warn!(
                "Stopping after batch {}: {} of {} pages done",
                batch_no + 1,
                completed.load(Ordering::SeqCst),
                total
            );
            return Err(e);
        }
    }

    let rejected_pages = rejected.load(Ordering::SeqCst);
    let transcribed_pages = completed.load(Ordering::SeqCst) - rejected_pages;
    if rejected_pages > 0 {
        warn!("Fail pages: {}", rejected_pages);
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(transcribed_pages, rejected_pages);
    }

    let summary = OcrRunSummary {
        range: Some(page_range),
        total_pages: total,
        transcribed_pages,
        rejected_pages,
        total_duration_ms: run_start.elapsed().as_millis() as u64,
        pages: reports,
    };
    info!(
        "OCR complete: {} transcribed, {} rejected, {}ms",
        summary.transcribed_pages, summary.rejected_pages, summary.total_duration_ms
    );
    Ok(summary)
}

/// One page: encode, transcribe, write, count.
async fn process_page(
    image: &PageImage,
    backend: &dyn OcrBackend,
    output_dir: &Path,
    config: &OcrConfig,
    completed: &AtomicUsize,
    rejected: &AtomicUsize,
    total: usize,
) -> Result<PageReport, PdfSetError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_page_start(&image.stem);
    }

    let request = PageRequest {
        page: image.stem.clone(),
        prompt: config.prompt.clone(),
        image: encode_page(image).await?,
    };
    let transcription = transcribe_page(backend, &request, config).await;

    match &transcription.outcome {
        PageOutcome::Transcribed(text) => {
            write_transcript(output_dir, &image.stem, text)?;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_complete(&image.stem, done, total);
            }
        }
        PageOutcome::Rejected(_) => {
            write_fail_marker(output_dir, &image.stem)?;
            rejected.fetch_add(1, Ordering::SeqCst);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_rejected(&image.stem, done, total);
            }
        }
        PageOutcome::Fatal { last_error, .. } => {
            warn!("Page {}: giving up: {}", image.stem, last_error);
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_fatal(&image.stem, last_error);
            }
        }
    }

    Ok(report(image.index, &image.stem, transcription))
}

fn report(index: usize, stem: &str, t: Transcription) -> PageReport {
    PageReport {
        index,
        stem: stem.to_string(),
        attempts: t.attempts,
        duration_ms: t.duration_ms,
        outcome: t.outcome,
    }
}

/// Write `<stem>.md` and drop a stale rejection marker for the same page.
fn write_transcript(output_dir: &Path, stem: &str, text: &str) -> Result<(), PdfSetError> {
    files::write_atomic(&transcript_path(output_dir, stem), text.as_bytes())?;
    let marker = fail_marker_path(output_dir, stem);
    if marker.exists() {
        debug!("Removing stale marker {}", marker.display());
        std::fs::remove_file(&marker).map_err(|e| PdfSetError::OutputWriteFailed {
            path: marker,
            source: e,
        })?;
    }
    Ok(())
}

fn write_fail_marker(output_dir: &Path, stem: &str) -> Result<(), PdfSetError> {
    files::write_atomic(&fail_marker_path(output_dir, stem), b"")
}

/// Transcribe a single image file.
///
/// The transcript goes to `output_file` when given, else
/// `<output_dir>/<stem>.md`; a rejection writes `<output_dir>/<stem>.fail.md`.
pub async fn transcribe_file(
    image_path: &Path,
    output_dir: &Path,
    output_file: Option<&Path>,
    backend: Arc<dyn OcrBackend>,
    config: &OcrConfig,
) -> Result<PageReport, PdfSetError> {
    if !image_path.is_file() {
        return Err(PdfSetError::FileNotFound {
            path: image_path.to_path_buf(),
        });
    }
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page")
        .to_string();
    let bytes = tokio::fs::read(image_path)
        .await
        .map_err(|e| PdfSetError::ReadFailed {
            path: image_path.to_path_buf(),
            source: e,
        })?;

    let request = PageRequest {
        page: stem.clone(),
        prompt: config.prompt.clone(),
        image: encode_bytes(&bytes, mime_type_for(image_path)),
    };
    let transcription = transcribe_page(backend.as_ref(), &request, config).await;

    match &transcription.outcome {
        PageOutcome::Transcribed(text) => match output_file {
            Some(path) => files::write_atomic(path, text.as_bytes())?,
            None => write_transcript(output_dir, &stem, text)?,
        },
        PageOutcome::Rejected(reason) => {
            warn!("{}: rejected ({})", image_path.display(), reason);
            write_fail_marker(output_dir, &stem)?;
        }
        PageOutcome::Fatal {
            attempts,
            last_error,
        } => {
            return Err(PdfSetError::ExhaustedRetries {
                page: stem,
                attempts: *attempts,
                last_error: last_error.clone(),
            });
        }
    }

    let index = images::parse_page_index(&stem).unwrap_or(0);
    Ok(report(index, &stem, transcription))
}
