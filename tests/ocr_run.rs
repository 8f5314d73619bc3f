//! Integration tests for the OCR orchestrator.
//!
//! A scripted backend stands in for the inference service: each page gets a
//! queue of responses (the last one repeats), every call is recorded, and
//! the number of concurrent calls is tracked.

use async_trait::async_trait;
use pdf_set::{
    run_ocr, transcribe_file, BackendError, OcrBackend, OcrConfig, OcrJob, OcrProgressCallback,
    PageOutcome, PageRange, PageRequest, PdfSetError, Recognition,
};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

type Response = Result<Recognition, BackendError>;

struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<Response>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        }
    }

    fn script(self, page: &str, responses: Vec<Response>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(page.to_string(), responses.into());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn called_pages(&self) -> Vec<String> {
        let mut pages = self.calls();
        pages.sort_by_key(|p| p.parse::<usize>().unwrap_or(usize::MAX));
        pages.dedup();
        pages
    }
}

#[async_trait]
impl OcrBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, request: &PageRequest) -> Result<Recognition, BackendError> {
        self.calls.lock().unwrap().push(request.page.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&request.page) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(Recognition::Text(format!("text of page {}", request.page))),
        }
    }
}

struct Book {
    _dir: tempfile::TempDir,
    images: PathBuf,
    ocr: PathBuf,
}

fn book_with_images(count: usize) -> Book {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("images");
    let ocr = dir.path().join("ocr-result");
    std::fs::create_dir_all(&images).unwrap();
    for i in 0..count {
        std::fs::write(images.join(format!("{i}.jpg")), [0xFF, 0xD8, i as u8]).unwrap();
    }
    Book {
        _dir: dir,
        images,
        ocr,
    }
}

fn fast_config() -> OcrConfig {
    OcrConfig::builder().retry_delay_ms(1).build().unwrap()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn transport(msg: &str) -> Response {
    Err(BackendError::Transport(msg.to_string()))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn transcribes_every_page_in_batches() {
    let book = book_with_images(7);
    let backend = Arc::new(ScriptedBackend::new());

    let summary = run_ocr(&OcrJob::new(&book.images, &book.ocr), backend.clone(), &fast_config())
        .await
        .unwrap();

    assert_eq!(summary.range, Some(PageRange { start: 0, end: 6 }));
    assert_eq!(summary.total_pages, 7);
    assert_eq!(summary.transcribed_pages, 7);
    assert_eq!(summary.rejected_pages, 0);
    for i in 0..7 {
        assert_eq!(read(&book.ocr.join(format!("{i}.md"))), format!("text of page {i}"));
    }
    let stems: Vec<&str> = summary.pages.iter().map(|p| p.stem.as_str()).collect();
    assert_eq!(stems, vec!["0", "1", "2", "3", "4", "5", "6"]);
    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn batch_size_bounds_concurrency() {
    let book = book_with_images(6);
    let backend = Arc::new(ScriptedBackend::new());
    let config = OcrConfig::builder()
        .batch_size(2)
        .retry_delay_ms(1)
        .build()
        .unwrap();

    run_ocr(&OcrJob::new(&book.images, &book.ocr), backend.clone(), &config)
        .await
        .unwrap();
    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rejected_page_gets_empty_marker_only() {
    let book = book_with_images(4);
    let backend = Arc::new(
        ScriptedBackend::new().script("2", vec![Ok(Recognition::Rejected("PROHIBITED_CONTENT".into()))]),
    );

    let summary = run_ocr(&OcrJob::new(&book.images, &book.ocr), backend.clone(), &fast_config())
        .await
        .unwrap();

    assert_eq!(summary.transcribed_pages, 3);
    assert_eq!(summary.rejected_pages, 1);
    assert_eq!(read(&book.ocr.join("2.fail.md")), "");
    assert!(!book.ocr.join("2.md").exists());
    // No retry after a rejection.
    assert_eq!(backend.calls().iter().filter(|p| *p == "2").count(), 1);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let book = book_with_images(2);
    let backend = Arc::new(ScriptedBackend::new().script(
        "1",
        vec![
            transport("connection reset"),
            Err(BackendError::Status {
                status: 503,
                body: "overloaded".into(),
            }),
            Ok(Recognition::Text(String::new())),
            transport("timeout"),
            Ok(Recognition::Text("finally".into())),
        ],
    ));

    let summary = run_ocr(&OcrJob::new(&book.images, &book.ocr), backend.clone(), &fast_config())
        .await
        .unwrap();

    assert_eq!(read(&book.ocr.join("1.md")), "finally");
    let page = summary.pages.iter().find(|p| p.stem == "1").unwrap();
    assert_eq!(page.attempts, 5);
    assert!(matches!(page.outcome, PageOutcome::Transcribed(_)));
}

#[tokio::test]
async fn fatal_page_stops_later_batches() {
    let book = book_with_images(9);
    let backend = Arc::new(ScriptedBackend::new().script("4", vec![transport("unreachable")]));

    let err = run_ocr(&OcrJob::new(&book.images, &book.ocr), backend.clone(), &fast_config())
        .await
        .unwrap_err();

    match err {
        PdfSetError::ExhaustedRetries {
            ref page,
            attempts,
            ref last_error,
        } => {
            assert_eq!(page, "4");
            assert_eq!(attempts, 5);
            assert!(last_error.contains("unreachable"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Please intervene"));

    // Siblings in the failing batch finished and were written.
    for i in [0, 1, 2, 3, 5] {
        assert!(book.ocr.join(format!("{i}.md")).exists(), "page {i}");
    }
    assert!(!book.ocr.join("4.md").exists());
    assert!(!book.ocr.join("4.fail.md").exists());
    // The third batch never started.
    assert_eq!(backend.called_pages(), vec!["0", "1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn resumes_at_first_missing_transcript() {
    let book = book_with_images(5);
    std::fs::create_dir_all(&book.ocr).unwrap();
    std::fs::write(book.ocr.join("0.md"), "kept").unwrap();
    std::fs::write(book.ocr.join("1.md"), "kept").unwrap();
    std::fs::write(book.ocr.join("3.md"), "stale").unwrap();
    std::fs::write(book.ocr.join("2.fail.md"), "").unwrap();

    let backend = Arc::new(ScriptedBackend::new());
    let summary = run_ocr(&OcrJob::new(&book.images, &book.ocr), backend.clone(), &fast_config())
        .await
        .unwrap();

    assert_eq!(summary.range, Some(PageRange { start: 2, end: 4 }));
    assert_eq!(backend.called_pages(), vec!["2", "3", "4"]);
    assert_eq!(read(&book.ocr.join("0.md")), "kept");
    assert_eq!(read(&book.ocr.join("3.md")), "text of page 3");
    // A successful retry clears the old rejection marker.
    assert!(!book.ocr.join("2.fail.md").exists());
}

#[tokio::test]
async fn finished_book_is_a_no_op() {
    let book = book_with_images(2);
    std::fs::create_dir_all(&book.ocr).unwrap();
    std::fs::write(book.ocr.join("0.md"), "a").unwrap();
    std::fs::write(book.ocr.join("1.md"), "b").unwrap();

    let backend = Arc::new(ScriptedBackend::new());
    let summary = run_ocr(&OcrJob::new(&book.images, &book.ocr), backend.clone(), &fast_config())
        .await
        .unwrap();

    assert_eq!(summary.range, Some(PageRange { start: 2, end: 51 }));
    assert_eq!(summary.total_pages, 0);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn explicit_range_limits_pages() {
    let book = book_with_images(10);
    let backend = Arc::new(ScriptedBackend::new());
    let job = OcrJob::new(&book.images, &book.ocr).with_range(Some(3), Some(5));

    let summary = run_ocr(&job, backend.clone(), &fast_config()).await.unwrap();
    assert_eq!(summary.total_pages, 3);
    assert_eq!(backend.called_pages(), vec!["3", "4", "5"]);
}

#[tokio::test]
async fn explicit_range_without_images_is_an_error() {
    let book = book_with_images(3);
    let job = OcrJob::new(&book.images, &book.ocr).with_range(Some(10), Some(12));

    let err = run_ocr(&job, Arc::new(ScriptedBackend::new()), &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, PdfSetError::NoImagesInRange { start: 10, end: 12, .. }));
}

#[tokio::test]
async fn missing_images_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let job = OcrJob::new(dir.path().join("images"), dir.path().join("ocr-result"));
    let err = run_ocr(&job, Arc::new(ScriptedBackend::new()), &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, PdfSetError::DirectoryNotFound { .. }));
}

#[derive(Default)]
struct Recorder {
    total: AtomicUsize,
    completed: Mutex<Vec<usize>>,
    retries: AtomicUsize,
    finished: Mutex<Option<(usize, usize)>>,
}

impl OcrProgressCallback for Recorder {
    fn on_run_start(&self, total_pages: usize) {
        self.total.store(total_pages, Ordering::SeqCst);
    }

    fn on_page_retry(&self, _stem: &str, _attempt: u32, _error: &str) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    fn on_page_complete(&self, _stem: &str, completed: usize, _total: usize) {
        self.completed.lock().unwrap().push(completed);
    }

    fn on_page_rejected(&self, _stem: &str, completed: usize, _total: usize) {
        self.completed.lock().unwrap().push(completed);
    }

    fn on_run_complete(&self, transcribed: usize, rejected: usize) {
        *self.finished.lock().unwrap() = Some((transcribed, rejected));
    }
}

#[tokio::test]
async fn progress_counter_is_monotonic() {
    let book = book_with_images(5);
    let recorder = Arc::new(Recorder::default());
    let config = OcrConfig::builder()
        .retry_delay_ms(1)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let backend = Arc::new(
        ScriptedBackend::new()
            .script("0", vec![transport("blip"), Ok(Recognition::Text("ok".into()))])
            .script("3", vec![Ok(Recognition::Rejected("RECITATION".into()))]),
    );

    run_ocr(&OcrJob::new(&book.images, &book.ocr), backend, &config)
        .await
        .unwrap();

    assert_eq!(recorder.total.load(Ordering::SeqCst), 5);
    let mut seen = recorder.completed.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(recorder.retries.load(Ordering::SeqCst), 1);
    assert_eq!(*recorder.finished.lock().unwrap(), Some((4, 1)));
}

#[tokio::test]
async fn single_file_to_explicit_output() {
    let book = book_with_images(1);
    let out_file = book.images.parent().unwrap().join("single/page.md");
    let backend = Arc::new(ScriptedBackend::new());

    let report = transcribe_file(
        &book.images.join("0.jpg"),
        &book.ocr,
        Some(&out_file),
        backend,
        &fast_config(),
    )
    .await
    .unwrap();

    assert_eq!(report.stem, "0");
    assert_eq!(read(&out_file), "text of page 0");
    assert!(!book.ocr.join("0.md").exists());
}

#[tokio::test]
async fn single_file_exhaustion_is_fatal() {
    let book = book_with_images(1);
    let backend = Arc::new(ScriptedBackend::new().script("0", vec![Ok(Recognition::Text("  ".into()))]));

    let err = transcribe_file(&book.images.join("0.jpg"), &book.ocr, None, backend, &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, PdfSetError::ExhaustedRetries { attempts: 5, .. }));
}
