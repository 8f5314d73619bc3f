//! # pdf-set
//!
//! Turn a scanned book (a PDF of page images) into an edited Markdown book
//! with a multimodal OCR service doing the reading.
//!
//! ## Pipeline Overview
//!
//! ```text
//! book.pdf
//!  │
//!  ├─ 1. render       pdfium → images/<n>.jpg
//!  ├─ 2. ocr          one request per page, batches of B, fixed-delay retries
//!  │                  → ocr-result/<n>.md  (or empty <n>.fail.md)
//!  ├─ 3. list-fail    pages the service refused, for manual follow-up
//!  ├─ 4. merge        natural order → merge-result/0.rough.md
//!  ├─ 5. split        one file per H1 → merge-result/<k>.<title>.md
//!  ├─ 6. typeset      paragraph reconstruction + cleanup → typeset-result/
//!  └─ 7. merge-final  chapter order → <book>.md
//! ```
//!
//! Every step reads and writes flat files, so a run can stop at any point and
//! pick up again. The OCR step resumes at the first page without a
//! transcript.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_set::{run_ocr, GeminiBackend, OcrConfig, OcrJob, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // PDFSET_API_ENDPOINT / PDFSET_API_KEY / PDFSET_MODEL, or secrets.txt
//!     let service = ServiceConfig::resolve(None)?;
//!     let config = OcrConfig::default();
//!     let backend = Arc::new(GeminiBackend::new(service, config.api_timeout_secs)?);
//!
//!     let job = OcrJob::new("book/images", "book/ocr-result");
//!     let summary = run_ocr(&job, backend, &config).await?;
//!     eprintln!(
//!         "{} transcribed, {} rejected",
//!         summary.transcribed_pages, summary.rejected_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfset` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assemble;
pub mod backend;
pub mod config;
pub mod error;
pub mod files;
pub mod layout;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{GeminiBackend, OcrBackend, PageRequest, ProviderBackend, Recognition};
pub use config::{OcrConfig, OcrConfigBuilder, ServiceConfig};
pub use error::{BackendError, PdfSetError};
pub use layout::{reconstruct, typeset_dir, Selection, TypesetOptions};
pub use orchestrator::{run_ocr, transcribe_file, OcrJob};
pub use output::{OcrRunSummary, PageOutcome, PageReport};
pub use pipeline::range::PageRange;
pub use pipeline::render::{render_pdf, RenderFormat, RenderOptions};
pub use progress::{NoopProgressCallback, OcrProgressCallback, ProgressCallback};
