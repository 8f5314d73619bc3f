//! Error types for the pdf-set library.
//!
//! Two error types reflect two distinct failure modes:
//!
//! * [`PdfSetError`]: **Fatal**: the step cannot proceed (service not
//!   configured, images directory missing, a page exhausted its retries).
//!   Returned as `Err(PdfSetError)` from every public entry point.
//!
//! * [`BackendError`]: **Transient**: one attempt at one page failed
//!   (network blip, HTTP 5xx, unparseable body, empty text). The retry loop in
//!   [`crate::pipeline::transcribe`] absorbs these; only when every attempt
//!   fails is the last one promoted to [`PdfSetError::ExhaustedRetries`].
//!
//! A policy rejection from the service is neither: it is a normal
//! [`crate::output::PageOutcome::Rejected`] recorded as an empty marker file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-set library.
#[derive(Debug, Error)]
pub enum PdfSetError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// Endpoint, API key or model could not be resolved.
    #[error("OCR service is not configured: missing {missing}.\n{hint}")]
    ServiceNotConfigured { missing: String, hint: String },

    /// A named vision provider could not be created.
    #[error("Vision provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// A required input directory does not exist.
    #[error("Directory not found: '{path}'")]
    DirectoryNotFound { path: PathBuf },

    /// A required input file does not exist.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The images directory holds no usable page images.
    #[error("No page images found in '{dir}'")]
    NoImages { dir: PathBuf },

    /// Page images exist, but none fall inside the processing range.
    #[error("No page images in range {start}-{end} in '{dir}'")]
    NoImagesInRange {
        start: usize,
        end: usize,
        dir: PathBuf,
    },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// A page failed every attempt; the run stops so a human can intervene.
    #[error("No content for page {page} after {attempts} attempts. Please intervene.\nLast error: {last_error}")]
    ExhaustedRetries {
        page: String,
        attempts: u32,
        last_error: String,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Place libpdfium next to the binary or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    /// PDF could not be opened.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read an input file or directory.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A transient failure of a single OCR attempt. Always retried.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The request never produced an HTTP response (DNS, TLS, timeout…).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service answered but returned no usable text.
    #[error("empty response")]
    EmptyResponse,

    /// A provider-level failure reported by `edgequake-llm`.
    #[error("provider error: {0}")]
    Provider(String),
}
