//! Pipeline stages for the OCR step.
//!
//! ## Data Flow
//!
//! ```text
//! render ──▶ images ──▶ range ──▶ encode ──▶ transcribe
//! (pdfium)   (listing)  (resume)  (base64)   (backend + retries)
//! ```
//!
//! 1. [`render`]: rasterise a PDF into `<index>.jpg`; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`images`]: find numbered page images, ignore everything else
//! 3. [`range`]: compute the resume frontier and the processing range
//! 4. [`encode`]: read an image and base64-wrap it for the request body
//! 5. [`transcribe`]: one page through the backend with fixed-delay retries;
//!    the only stage with network I/O

pub mod encode;
pub mod images;
pub mod range;
pub mod render;
pub mod transcribe;
