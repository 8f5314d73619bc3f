//! OCR backends: the seam between the orchestrator and the inference service.
//!
//! A backend performs exactly one attempt. It reports either text, a policy
//! rejection, or a [`BackendError`]; retrying is the caller's job
//! (see [`crate::pipeline::transcribe`]).
//!
//! | Backend | Service |
//! |---------|---------|
//! | [`GeminiBackend`]   | Gemini-compatible `generateContent` REST endpoint |
//! | [`ProviderBackend`] | any vision provider supported by `edgequake-llm` |

pub mod gemini;
pub mod provider;

pub use gemini::GeminiBackend;
pub use provider::ProviderBackend;

use crate::error::BackendError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;

/// Finish/block reasons that mean "the service withheld this page".
pub const REJECTION_MARKERS: &[&str] = &["PROHIBITED_CONTENT", "RECITATION"];

/// True when `reason` names one of the [`REJECTION_MARKERS`].
pub fn is_rejection_reason(reason: &str) -> bool {
    let upper = reason.to_ascii_uppercase();
    REJECTION_MARKERS.iter().any(|m| upper.contains(m))
}

/// Everything a backend needs for one page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Page label for logs (the file stem).
    pub page: String,
    pub prompt: String,
    pub image: EncodedImage,
}

/// A successful round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Extracted text; may be empty, which the retry loop treats as a failure.
    Text(String),
    /// The service declined; carries the reason it gave.
    Rejected(String),
}

/// One OCR attempt against some inference service.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn recognize(&self, request: &PageRequest) -> Result<Recognition, BackendError>;
}
