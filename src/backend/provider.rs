//! Backend over any `edgequake-llm` vision provider (OpenAI, Anthropic,
//! Gemini, Ollama, …).
//!
//! Providers do not expose a finish reason on success; a content-filter stop
//! surfaces as an API error instead, so rejections are recognised from the
//! error text.

use super::{is_rejection_reason, OcrBackend, PageRequest, Recognition};
use crate::error::{BackendError, PdfSetError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Error fragments that identify a content-filter refusal.
const CONTENT_FILTER_MARKERS: &[&str] = &["content_filter", "content filter", "content_policy"];

/// Wraps a pre-built or factory-created provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderBackend {
    /// Use an already constructed provider (tests, custom middleware).
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: 0.1,
            max_tokens: 8192,
        }
    }

    /// Create a provider by name (`"openai"`, `"anthropic"`, …); the API key
    /// is read by the factory from the provider's usual environment variable.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, PdfSetError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            PdfSetError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, provider_name))
    }

    /// Auto-detect a provider from whichever API key is set.
    pub fn from_env() -> Result<Self, PdfSetError> {
        let (provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| PdfSetError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No vision provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                    Error: {e}"
                ),
            })?;
        Ok(Self::new(provider, "auto"))
    }

    pub fn with_max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = n;
        self
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

/// True when a provider error message describes a policy refusal.
fn is_content_filter(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    CONTENT_FILTER_MARKERS.iter().any(|m| lower.contains(m)) || is_rejection_reason(message)
}

#[async_trait]
impl OcrBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn recognize(&self, request: &PageRequest) -> Result<Recognition, BackendError> {
        let image = ImageData::new(request.image.data.clone(), request.image.mime_type)
            .with_detail("high");
        let messages = vec![ChatMessage::user_with_images(
            request.prompt.as_str(),
            vec![image],
        )];

        match self.provider.chat(&messages, Some(&self.options())).await {
            Ok(response) => {
                debug!(
                    "Page {}: {} input tokens, {} output tokens",
                    request.page, response.prompt_tokens, response.completion_tokens
                );
                Ok(Recognition::Text(response.content.trim().to_string()))
            }
            Err(e) => {
                let msg = e.to_string();
                if is_content_filter(&msg) {
                    Ok(Recognition::Rejected(msg))
                } else {
                    Err(BackendError::Provider(msg))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_filter_detection() {
        assert!(is_content_filter("API error: finish_reason=content_filter"));
        assert!(is_content_filter("Blocked by Content Filter"));
        assert!(is_content_filter("candidate finished with RECITATION"));
        assert!(!is_content_filter("rate limited (429)"));
    }
}
