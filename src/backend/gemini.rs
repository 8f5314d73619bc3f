//! Gemini-compatible REST backend (`models/{model}:generateContent`).
//!
//! Works against Google's endpoint and against local proxies that speak the
//! same protocol. The request carries two parts, the prompt text and the page
//! image as `inline_data`. A rejection is read from the first candidate's
//! `finishReason` or from `promptFeedback.blockReason`.

use super::{is_rejection_reason, OcrBackend, PageRequest, Recognition};
use crate::config::ServiceConfig;
use crate::error::{BackendError, PdfSetError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// ── Backend ─────────────────────────────────────────────────────────────────

/// Calls a `generateContent` endpoint with the configured model.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    service: ServiceConfig,
}

impl GeminiBackend {
    /// Build a backend whose every request times out after `timeout_secs`.
    pub fn new(service: ServiceConfig, timeout_secs: u64) -> Result<Self, PdfSetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PdfSetError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client, service })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.service.endpoint, self.service.model
        )
    }
}

#[async_trait]
impl OcrBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn recognize(&self, request: &PageRequest) -> Result<Recognition, BackendError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: &request.prompt,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.mime_type,
                            data: &request.image.data,
                        },
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.service.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate(&text, 500),
            });
        }

        debug!("Page {}: {} response bytes", request.page, text.len());
        interpret_response(&text)
    }
}

/// Turn a response body into a [`Recognition`].
fn interpret_response(body: &str) -> Result<Recognition, BackendError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
        .filter(|r| is_rejection_reason(r))
    {
        return Ok(Recognition::Rejected(reason.to_string()));
    }

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(BackendError::MalformedResponse("no candidates".into()));
    };

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|r| is_rejection_reason(r))
    {
        return Ok(Recognition::Rejected(reason.to_string()));
    }

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    Ok(Recognition::Text(text.trim().to_string()))
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}
