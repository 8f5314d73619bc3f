//! Configuration types for the OCR orchestrator and the remote service.
//!
//! Two structs, built once at startup and passed by reference:
//!
//! * [`OcrConfig`]: run behaviour (batch width, retries, prompt, progress),
//!   built via [`OcrConfigBuilder`].
//! * [`ServiceConfig`]: where the inference service lives and how to
//!   authenticate. Resolved from the environment and/or a secrets file.
//!
//! Neither is global: the backend is constructed from a `ServiceConfig` and
//! handed to the orchestrator explicitly.

use crate::error::PdfSetError;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_OCR_PROMPT;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::path::Path;

/// Configuration for an OCR run.
///
/// # Example
/// ```rust
/// use pdf_set::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .batch_size(4)
///     .max_attempts(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.batch_size, 4);
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Pages in flight per batch. A batch fully drains before the next one
    /// starts. Default: 3.
    pub batch_size: usize,

    /// Total attempts per page, first try included. Default: 5.
    pub max_attempts: u32,

    /// Fixed pause between attempts in milliseconds. Default: 2000.
    pub retry_delay_ms: u64,

    /// Per-request timeout for the HTTP backend in seconds. Default: 300.
    pub api_timeout_secs: u64,

    /// Instruction sent alongside every page image.
    pub prompt: String,

    /// Receives per-page events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            max_attempts: 5,
            retry_delay_ms: 2000,
            api_timeout_secs: 300,
            prompt: DEFAULT_OCR_PROMPT.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("batch_size", &self.batch_size)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("prompt_len", &self.prompt.len())
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn OcrProgressCallback>"),
            )
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n.max(1);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, PdfSetError> {
        let c = &self.config;
        if c.max_attempts == 0 {
            return Err(PdfSetError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if c.prompt.trim().is_empty() {
            return Err(PdfSetError::InvalidConfig("prompt must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Service configuration ────────────────────────────────────────────────

pub const ENV_ENDPOINT: &str = "PDFSET_API_ENDPOINT";
pub const ENV_API_KEY: &str = "PDFSET_API_KEY";
pub const ENV_MODEL: &str = "PDFSET_MODEL";

const SECRETS_HINT: &str = "Paste the service snippet (api_endpoint, api_key, GenerativeModel(\"…\")) \
into secrets.txt, or set PDFSET_API_ENDPOINT / PDFSET_API_KEY / PDFSET_MODEL.";

/// Connection settings for the inference service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL, without a trailing `/v1`.
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

static RE_ENDPOINT: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r#"api_endpoint\s*[:=]\s*['"]([^'"]+)['"]"#),
        ci(r#"['"]api_endpoint['"]\s*[:=]\s*['"]([^'"]+)['"]"#),
        ci(r#"client_options\s*=\s*\{[^}]*api_endpoint\s*:\s*['"]([^'"]+)['"][^}]*\}"#),
        ci(r#"client_options\s*=\s*\{[^}]*['"]api_endpoint['"]\s*:\s*['"]([^'"]+)['"][^}]*\}"#),
    ]
});

static RE_API_KEY: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        ci(r#"api_key\s*=\s*['"]([^'"]+)['"]"#),
        ci(r#"api_key\s*:\s*['"]([^'"]+)['"]"#),
    ]
});

static RE_MODEL: Lazy<Vec<Regex>> =
    Lazy::new(|| vec![ci(r#"GenerativeModel\s*\(\s*['"]([^'"]+)['"]\s*\)"#)]);

fn extract_secret(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServiceConfig {
    /// Build from explicit values, normalising the endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: normalise_endpoint(&endpoint.into()),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Parse a pasted client snippet. Every value must be present.
    pub fn from_secrets_text(text: &str) -> Result<Self, PdfSetError> {
        Self::assemble(
            extract_secret(&RE_ENDPOINT, text),
            extract_secret(&RE_API_KEY, text),
            extract_secret(&RE_MODEL, text),
        )
    }

    /// Resolve settings: environment variables win, the secrets file fills
    /// the gaps. A missing or empty secrets file is fine as long as the
    /// environment supplies everything.
    pub fn resolve(secrets_path: Option<&Path>) -> Result<Self, PdfSetError> {
        Self::resolve_with_model(secrets_path, None)
    }

    /// Like [`ServiceConfig::resolve`], with a model chosen on the command
    /// line taking precedence over both sources.
    pub fn resolve_with_model(
        secrets_path: Option<&Path>,
        model: Option<&str>,
    ) -> Result<Self, PdfSetError> {
        let text = match secrets_path {
            Some(p) if p.is_file() => {
                std::fs::read_to_string(p).map_err(|e| PdfSetError::ReadFailed {
                    path: p.to_path_buf(),
                    source: e,
                })?
            }
            _ => String::new(),
        };

        Self::assemble(
            non_empty_env(ENV_ENDPOINT).or_else(|| extract_secret(&RE_ENDPOINT, &text)),
            non_empty_env(ENV_API_KEY).or_else(|| extract_secret(&RE_API_KEY, &text)),
            model
                .map(str::to_string)
                .or_else(|| non_empty_env(ENV_MODEL))
                .or_else(|| extract_secret(&RE_MODEL, &text)),
        )
    }

    fn assemble(
        endpoint: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, PdfSetError> {
        let missing: Vec<&str> = [
            ("api_endpoint", endpoint.is_none()),
            ("api_key", api_key.is_none()),
            ("model", model.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();

        match (endpoint, api_key, model) {
            (Some(e), Some(k), Some(m)) => Ok(Self::new(e, k, m)),
            _ => Err(PdfSetError::ServiceNotConfigured {
                missing: missing.join(", "),
                hint: SECRETS_HINT.to_string(),
            }),
        }
    }
}

/// Strip trailing slashes and a trailing `/v1`; the backend adds its own
/// versioned path.
fn normalise_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNIPPET: &str = r#"
import google.generativeai as genai
genai.configure(
    api_key="sk-local-1234",
    transport="rest",
    client_options={"api_endpoint": "http://127.0.0.1:8045/v1"}
)
model = genai.GenerativeModel('gemini-2.5-flash')
"#;

    #[test]
    fn defaults() {
        let c = OcrConfig::default();
        assert_eq!(c.batch_size, 3);
        assert_eq!(c.max_attempts, 5);
        assert_eq!(c.retry_delay_ms, 2000);
    }

    #[test]
    fn builder_clamps_batch_size() {
        let c = OcrConfig::builder().batch_size(0).build().unwrap();
        assert_eq!(c.batch_size, 1);
    }

    #[test]
    fn builder_rejects_zero_attempts() {
        assert!(OcrConfig::builder().max_attempts(0).build().is_err());
    }

    #[test]
    fn builder_rejects_blank_prompt() {
        assert!(OcrConfig::builder().prompt("  \n").build().is_err());
    }

    #[test]
    fn parses_pasted_snippet() {
        let s = ServiceConfig::from_secrets_text(SNIPPET).unwrap();
        assert_eq!(s.endpoint, "http://127.0.0.1:8045");
        assert_eq!(s.api_key, "sk-local-1234");
        assert_eq!(s.model, "gemini-2.5-flash");
    }

    #[test]
    fn parses_colon_style_keys() {
        let text = "api_endpoint: 'https://proxy.example'\napi_key: 'abc'\nGenerativeModel(\"m1\")";
        let s = ServiceConfig::from_secrets_text(text).unwrap();
        assert_eq!(s.endpoint, "https://proxy.example");
        assert_eq!(s.api_key, "abc");
        assert_eq!(s.model, "m1");
    }

    #[test]
    fn reports_every_missing_value() {
        let err = ServiceConfig::from_secrets_text("api_key = 'abc'").unwrap_err();
        match err {
            PdfSetError::ServiceNotConfigured { missing, .. } => {
                assert_eq!(missing, "api_endpoint, model");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn endpoint_normalisation() {
        assert_eq!(normalise_endpoint("http://h/v1/"), "http://h");
        assert_eq!(normalise_endpoint("http://h"), "http://h");
        assert_eq!(normalise_endpoint("http://h/v1beta"), "http://h/v1beta");
    }

    #[test]
    fn command_line_model_wins() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("secrets.txt");
        std::fs::write(&secrets, SNIPPET).unwrap();
        let s = ServiceConfig::resolve_with_model(Some(&secrets), Some("gemini-override")).unwrap();
        assert_eq!(s.model, "gemini-override");
    }

    #[test]
    fn debug_redacts_key() {
        let s = ServiceConfig::new("http://h", "secret", "m");
        assert!(!format!("{s:?}").contains("secret"));
    }
}
