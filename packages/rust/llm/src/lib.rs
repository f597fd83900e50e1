//! Hosted language-model clients for edugen.
//!
//! Two roles, two providers:
//! - [`TextGenerator`]: free-text drafting, implemented by [`GroqClient`]
//!   (OpenAI-compatible chat completions).
//! - [`Simplifier`]: schema-constrained JSON output, implemented by
//!   [`GeminiClient`] (`generateContent` with a JSON response MIME type).
//!
//! Both clients apply a per-call timeout and a bounded retry on transient
//! failures (see [`retry`]).

mod gemini;
mod groq;
pub mod retry;
mod structured;

use async_trait::async_trait;
use edugen_shared::{EdugenError, Result, SimplifiedDraft};
use reqwest::StatusCode;

pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use retry::{RetryPolicy, with_retry};
pub use structured::parse_draft;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A single text-generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Optional system instruction placed before the prompt.
    pub system: Option<String>,
    /// Overrides the client's configured model.
    pub model: Option<String>,
    /// Overrides the client's configured temperature.
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Produces free-form draft text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `request`. Failures surface as `ExternalApi` or
    /// `MalformedResponse`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Model identifier used when the request does not override it.
    fn model(&self) -> &str;
}

/// Produces a [`SimplifiedDraft`] from a prompt that embeds the schema.
#[async_trait]
pub trait Simplifier: Send + Sync {
    /// Output that does not parse or violates the schema is a
    /// `MalformedResponse`, never passed through.
    async fn simplify(&self, prompt: &str) -> Result<SimplifiedDraft>;

    fn model(&self) -> &str;
}

// ---------------------------------------------------------------------------
// HTTP helpers shared by both clients
// ---------------------------------------------------------------------------

/// Maximum number of error-body characters kept in error messages.
const ERROR_BODY_LIMIT: usize = 500;

/// Map a non-success HTTP status into the right error kind.
pub(crate) fn status_error(service: &str, status: StatusCode, body: &str) -> EdugenError {
    let body = truncate_chars(body.trim(), ERROR_BODY_LIMIT);
    EdugenError::http_status(service, status.as_u16(), format!("HTTP {status}: {body}"))
}

/// Map a transport failure (connect, timeout, reset) into an error.
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> EdugenError {
    if err.is_builder() {
        EdugenError::api(service, format!("invalid request: {err}"))
    } else {
        EdugenError::transient(service, err.to_string())
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(status_error("x", StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(status_error("x", StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(status_error("x", StatusCode::REQUEST_TIMEOUT, "").is_retryable());
        assert!(!status_error("x", StatusCode::UNAUTHORIZED, "bad key").is_retryable());
        assert!(
            status_error("x", StatusCode::UNAUTHORIZED, "bad key")
                .to_string()
                .contains("bad key")
        );
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
