//! Structured simplification over the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use edugen_shared::{EdugenError, Result, SimplificationConfig, SimplifiedDraft};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::retry::{RetryPolicy, with_retry};
use crate::structured::parse_draft;
use crate::{Simplifier, status_error, transport_error};

const SERVICE: &str = "simplification";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<OutPart<'a>>,
}

#[derive(Debug, Serialize)]
struct OutPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<InPart>,
}

#[derive(Debug, Deserialize)]
struct InPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Gemini client configured for JSON-only responses.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    settings: SimplificationConfig,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Build a client from the `[simplification]` config section.
    pub fn new(config: &SimplificationConfig, api_key: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EdugenError::api(SERVICE, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            settings: config.clone(),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    /// Replace the retry policy (tests use zero delay).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One `generateContent` call, returning the concatenated candidate text.
    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![OutPart { text: prompt }],
            }],
            generation_config: GenerationSettings {
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
                top_k: self.settings.top_k,
                max_output_tokens: self.settings.max_output_tokens,
                response_mime_type: "application/json",
            },
        };

        debug!(model = %self.model, "generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, &text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EdugenError::malformed(SERVICE, format!("invalid response body: {e}")))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(EdugenError::api(SERVICE, format!("prompt blocked: {reason}")));
        }

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| EdugenError::malformed(SERVICE, "response contained no candidates"))?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                warn!(finish_reason = reason, "generation did not finish normally");
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl Simplifier for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn simplify(&self, prompt: &str) -> Result<SimplifiedDraft> {
        let text = with_retry(SERVICE, self.retry, move || self.generate_once(prompt)).await?;

        let draft = parse_draft(SERVICE, &text).inspect_err(|e| {
            warn!(error = %e, raw = %text, "structured output rejected");
        })?;

        info!(title = %draft.title, sections = draft.sections.len(), "content simplified");
        Ok(draft)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
