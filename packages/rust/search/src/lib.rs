//! Web search enrichment for edugen.
//!
//! Queries the DuckDuckGo HTML endpoint and returns a short, ordered list of
//! result snippets. An empty list is a valid answer; transport and HTTP
//! failures are reported as [`EdugenError::ExternalApi`] so the caller can
//! decide whether to continue without enrichment.

mod parser;

use std::time::Duration;

use async_trait::async_trait;
use edugen_shared::{EdugenError, Result, SearchConfig, SearchResult};
use reqwest::Client;
use tracing::{debug, info, instrument};

/// Service name used in error messages and logs.
const SERVICE: &str = "search";

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("edugen/", env!("CARGO_PKG_VERSION"));

/// Text fed to the simplifier when there is nothing to enrich with.
pub const NO_RESULTS_TEXT: &str = "No search results found.";

/// A provider that answers a text query with ranked snippets.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Run `query` and return at most the configured number of results.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

// ---------------------------------------------------------------------------
// DuckDuckGo client
// ---------------------------------------------------------------------------

/// Search client for `html.duckduckgo.com`.
pub struct DuckDuckGoClient {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl DuckDuckGoClient {
    /// Build a client from the `[search]` config section.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EdugenError::api(SERVICE, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoClient {
    #[instrument(skip_all, fields(query = %query))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/html/", self.base_url);

        debug!(%url, "searching");

        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| EdugenError::transient(SERVICE, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EdugenError::http_status(
                SERVICE,
                status.as_u16(),
                format!("{url}: HTTP {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EdugenError::transient(SERVICE, format!("{url}: failed to read body: {e}")))?;

        let results = parser::parse_results(&body, self.max_results);

        info!(count = results.len(), "search complete");

        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Prompt context
// ---------------------------------------------------------------------------

/// Render results as the plain-text context block given to the simplifier.
pub fn format_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_TEXT.to_string();
    }

    results
        .iter()
        .map(|r| {
            let mut block = format!("Title: {}\nSnippet: {}", r.title, r.snippet);
            if let Some(url) = &r.url {
                block.push_str(&format!("\nURL: {url}"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}
