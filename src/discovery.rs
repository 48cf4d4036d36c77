use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::TARGET_WEB_REQUEST;

const SEARCH_ENDPOINT: &str = "https://api.exa.ai/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Character budget requested per result; keeps downstream prompts bounded.
pub const MAX_TEXT_CHARS: usize = 1500;

/// One candidate source item returned by content discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub text: String,
    pub published_date: Option<String>,
}

/// The content-discovery boundary: topic query in, ranked candidates out.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchItem>>;
}

/// Client for the Exa search-and-contents API.
pub struct SearchClient {
    http: reqwest::Client,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    num_results: usize,
    #[serde(rename = "type")]
    search_type: &'a str,
    contents: ContentsSpec,
}

#[derive(Serialize)]
struct ContentsSpec {
    text: TextSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextSpec {
    max_characters: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    title: Option<String>,
    url: String,
    #[serde(default)]
    text: Option<String>,
    published_date: Option<String>,
}

impl SearchClient {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        SearchClient { http, api_key }
    }

    /// Builds a client from `EXA_API_KEY`, or `None` when the credential is
    /// absent (callers surface that as a ConfigurationError at job start).
    pub fn from_env() -> Option<Self> {
        std::env::var("EXA_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SearchClient::new)
    }
}

#[async_trait]
impl Discovery for SearchClient {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchItem>> {
        debug!(target: TARGET_WEB_REQUEST, "Searching for: {}", query);

        let body = SearchRequest {
            query,
            num_results,
            search_type: "auto",
            contents: ContentsSpec {
                text: TextSpec {
                    max_characters: MAX_TEXT_CHARS,
                },
            },
        };

        let response = self
            .http
            .post(SEARCH_ENDPOINT)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            warn!(target: TARGET_WEB_REQUEST, "Search request failed with status {}: {}", status, message);
            return Err(PipelineError::Upstream(format!(
                "search returned status {}",
                status
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        debug!(target: TARGET_WEB_REQUEST, "Search returned {} results for: {}", parsed.results.len(), query);

        Ok(parsed
            .results
            .into_iter()
            .map(|raw| SearchItem {
                title: raw.title.unwrap_or_else(|| "Untitled".to_string()),
                url: raw.url,
                text: {
                    let text = raw.text.unwrap_or_default();
                    text.chars().take(MAX_TEXT_CHARS).collect()
                },
                published_date: raw.published_date,
            })
            .collect())
    }
}
