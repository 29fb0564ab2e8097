//! External search provider abstraction.
//!
//! Founder discovery and mention search issue queries through the
//! `SearchProvider` trait. The production implementation hits a JSON
//! custom-search endpoint; tests substitute in-memory providers.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use sitescout_shared::{Result, SiteScoutError};

/// Default custom-search API endpoint.
const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Timeout in seconds for search requests.
const SEARCH_TIMEOUT_SECS: u64 = 15;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("SiteScout/", env!("CARGO_PKG_VERSION"));

/// A single search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Issues web-search queries. Implementations are expected to return at
/// most `max_results` hits and to surface quota/auth failures as
/// `SearchProvider` errors.
pub trait SearchProvider {
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>>> + Send;
}

impl<T: SearchProvider + Sync> SearchProvider for &T {
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>>> + Send {
        (**self).search(query, max_results)
    }
}

// ---------------------------------------------------------------------------
// HTTP provider
// ---------------------------------------------------------------------------

/// Custom-search JSON API response shape (the subset we consume).
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Search provider backed by a custom-search JSON endpoint.
pub struct HttpSearchProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl HttpSearchProvider {
    /// Build a provider with the given credentials.
    pub fn new(api_key: String, engine_id: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                SiteScoutError::SearchProvider(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            engine_id,
        })
    }

    /// Point the provider at a different endpoint (tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl SearchProvider for HttpSearchProvider {
    #[instrument(skip_all, fields(query = %query))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let num = max_results.clamp(1, 10).to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SiteScoutError::SearchProvider(format!("{query}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(SiteScoutError::SearchProvider(format!(
                "{query}: quota or auth failure (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(SiteScoutError::SearchProvider(format!(
                "{query}: HTTP {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SiteScoutError::SearchProvider(format!("{query}: bad response: {e}")))?;

        let hits: Vec<SearchHit> = parsed
            .items
            .into_iter()
            .take(max_results)
            .map(|item| SearchHit {
                url: item.link,
                title: item.title,
                snippet: item.snippet,
            })
            .collect();

        debug!(hits = hits.len(), "search completed");
        Ok(hits)
    }
}
