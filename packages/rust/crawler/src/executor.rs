//! Bounded-concurrency page fetching.
//!
//! The executor owns the HTTP client and fans a batch of URLs out to at
//! most `concurrency` in-flight requests. Two strategies are supported:
//! spawned tasks gated by a semaphore (the default), and a cooperative
//! mode that multiplexes the batch on the calling task via
//! `buffer_unordered`. Both return bodies as text; HTML parsing stays
//! with the caller because parsed documents are not `Send`.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::debug;

use sitescout_shared::{Result, SiteScoutError};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("SiteScout/", env!("CARGO_PKG_VERSION"));

/// How a batch of fetches is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// One `tokio::spawn` per URL, bounded by a semaphore.
    #[default]
    Spawned,
    /// All fetches multiplexed on the calling task.
    Cooperative,
}

/// A fetched page body, prior to any parsing.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// The URL that was requested.
    pub url: String,
    /// BFS depth the URL was queued at.
    pub depth: u32,
    /// Raw response body.
    pub body: String,
    /// HTTP status code.
    pub status: u16,
}

/// The outcome of one URL in a batch, success or failure.
pub type FetchOutcome = (String, u32, Result<FetchedDocument>);

/// Bounded-concurrency HTTP fetcher shared across crawl levels.
#[derive(Clone)]
pub struct FetchExecutor {
    client: Client,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    rate_limit_ms: u64,
    mode: FetchMode,
}

impl FetchExecutor {
    /// Build an executor with the given concurrency bound and per-request
    /// rate limit.
    pub fn new(concurrency: usize, rate_limit_ms: u64, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SiteScoutError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            concurrency: concurrency.max(1),
            rate_limit_ms,
            mode: FetchMode::default(),
        })
    }

    /// Switch the scheduling strategy.
    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fetch every URL in `batch`, returning one outcome per input.
    /// Per-URL failures are reported in the outcome, never propagated.
    pub async fn fetch_batch(&self, batch: Vec<(String, u32)>) -> Vec<FetchOutcome> {
        match self.mode {
            FetchMode::Spawned => self.fetch_spawned(batch).await,
            FetchMode::Cooperative => self.fetch_cooperative(batch).await,
        }
    }

    async fn fetch_spawned(&self, batch: Vec<(String, u32)>) -> Vec<FetchOutcome> {
        let mut handles = Vec::with_capacity(batch.len());

        for (url, depth) in batch {
            let client = self.client.clone();
            let sem = self.semaphore.clone();
            let rate_limit = self.rate_limit_ms;

            handles.push(tokio::spawn(async move {
                let _permit = match sem.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let err = SiteScoutError::Fetch(format!("{url}: executor shut down"));
                        return (url, depth, Err(err));
                    }
                };

                if rate_limit > 0 {
                    tokio::time::sleep(Duration::from_millis(rate_limit)).await;
                }

                let result = fetch_one(&client, &url, depth).await;
                (url, depth, result)
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    let err = SiteScoutError::Fetch(format!("fetch task panicked: {e}"));
                    outcomes.push((String::from("unknown"), 0, Err(err)));
                }
            }
        }
        outcomes
    }

    async fn fetch_cooperative(&self, batch: Vec<(String, u32)>) -> Vec<FetchOutcome> {
        let rate_limit = self.rate_limit_ms;

        stream::iter(batch)
            .map(|(url, depth)| {
                let client = self.client.clone();
                async move {
                    if rate_limit > 0 {
                        tokio::time::sleep(Duration::from_millis(rate_limit)).await;
                    }
                    let result = fetch_one(&client, &url, depth).await;
                    (url, depth, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

/// Fetch a single page body as text.
async fn fetch_one(client: &Client, url: &str, depth: u32) -> Result<FetchedDocument> {
    debug!(%url, depth, "fetching page");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SiteScoutError::Fetch(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SiteScoutError::Fetch(format!("{url}: HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SiteScoutError::Fetch(format!("{url}: body read failed: {e}")))?;

    Ok(FetchedDocument {
        url: url.to_string(),
        depth,
        body,
        status: status.as_u16(),
    })
}
