//! End-to-end single-run discovery pipeline.
//!
//! Seed URL → company info extraction → site crawl → founder search
//! ladder → founder blogs → external mentions → aggregated report.
//! Per-URL failures are counted, never fatal; the pipeline always
//! produces a summary, even for partial runs.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use url::Url;

use sitescout_crawler::{CrawledPage, Crawler, SkipFilter, host_of};
use sitescout_discovery::{
    FounderExtractor, FounderSearch, LadderConfig, SearchProvider, SearchState,
    search_company_mentions, search_founder_blogs,
};
use sitescout_shared::{
    CompanyInfo, CrawlConfig, CrawlSummary, DiscoveredUrl, Founder, Result, RunId,
};

use crate::aggregator::UrlAggregator;
use crate::progress::ProgressReporter;

/// Extracts structured company information from a fetched page.
///
/// The production implementation is an external LLM-backed service; a
/// failing oracle degrades to a minimal record built from the page title
/// and meta description.
pub trait CompanyOracle {
    fn extract_company(
        &self,
        url: &str,
        page: &CrawledPage,
    ) -> impl Future<Output = Result<CompanyInfo>> + Send;
}

/// Oracle that derives company info from page metadata alone. Used when
/// no external extraction service is configured.
#[derive(Debug, Clone, Default)]
pub struct MetadataOracle {
    /// Overrides the derived company name when set.
    pub company_name: Option<String>,
}

impl CompanyOracle for MetadataOracle {
    async fn extract_company(&self, url: &str, page: &CrawledPage) -> Result<CompanyInfo> {
        let seed = Url::parse(url).map_err(|e| {
            sitescout_shared::SiteScoutError::validation(format!("invalid URL {url}: {e}"))
        })?;
        let mut info = fallback_company(&seed, Some(page));
        if let Some(name) = &self.company_name {
            info.name = name.clone();
        }
        Ok(info)
    }
}

/// Everything a single discovery run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub crawl: CrawlConfig,
    pub ladder: LadderConfig,
    /// Hits requested per blog/mention query.
    pub results_per_query: usize,
    /// Skip the external mention search.
    pub skip_external: bool,
    /// Skip the founder search ladder entirely.
    pub skip_founder_search: bool,
    /// Skip the founder blog search even when founders were found.
    pub skip_founder_blogs: bool,
}

/// Outcome of one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub run_id: RunId,
    pub company: CompanyInfo,
    pub founders: Vec<Founder>,
    pub summary: CrawlSummary,
    pub urls: Vec<DiscoveredUrl>,
    pub elapsed: Duration,
}

/// Run the full discovery pipeline for one company website.
#[instrument(skip_all, fields(seed = %seed))]
pub async fn run_discovery<O, P, E>(
    config: &PipelineConfig,
    seed: &Url,
    oracle: &O,
    provider: &P,
    extractor: &E,
    progress: &dyn ProgressReporter,
) -> Result<DiscoveryReport>
where
    O: CompanyOracle,
    P: SearchProvider + Sync,
    E: FounderExtractor + Sync,
{
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, "starting discovery run");

    let crawler = Crawler::new(config.crawl.clone())?;

    // --- Phase 1: company information ---
    progress.phase("Extracting company information");
    let seed_page = match crawler.fetch_page(seed.as_str()).await {
        Ok(page) => Some(page),
        Err(e) if e.is_per_url() => {
            warn!(error = %e, "seed fetch failed, degrading to hostname");
            None
        }
        Err(e) => return Err(e),
    };
    let company = match &seed_page {
        Some(page) => match oracle.extract_company(seed.as_str(), page).await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "company extraction failed, using page metadata");
                fallback_company(seed, Some(page))
            }
        },
        None => fallback_company(seed, None),
    };
    info!(company = %company.name, "company identified");

    // --- Phase 2: site crawl ---
    progress.phase("Crawling company website");
    let (outcome, crawl_urls) = crawler
        .crawl_with(seed, &company.name, |url, fetched, budget| {
            progress.url_visited(url, fetched, budget)
        })
        .await?;

    let mut aggregator = UrlAggregator::new();
    aggregator.extend(crawl_urls);

    // --- Phase 3: founder search ladder ---
    let founders = if config.skip_founder_search {
        Vec::new()
    } else {
        progress.phase("Searching for founders");
        let search = FounderSearch::new(provider, extractor, config.ladder.clone());
        let ladder = search.run(&company, &outcome.pages).await?;
        if ladder.state == SearchState::Exhausted {
            info!("founder search exhausted without results");
        }
        ladder.founders
    };

    // --- Phase 4: founder blogs ---
    if !founders.is_empty() && !config.skip_founder_blogs {
        progress.phase("Searching for founder blogs");
        let blogs =
            search_founder_blogs(provider, &company, &founders, config.results_per_query).await?;
        aggregator.extend(blogs);
    }

    // --- Phase 5: external mentions ---
    if !config.skip_external {
        progress.phase("Searching for company mentions");
        let filter = SkipFilter::new(&config.crawl.skip_words);
        let mentions =
            search_company_mentions(provider, &company, &filter, config.results_per_query).await?;
        aggregator.extend(mentions);
    }

    // --- Phase 6: report ---
    let summary = aggregator.summary(
        run_id.clone(),
        &company.name,
        outcome.pages_failed,
        founders.clone(),
    );
    progress.done(&summary);

    info!(
        total_urls = summary.total_unique_urls,
        failed = summary.failed_fetches,
        founders = founders.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "discovery run complete"
    );

    Ok(DiscoveryReport {
        run_id,
        company,
        founders,
        summary,
        urls: aggregator.urls().to_vec(),
        elapsed: start.elapsed(),
    })
}

/// Minimal company record built from page metadata when the oracle is
/// unavailable, or from the hostname alone when the seed page could not
/// be fetched at all.
fn fallback_company(seed: &Url, page: Option<&CrawledPage>) -> CompanyInfo {
    let name = page
        .and_then(|p| p.title.clone())
        .or_else(|| host_of(seed.as_str()))
        .unwrap_or_else(|| seed.to_string());

    CompanyInfo {
        name,
        description: page.and_then(|p| p.description.clone()).unwrap_or_default(),
        industry: String::new(),
        website: seed.to_string(),
        founders: Vec::new(),
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use sitescout_discovery::{NameHeuristic, SearchHit};
    use sitescout_shared::SiteScoutError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::progress::SilentProgress;

    struct FailingOracle;

    impl CompanyOracle for FailingOracle {
        async fn extract_company(&self, _url: &str, _page: &CrawledPage) -> Result<CompanyInfo> {
            Err(SiteScoutError::parse("oracle unavailable"))
        }
    }

    struct EmptyProvider;

    impl SearchProvider for EmptyProvider {
        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            crawl: CrawlConfig {
                max_pages: 20,
                max_depth: 2,
                concurrency: 2,
                rate_limit_ms: 0,
                request_timeout_secs: 5,
                skip_words: vec![],
            },
            ladder: LadderConfig::default(),
            results_per_query: 5,
            skip_external: false,
            skip_founder_search: false,
            skip_founder_blogs: false,
        }
    }

    async fn serve_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn failed_oracle_degrades_to_page_metadata() {
        let server = MockServer::start().await;
        let home = r#"<html><head>
            <title>Acme Robotics</title>
            <meta name="description" content="Robots for everyone">
        </head><body>
            <a href="/about">About</a>
        </body></html>"#;
        serve_page(&server, "/", home).await;
        serve_page(
            &server,
            "/about",
            "<html><body>Acme was founded by Jane Doe.</body></html>",
        )
        .await;

        let seed = Url::parse(&server.uri()).unwrap();
        let report = run_discovery(
            &config(),
            &seed,
            &FailingOracle,
            &EmptyProvider,
            &NameHeuristic,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(report.company.name, "Acme Robotics");
        assert_eq!(report.company.description, "Robots for everyone");
        // Founders found on site, no external search needed.
        assert_eq!(report.founders.len(), 1);
        assert_eq!(report.founders[0].name, "Jane Doe");
        assert_eq!(report.summary.total_unique_urls, 2);
        assert_eq!(report.summary.company_pages, 2);
    }

    #[tokio::test]
    async fn seed_fetch_failure_yields_partial_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let seed = Url::parse(&server.uri()).unwrap();
        let report = run_discovery(
            &config(),
            &seed,
            &FailingOracle,
            &EmptyProvider,
            &NameHeuristic,
            &SilentProgress,
        )
        .await
        .unwrap();

        // Company name degrades to the hostname; the failed fetch is
        // counted and the seed still appears in the result set.
        assert_eq!(report.company.name, seed.host_str().unwrap());
        assert!(report.summary.failed_fetches >= 1);
        assert_eq!(report.summary.total_unique_urls, 1);
    }

    #[tokio::test]
    async fn summary_produced_even_when_everything_is_skipped() {
        let server = MockServer::start().await;
        serve_page(&server, "/", "<html><body>Hello</body></html>").await;

        let mut cfg = config();
        cfg.skip_founder_search = true;
        cfg.skip_external = true;

        let seed = Url::parse(&server.uri()).unwrap();
        let report = run_discovery(
            &cfg,
            &seed,
            &FailingOracle,
            &EmptyProvider,
            &NameHeuristic,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert!(report.founders.is_empty());
        assert_eq!(report.summary.total_unique_urls, 1);
        assert_eq!(report.summary.failed_fetches, 0);
    }
}
