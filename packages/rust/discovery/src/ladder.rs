//! Founder search ladder with early termination.
//!
//! Steps run in fixed order, cheapest first, and the ladder stops at the
//! first step that yields founders:
//!
//! 1. Extraction-embedded: names already present in the company info.
//! 2. On-site scan: already-fetched company pages, priority pages first.
//! 3. External web search, with an eager extraction checkpoint once the
//!    accumulated hits cross a threshold.
//! 4. Professional directory queries (LinkedIn, Crunchbase).
//!
//! A search-provider failure exhausts the current step and advances the
//! ladder instead of failing the run.

use tracing::{debug, info, instrument, warn};

use sitescout_crawler::CrawledPage;
use sitescout_shared::{CompanyInfo, Founder, FounderSource, Result};

use crate::extract::FounderExtractor;
use crate::search::{SearchHit, SearchProvider};

/// URL substrings that mark a page as likely to name the founders.
const PRIORITY_PAGE_HINTS: &[&str] = &["about", "team", "company", "people", "leadership", "founders"];

/// Where the ladder currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    NotStarted,
    Searching,
    Found,
    Exhausted,
}

/// Tunables for the search steps.
#[derive(Debug, Clone)]
pub struct LadderConfig {
    /// Hits requested per search query.
    pub results_per_query: usize,
    /// Accumulated-hit count at which extraction runs before the next
    /// query is issued.
    pub eager_extract_threshold: usize,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            results_per_query: 5,
            eager_extract_threshold: 10,
        }
    }
}

/// Result of a completed ladder walk.
#[derive(Debug, Clone)]
pub struct LadderOutcome {
    /// Founders found, each tagged with the step that produced it.
    pub founders: Vec<Founder>,
    /// `Found` or `Exhausted`; never an intermediate state.
    pub state: SearchState,
    /// Total search queries issued across steps 3 and 4.
    pub queries_issued: usize,
}

/// Walks the founder search ladder for one company.
pub struct FounderSearch<P, E> {
    provider: P,
    extractor: E,
    config: LadderConfig,
}

impl<P: SearchProvider, E: FounderExtractor> FounderSearch<P, E> {
    pub fn new(provider: P, extractor: E, config: LadderConfig) -> Self {
        Self {
            provider,
            extractor,
            config,
        }
    }

    /// Run the ladder. `pages` are the same-domain pages the crawl
    /// already fetched; no additional site traffic is generated.
    #[instrument(skip_all, fields(company = %company.name))]
    pub async fn run(&self, company: &CompanyInfo, pages: &[CrawledPage]) -> Result<LadderOutcome> {
        // Step 1: founders already present in the extraction.
        if !company.founders.is_empty() {
            info!(count = company.founders.len(), "founders embedded in company info");
            return Ok(LadderOutcome {
                founders: tag(&company.founders, FounderSource::Extraction),
                state: SearchState::Found,
                queries_issued: 0,
            });
        }

        // Step 2: scan fetched pages, priority pages first. The scan
        // stops at the first page that yields names.
        if let Some(founders) = self.scan_site(pages).await {
            return Ok(LadderOutcome {
                founders,
                state: SearchState::Found,
                queries_issued: 0,
            });
        }

        let mut queries_issued = 0usize;

        // Step 3: external web search with eager checkpoint.
        if let Some(founders) = self.web_search(company, &mut queries_issued).await {
            return Ok(LadderOutcome {
                founders,
                state: SearchState::Found,
                queries_issued,
            });
        }

        // Step 4: directory fallback.
        if let Some(founders) = self.directory_search(company, &mut queries_issued).await {
            return Ok(LadderOutcome {
                founders,
                state: SearchState::Found,
                queries_issued,
            });
        }

        info!(queries_issued, "founder search exhausted");
        Ok(LadderOutcome {
            founders: Vec::new(),
            state: SearchState::Exhausted,
            queries_issued,
        })
    }

    async fn scan_site(&self, pages: &[CrawledPage]) -> Option<Vec<Founder>> {
        let mut ordered: Vec<&CrawledPage> = pages.iter().collect();
        ordered.sort_by_key(|p| {
            let url = p.url.to_ascii_lowercase();
            if PRIORITY_PAGE_HINTS.iter().any(|h| url.contains(h)) {
                0
            } else {
                1
            }
        });

        for page in ordered {
            let names = match self
                .extractor
                .extract_founders(std::slice::from_ref(&page.text))
                .await
            {
                Ok(names) => names,
                Err(e) => {
                    warn!(url = %page.url, error = %e, "extraction failed, skipping page");
                    continue;
                }
            };
            if !names.is_empty() {
                info!(url = %page.url, count = names.len(), "founders found on site");
                return Some(tag(&names, FounderSource::OnSiteSearch));
            }
        }
        None
    }

    async fn web_search(
        &self,
        company: &CompanyInfo,
        queries_issued: &mut usize,
    ) -> Option<Vec<Founder>> {
        let name = &company.name;
        let queries = [
            format!("{name} founders"),
            format!("{name} founder CEO"),
            format!("who founded {name}"),
            format!("{name} founding team"),
        ];

        let mut accumulated: Vec<String> = Vec::new();
        for query in &queries {
            let hits = match self
                .provider
                .search(query, self.config.results_per_query)
                .await
            {
                Ok(hits) => {
                    *queries_issued += 1;
                    hits
                }
                Err(e) => {
                    warn!(%query, error = %e, "web search failed, step exhausted");
                    *queries_issued += 1;
                    break;
                }
            };
            accumulated.extend(hits.iter().map(hit_text));

            // Eager checkpoint: enough material accumulated to try
            // extraction before spending another query.
            if accumulated.len() >= self.config.eager_extract_threshold {
                debug!(hits = accumulated.len(), "eager extraction checkpoint");
                if let Some(founders) = self.try_extract(&accumulated, FounderSource::WebSearch).await
                {
                    return Some(founders);
                }
            }
        }

        if accumulated.is_empty() {
            return None;
        }
        self.try_extract(&accumulated, FounderSource::WebSearch).await
    }

    async fn directory_search(
        &self,
        company: &CompanyInfo,
        queries_issued: &mut usize,
    ) -> Option<Vec<Founder>> {
        let name = &company.name;
        let queries = [
            format!("site:linkedin.com {name} founder"),
            format!("site:crunchbase.com {name}"),
        ];

        let mut accumulated: Vec<String> = Vec::new();
        for query in &queries {
            match self
                .provider
                .search(query, self.config.results_per_query)
                .await
            {
                Ok(hits) => {
                    *queries_issued += 1;
                    accumulated.extend(hits.iter().map(hit_text));
                }
                Err(e) => {
                    warn!(%query, error = %e, "directory search failed, step exhausted");
                    *queries_issued += 1;
                    break;
                }
            }
        }

        if accumulated.is_empty() {
            return None;
        }
        self.try_extract(&accumulated, FounderSource::Directory).await
    }

    async fn try_extract(&self, texts: &[String], source: FounderSource) -> Option<Vec<Founder>> {
        match self.extractor.extract_founders(texts).await {
            Ok(names) if !names.is_empty() => {
                info!(count = names.len(), ?source, "founders extracted");
                Some(tag(&names, source))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "extraction failed");
                None
            }
        }
    }
}

fn tag(names: &[String], source: FounderSource) -> Vec<Founder> {
    names
        .iter()
        .map(|name| Founder {
            name: name.clone(),
            source,
        })
        .collect()
}

fn hit_text(hit: &SearchHit) -> String {
    format!("{} {}", hit.title, hit.snippet)
}

#[cfg(test)]
mod ladder_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sitescout_shared::{Result, SiteScoutError};

    /// Provider that returns a scripted batch per call and counts calls.
    struct ScriptedProvider {
        batches: Vec<Vec<SearchHit>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(batches: Vec<Vec<SearchHit>>) -> Self {
            Self {
                batches,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SearchProvider for ScriptedProvider {
        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.batches.get(n).cloned().unwrap_or_default())
        }
    }

    /// Provider that always fails.
    struct FailingProvider {
        calls: AtomicUsize,
    }

    impl SearchProvider for FailingProvider {
        async fn search(&self, query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SiteScoutError::SearchProvider(format!("{query}: down")))
        }
    }

    fn hit(snippet: &str) -> SearchHit {
        SearchHit {
            url: "https://result.example/x".into(),
            title: "Result".into(),
            snippet: snippet.into(),
        }
    }

    fn company(founders: Vec<String>) -> CompanyInfo {
        CompanyInfo {
            name: "Acme".into(),
            website: "https://acme.io".into(),
            founders,
            ..Default::default()
        }
    }

    fn page(url: &str, text: &str) -> CrawledPage {
        CrawledPage {
            url: url.into(),
            depth: 1,
            title: None,
            description: None,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn embedded_founders_skip_all_search() {
        let provider = ScriptedProvider::new(vec![]);
        let search = FounderSearch::new(
            &provider,
            crate::extract::NameHeuristic,
            LadderConfig::default(),
        );

        let info = company(vec!["Jane Doe".into()]);
        let outcome = search.run(&info, &[]).await.unwrap();

        assert_eq!(outcome.state, SearchState::Found);
        assert_eq!(outcome.founders[0].source, FounderSource::Extraction);
        assert_eq!(outcome.queries_issued, 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn on_site_scan_stops_before_any_search() {
        let provider = ScriptedProvider::new(vec![]);
        let search = FounderSearch::new(
            &provider,
            crate::extract::NameHeuristic,
            LadderConfig::default(),
        );

        let pages = vec![
            page("https://acme.io/pricing", "Plans and pricing."),
            page("https://acme.io/about", "Acme was founded by Jane Doe."),
        ];
        let outcome = search.run(&company(vec![]), &pages).await.unwrap();

        assert_eq!(outcome.state, SearchState::Found);
        assert_eq!(outcome.founders[0].name, "Jane Doe");
        assert_eq!(outcome.founders[0].source, FounderSource::OnSiteSearch);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn eager_checkpoint_extracts_before_remaining_queries() {
        // Four web queries available, four hits each. The founder appears
        // in the 9th hit; with threshold 10 the checkpoint fires after
        // the third query and the fourth is never issued.
        let filler = || vec![hit("nothing"), hit("nothing"), hit("nothing"), hit("nothing")];
        let third = vec![
            hit("company founder Jane Doe announced"),
            hit("nothing"),
            hit("nothing"),
            hit("nothing"),
        ];
        let provider = ScriptedProvider::new(vec![filler(), filler(), third, filler()]);

        let search = FounderSearch::new(
            &provider,
            crate::extract::NameHeuristic,
            LadderConfig {
                results_per_query: 4,
                eager_extract_threshold: 10,
            },
        );

        let outcome = search.run(&company(vec![]), &[]).await.unwrap();

        assert_eq!(outcome.state, SearchState::Found);
        assert_eq!(outcome.founders[0].name, "Jane Doe");
        assert_eq!(outcome.founders[0].source, FounderSource::WebSearch);
        assert_eq!(outcome.queries_issued, 3);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn directory_fallback_after_empty_web_search() {
        // Four empty web batches, then a LinkedIn hit.
        let provider = ScriptedProvider::new(vec![
            vec![],
            vec![],
            vec![],
            vec![],
            vec![hit("profile of Jane Doe, founder at Acme")],
        ]);

        let search = FounderSearch::new(
            &provider,
            crate::extract::NameHeuristic,
            LadderConfig::default(),
        );

        let outcome = search.run(&company(vec![]), &[]).await.unwrap();

        assert_eq!(outcome.state, SearchState::Found);
        assert_eq!(outcome.founders[0].source, FounderSource::Directory);
        // Four web queries + two directory queries issued at most; the
        // second directory batch is empty, so both are consumed.
        assert_eq!(provider.calls(), 6);
    }

    #[tokio::test]
    async fn provider_failure_exhausts_step_not_run() {
        let provider = FailingProvider {
            calls: AtomicUsize::new(0),
        };
        let search = FounderSearch::new(
            &provider,
            crate::extract::NameHeuristic,
            LadderConfig::default(),
        );

        let outcome = search.run(&company(vec![]), &[]).await.unwrap();

        assert_eq!(outcome.state, SearchState::Exhausted);
        assert!(outcome.founders.is_empty());
        // One failed query per step (web, directory).
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
