//! Breadth-first frontier traversal over a company website.
//!
//! The engine starts from a seed URL, fetches same-domain pages level by
//! level through the bounded executor, and records every discovered URL
//! with a category. Off-domain links are recorded (or skip-filtered) but
//! never fetched. Fetch and parse failures are counted per URL; a
//! partial crawl is still a valid outcome.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use sitescout_shared::{CrawlConfig, DiscoveredUrl, Result, SiteScoutError, UrlCategory};

use crate::executor::{FetchExecutor, FetchMode};
use crate::filter::SkipFilter;
use crate::normalize::{normalize, same_domain};

/// Path segments and anchor words that mark a link as blog content.
pub const BLOG_KEYWORDS: &[&str] = &[
    "blog", "news", "articles", "insights", "thoughts", "updates", "press", "media", "stories",
    "journal", "diary", "notes",
];

// ---------------------------------------------------------------------------
// CrawlOutcome
// ---------------------------------------------------------------------------

/// Summary of a completed frontier traversal.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Pages successfully fetched and parsed.
    pub pages_fetched: usize,
    /// Pages whose fetch failed (network, timeout, non-2xx).
    pub pages_failed: usize,
    /// Off-domain URLs dropped by the skip-word filter.
    pub urls_skipped: usize,
    /// Wall-clock duration of the crawl.
    pub duration: Duration,
    /// Fetched same-domain pages, kept for downstream founder scanning.
    pub pages: Vec<CrawledPage>,
}

/// A fetched same-domain page with the pieces downstream stages need.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    /// Normalized page URL.
    pub url: String,
    /// BFS depth at which the page was fetched.
    pub depth: u32,
    /// `<title>` text, when present.
    pub title: Option<String>,
    /// `<meta name="description">` content, when present.
    pub description: Option<String>,
    /// Visible text content of the page.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Bounded breadth-first crawler for a single company domain.
pub struct Crawler {
    config: CrawlConfig,
    executor: FetchExecutor,
    filter: SkipFilter,
}

impl Crawler {
    /// Create a crawler; builds the HTTP executor and skip filter from
    /// the given configuration.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let executor = FetchExecutor::new(
            config.concurrency,
            config.rate_limit_ms,
            config.request_timeout_secs,
        )?;
        let filter = SkipFilter::new(&config.skip_words);

        Ok(Self {
            config,
            executor,
            filter,
        })
    }

    /// Switch the executor's scheduling strategy.
    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.executor = self.executor.with_mode(mode);
        self
    }

    /// Crawl from `seed`, returning the traversal outcome and every URL
    /// discovered, categorized. `company_name` feeds the skip-word
    /// exemption for off-domain links.
    pub async fn crawl(
        &self,
        seed: &Url,
        company_name: &str,
    ) -> Result<(CrawlOutcome, Vec<DiscoveredUrl>)> {
        self.crawl_with(seed, company_name, |_, _, _| {}).await
    }

    /// Like [`crawl`](Self::crawl), calling `on_page` after each
    /// successfully fetched page with the page URL, the fetch count so
    /// far, and the page budget.
    #[instrument(skip_all, fields(seed = %seed, company = %company_name))]
    pub async fn crawl_with<F>(
        &self,
        seed: &Url,
        company_name: &str,
        mut on_page: F,
    ) -> Result<(CrawlOutcome, Vec<DiscoveredUrl>)>
    where
        F: FnMut(&str, usize, usize),
    {
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(SiteScoutError::validation(format!(
                "seed URL must be http(s): {seed}"
            )));
        }
        let company_domain = seed
            .host_str()
            .ok_or_else(|| SiteScoutError::validation(format!("seed URL has no host: {seed}")))?
            .to_string();

        let started = Instant::now();
        let seed_normalized = normalize(seed.as_str());

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(String, u32)> = VecDeque::new();
        let mut discovered: Vec<DiscoveredUrl> = Vec::new();
        let mut pages: Vec<CrawledPage> = Vec::new();
        let mut pages_fetched = 0usize;
        let mut pages_failed = 0usize;
        let mut urls_skipped = 0usize;

        visited.insert(seed_normalized.clone());
        frontier.push_back((seed_normalized.clone(), 0));
        discovered.push(DiscoveredUrl {
            url: seed.to_string(),
            normalized: seed_normalized,
            depth: 0,
            category: UrlCategory::CompanyPage,
            origin: None,
            title: None,
        });

        info!(
            max_pages = self.config.max_pages,
            max_depth = self.config.max_depth,
            concurrency = self.config.concurrency,
            "starting crawl"
        );

        while !frontier.is_empty() && pages_fetched + pages_failed < self.config.max_pages {
            let remaining = self.config.max_pages - (pages_fetched + pages_failed);
            let take = frontier.len().min(self.config.concurrency).min(remaining);
            let batch: Vec<(String, u32)> = frontier.drain(..take).collect();

            let outcomes = self.executor.fetch_batch(batch).await;

            // Serial merge point: all queue and visited-set mutation
            // happens here, never inside the fetch tasks.
            for (url, depth, result) in outcomes {
                let doc = match result {
                    Ok(doc) => doc,
                    Err(e) => {
                        warn!(%url, error = %e, "fetch failed");
                        pages_failed += 1;
                        continue;
                    }
                };
                pages_fetched += 1;
                on_page(&url, pages_fetched, self.config.max_pages);

                let base = match Url::parse(&doc.url) {
                    Ok(base) => base,
                    Err(e) => {
                        debug!(url = %doc.url, error = %e, "unparsable page url, treating as leaf");
                        continue;
                    }
                };

                let parsed = Html::parse_document(&doc.body);
                let page = CrawledPage {
                    url: url.clone(),
                    depth,
                    title: extract_title(&parsed),
                    description: extract_description(&parsed),
                    text: extract_text(&parsed),
                };

                for link in extract_links(&parsed, &base) {
                    self.record_link(
                        link,
                        depth,
                        &url,
                        seed,
                        company_name,
                        &company_domain,
                        &mut visited,
                        &mut frontier,
                        &mut discovered,
                        &mut urls_skipped,
                    );
                }

                pages.push(page);
            }
        }

        let outcome = CrawlOutcome {
            pages_fetched,
            pages_failed,
            urls_skipped,
            duration: started.elapsed(),
            pages,
        };

        info!(
            pages_fetched = outcome.pages_fetched,
            pages_failed = outcome.pages_failed,
            urls_skipped = outcome.urls_skipped,
            discovered = discovered.len(),
            duration_ms = outcome.duration.as_millis(),
            "crawl completed"
        );

        Ok((outcome, discovered))
    }

    /// Fetch a single page without enqueuing anything. Used by callers
    /// that need the seed page's title and text before crawling.
    pub async fn fetch_page(&self, url: &str) -> Result<CrawledPage> {
        let outcomes = self.executor.fetch_batch(vec![(url.to_string(), 0)]).await;
        let (_, _, result) = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| SiteScoutError::Fetch(format!("{url}: no fetch outcome")))?;
        let doc = result?;

        let parsed = Html::parse_document(&doc.body);
        Ok(CrawledPage {
            url: normalize(url),
            depth: 0,
            title: extract_title(&parsed),
            description: extract_description(&parsed),
            text: extract_text(&parsed),
        })
    }

    /// Fetch a single page and return its same-domain links, normalized
    /// and deduplicated. Used for one-level subpage discovery.
    pub async fn discover_subpages(&self, url: &str) -> Result<Vec<String>> {
        let base = Url::parse(url)
            .map_err(|e| SiteScoutError::validation(format!("invalid URL {url}: {e}")))?;

        let outcomes = self.executor.fetch_batch(vec![(url.to_string(), 0)]).await;
        let (_, _, result) = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| SiteScoutError::Fetch(format!("{url}: no fetch outcome")))?;
        let doc = result?;

        let parsed = Html::parse_document(&doc.body);
        let mut seen = HashSet::new();
        let mut subpages = Vec::new();
        for link in extract_links(&parsed, &base) {
            if !same_domain(&base, &link.target) {
                continue;
            }
            let normalized = normalize(link.target.as_str());
            if seen.insert(normalized.clone()) {
                subpages.push(normalized);
            }
        }
        Ok(subpages)
    }

    #[allow(clippy::too_many_arguments)]
    fn record_link(
        &self,
        link: ExtractedLink,
        depth: u32,
        origin: &str,
        seed: &Url,
        company_name: &str,
        company_domain: &str,
        visited: &mut HashSet<String>,
        frontier: &mut VecDeque<(String, u32)>,
        discovered: &mut Vec<DiscoveredUrl>,
        urls_skipped: &mut usize,
    ) {
        let normalized = normalize(link.target.as_str());
        if visited.contains(&normalized) {
            return;
        }
        // The page budget bounds the result set, not just the fetch
        // count: once the visited set reaches it, nothing new is
        // recorded or enqueued.
        if visited.len() >= self.config.max_pages {
            return;
        }

        if same_domain(seed, &link.target) {
            let category = if is_blog_link(&link.target, link.anchor.as_deref()) {
                UrlCategory::BlogPost
            } else {
                UrlCategory::CompanyPage
            };
            visited.insert(normalized.clone());
            if depth + 1 <= self.config.max_depth {
                frontier.push_back((normalized.clone(), depth + 1));
            }
            discovered.push(DiscoveredUrl {
                url: link.target.to_string(),
                normalized,
                depth: depth + 1,
                category,
                origin: Some(origin.to_string()),
                title: link.anchor,
            });
        } else if self
            .filter
            .should_skip(link.target.as_str(), company_name, company_domain)
        {
            debug!(url = %link.target, "skip-filtered external link");
            *urls_skipped += 1;
        } else {
            // External mention: recorded, never fetched.
            visited.insert(normalized.clone());
            discovered.push(DiscoveredUrl {
                url: link.target.to_string(),
                normalized,
                depth: depth + 1,
                category: UrlCategory::ExternalMention,
                origin: Some(origin.to_string()),
                title: link.anchor,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Link and content extraction
// ---------------------------------------------------------------------------

/// A resolved link together with its anchor text.
struct ExtractedLink {
    target: Url,
    anchor: Option<String>,
}

/// Extract all `a[href]` links from a document, resolved against the
/// page's own URL. Anchor-only, javascript:, mailto: and tel: links are
/// dropped.
fn extract_links(doc: &Html, base_url: &Url) -> Vec<ExtractedLink> {
    let link_sel = Selector::parse("a[href]").unwrap();
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }

        let Ok(resolved) = base_url.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }

        let anchor = {
            let text = el.text().collect::<String>();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        };

        links.push(ExtractedLink {
            target: resolved,
            anchor,
        });
    }

    links
}

/// `<title>` text of a document, trimmed.
fn extract_title(doc: &Html) -> Option<String> {
    let title_sel = Selector::parse("title").unwrap();
    doc.select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// `<meta name="description">` content, trimmed.
fn extract_description(doc: &Html) -> Option<String> {
    let meta_sel = Selector::parse(r#"meta[name="description"]"#).unwrap();
    doc.select(&meta_sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Visible text of a document's body, whitespace-collapsed.
fn extract_text(doc: &Html) -> String {
    let body_sel = Selector::parse("body").unwrap();
    let raw = match doc.select(&body_sel).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => doc.root_element().text().collect::<Vec<_>>().join(" "),
    };
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A same-domain link counts as blog content when a blog keyword appears
/// as a path segment or in the anchor text.
fn is_blog_link(url: &Url, anchor: Option<&str>) -> bool {
    let path_lower = url.path().to_ascii_lowercase();
    let segments: Vec<&str> = path_lower.split('/').filter(|s| !s.is_empty()).collect();

    for keyword in BLOG_KEYWORDS {
        if segments.iter().any(|s| s == keyword) {
            return true;
        }
        if let Some(text) = anchor {
            let text_lower = text.to_ascii_lowercase();
            if text_lower.split_whitespace().any(|w| w == *keyword) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            max_pages: 50,
            max_depth: 3,
            concurrency: 2,
            rate_limit_ms: 0,
            request_timeout_secs: 5,
            skip_words: vec![],
        }
    }

    async fn serve_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn blog_link_by_path_segment() {
        let url = Url::parse("https://example.com/blog/my-post").unwrap();
        assert!(is_blog_link(&url, None));

        let url = Url::parse("https://example.com/about").unwrap();
        assert!(!is_blog_link(&url, None));

        // Keyword must be a whole segment, not a substring.
        let url = Url::parse("https://example.com/weblog-tools").unwrap();
        assert!(!is_blog_link(&url, None));
    }

    #[test]
    fn blog_link_by_anchor_text() {
        let url = Url::parse("https://example.com/p/42").unwrap();
        assert!(is_blog_link(&url, Some("Read our News")));
        assert!(!is_blog_link(&url, Some("Contact us")));
    }

    #[test]
    fn link_extraction_skips_non_http() {
        let html = r##"<html><body>
            <a href="/about">About</a>
            <a href="#top">Top</a>
            <a href="mailto:hi@example.com">Mail</a>
            <a href="tel:+123">Call</a>
            <a href="javascript:void(0)">JS</a>
        </body></html>"##;
        let doc = Html::parse_document(html);
        let base = Url::parse("https://example.com/").unwrap();
        let links = extract_links(&doc, &base);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target.as_str(), "https://example.com/about");
        assert_eq!(links[0].anchor.as_deref(), Some("About"));
    }

    #[tokio::test]
    async fn seed_scenario_dedupes_trailing_slash() {
        let server = MockServer::start().await;

        // Root links /about twice (with and without slash) and one blog post.
        let root = r#"<html><body>
            <a href="/about">About</a>
            <a href="/about/">About again</a>
            <a href="/blog/post1">Read our blog</a>
        </body></html>"#;
        serve_page(&server, "/", root).await;
        serve_page(&server, "/about", "<html><body><h1>About</h1></body></html>").await;
        serve_page(&server, "/blog/post1", "<html><body><h1>Post</h1></body></html>").await;

        let crawler = Crawler::new(test_config()).unwrap();
        let seed = Url::parse(&server.uri()).unwrap();
        let (outcome, discovered) = crawler.crawl(&seed, "TestCo").await.unwrap();

        // Seed + /about + /blog/post1, the slash variant collapses.
        assert_eq!(discovered.len(), 3);
        assert_eq!(outcome.pages_fetched, 3);

        let about: Vec<_> = discovered
            .iter()
            .filter(|d| d.normalized.ends_with("/about"))
            .collect();
        assert_eq!(about.len(), 1);
        // First-seen display form is kept.
        assert_eq!(about[0].url, format!("{}/about", server.uri()));

        let blog = discovered
            .iter()
            .find(|d| d.normalized.ends_with("/blog/post1"))
            .unwrap();
        assert_eq!(blog.category, UrlCategory::BlogPost);
    }

    #[tokio::test]
    async fn crawl_is_bounded_by_max_pages() {
        let server = MockServer::start().await;

        // A link farm: root links to 30 pages, each linking onward.
        let mut root = String::from("<html><body>");
        for i in 0..30 {
            root.push_str(&format!("<a href=\"/page{i}\">Page {i}</a>"));
        }
        root.push_str("</body></html>");
        serve_page(&server, "/", &root).await;
        for i in 0..30 {
            let body = format!(
                "<html><body><a href=\"/page{i}extra\">More</a></body></html>"
            );
            serve_page(&server, &format!("/page{i}"), &body).await;
        }

        let mut config = test_config();
        config.max_pages = 5;
        let crawler = Crawler::new(config).unwrap();
        let seed = Url::parse(&server.uri()).unwrap();
        let (outcome, discovered) = crawler.crawl(&seed, "TestCo").await.unwrap();

        assert!(outcome.pages_fetched <= 5);
        // The result set is bounded too, not just the fetch count.
        assert!(discovered.len() <= 5);
        assert!(discovered.iter().any(|d| d.depth == 0));
    }

    #[tokio::test]
    async fn page_callback_fires_during_crawl() {
        let server = MockServer::start().await;
        serve_page(
            &server,
            "/",
            r#"<html><body><a href="/a">A</a></body></html>"#,
        )
        .await;
        serve_page(&server, "/a", "<html><body>leaf</body></html>").await;

        let crawler = Crawler::new(test_config()).unwrap();
        let seed = Url::parse(&server.uri()).unwrap();

        let mut events: Vec<(String, usize)> = Vec::new();
        let (outcome, _) = crawler
            .crawl_with(&seed, "TestCo", |url, fetched, _budget| {
                events.push((url.to_string(), fetched));
            })
            .await
            .unwrap();

        assert_eq!(events.len(), outcome.pages_fetched);
        assert_eq!(events[0].1, 1);
    }

    #[tokio::test]
    async fn crawl_respects_max_depth() {
        let server = MockServer::start().await;
        serve_page(
            &server,
            "/",
            r#"<html><body><a href="/l1">L1</a></body></html>"#,
        )
        .await;
        serve_page(
            &server,
            "/l1",
            r#"<html><body><a href="/l2">L2</a></body></html>"#,
        )
        .await;
        serve_page(
            &server,
            "/l2",
            r#"<html><body><a href="/l3">L3</a></body></html>"#,
        )
        .await;

        let mut config = test_config();
        config.max_depth = 1;
        let crawler = Crawler::new(config).unwrap();
        let seed = Url::parse(&server.uri()).unwrap();
        let (outcome, discovered) = crawler.crawl(&seed, "TestCo").await.unwrap();

        // Root (depth 0) and /l1 (depth 1) fetched; /l2 recorded but not
        // fetched; /l3 never seen.
        assert_eq!(outcome.pages_fetched, 2);
        assert!(discovered.iter().any(|d| d.normalized.ends_with("/l2")));
        assert!(!discovered.iter().any(|d| d.normalized.ends_with("/l3")));
    }

    #[tokio::test]
    async fn external_links_recorded_but_not_fetched() {
        let server = MockServer::start().await;
        let root = r#"<html><body>
            <a href="https://news.example.org/story">Coverage</a>
            <a href="https://reddit.com/r/startups">Discussion</a>
        </body></html>"#;
        serve_page(&server, "/", root).await;

        let crawler = Crawler::new(test_config()).unwrap();
        let seed = Url::parse(&server.uri()).unwrap();
        let (outcome, discovered) = crawler.crawl(&seed, "TestCo").await.unwrap();

        // Only the seed is fetched; reddit is skip-filtered, the news
        // site becomes an external mention.
        assert_eq!(outcome.pages_fetched, 1);
        assert_eq!(outcome.urls_skipped, 1);

        let mention = discovered
            .iter()
            .find(|d| d.url.contains("news.example.org"))
            .unwrap();
        assert_eq!(mention.category, UrlCategory::ExternalMention);
        assert!(!discovered.iter().any(|d| d.url.contains("reddit.com")));
    }

    #[tokio::test]
    async fn fetch_failures_are_counted_not_fatal() {
        let server = MockServer::start().await;
        let root = r#"<html><body>
            <a href="/ok">Fine</a>
            <a href="/broken">Broken</a>
        </body></html>"#;
        serve_page(&server, "/", root).await;
        serve_page(&server, "/ok", "<html><body>ok</body></html>").await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let crawler = Crawler::new(test_config()).unwrap();
        let seed = Url::parse(&server.uri()).unwrap();
        let (outcome, _) = crawler.crawl(&seed, "TestCo").await.unwrap();

        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.pages_failed, 1);
    }

    #[tokio::test]
    async fn discover_subpages_returns_same_domain_links() {
        let server = MockServer::start().await;
        let page = r#"<html><body>
            <a href="/team">Team</a>
            <a href="/team/">Team dup</a>
            <a href="https://elsewhere.com/x">Off-site</a>
        </body></html>"#;
        serve_page(&server, "/start", page).await;

        let crawler = Crawler::new(test_config()).unwrap();
        let subpages = crawler
            .discover_subpages(&format!("{}/start", server.uri()))
            .await
            .unwrap();

        assert_eq!(subpages.len(), 1);
        assert!(subpages[0].ends_with("/team"));
    }
}
