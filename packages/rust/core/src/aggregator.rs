//! URL aggregation and run reports.
//!
//! The aggregator is the single sink for discovered URLs across all
//! stages of a run. Identity is the normalized form; the first record
//! for a resource wins, including its category and display form.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use sitescout_shared::{
    CrawlSummary, DiscoveredUrl, Founder, Result, RunId, SiteScoutError, UrlCategory,
};

/// Collects discovered URLs, deduplicated by normalized identity.
#[derive(Debug, Default)]
pub struct UrlAggregator {
    seen: HashSet<String>,
    urls: Vec<DiscoveredUrl>,
}

/// Full JSON report: summary plus the categorized URL set.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub summary: &'a CrawlSummary,
    pub urls: &'a [DiscoveredUrl],
}

impl UrlAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one URL. Returns false when the resource was already
    /// recorded (the earlier record is kept untouched).
    pub fn add(&mut self, url: DiscoveredUrl) -> bool {
        if !self.seen.insert(url.normalized.clone()) {
            return false;
        }
        self.urls.push(url);
        true
    }

    /// Record a batch; returns how many were new.
    pub fn extend(&mut self, urls: impl IntoIterator<Item = DiscoveredUrl>) -> usize {
        urls.into_iter().filter(|u| self.add(u.clone())).count()
    }

    /// All recorded URLs, in discovery order.
    pub fn urls(&self) -> &[DiscoveredUrl] {
        &self.urls
    }

    /// Number of recorded URLs in a category.
    pub fn count(&self, category: UrlCategory) -> usize {
        self.urls.iter().filter(|u| u.category == category).count()
    }

    /// Build the run summary from the recorded set.
    pub fn summary(
        &self,
        run_id: RunId,
        company_name: &str,
        failed_fetches: usize,
        founders: Vec<Founder>,
    ) -> CrawlSummary {
        CrawlSummary {
            run_id,
            company_name: company_name.to_string(),
            generated_at: Utc::now(),
            total_unique_urls: self.urls.len(),
            company_pages: self.count(UrlCategory::CompanyPage),
            blog_posts: self.count(UrlCategory::BlogPost),
            external_mentions: self.count(UrlCategory::ExternalMention),
            founder_blogs: self.count(UrlCategory::FounderBlog),
            failed_fetches,
            founders,
        }
    }

    /// Append display URLs to a plain-text list, one per line, skipping
    /// URLs the file already contains. Returns the number appended.
    pub fn write_simple_list(&self, path: &Path) -> Result<usize> {
        let existing: HashSet<String> = match fs::read_to_string(path) {
            Ok(content) => content.lines().map(|l| l.trim().to_string()).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(SiteScoutError::io(path, e)),
        };

        let fresh: Vec<&DiscoveredUrl> = self
            .urls
            .iter()
            .filter(|u| !existing.contains(&u.url))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SiteScoutError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SiteScoutError::io(path, e))?;
        for url in &fresh {
            writeln!(file, "{}", url.url).map_err(|e| SiteScoutError::io(path, e))?;
        }

        debug!(appended = fresh.len(), path = %path.display(), "URL list extended");
        Ok(fresh.len())
    }

    /// Serialize the full categorized set as pretty JSON.
    pub fn to_json_report(&self, summary: &CrawlSummary) -> Result<String> {
        let report = JsonReport {
            summary,
            urls: &self.urls,
        };
        serde_json::to_string_pretty(&report)
            .map_err(|e| SiteScoutError::Persistence(format!("report serialization: {e}")))
    }
}

#[cfg(test)]
mod aggregator_tests {
    use super::*;
    use tempfile::TempDir;

    fn url(normalized: &str, category: UrlCategory) -> DiscoveredUrl {
        DiscoveredUrl {
            url: normalized.to_string(),
            normalized: normalized.to_string(),
            depth: 1,
            category,
            origin: None,
            title: None,
        }
    }

    #[test]
    fn first_record_wins() {
        let mut agg = UrlAggregator::new();
        assert!(agg.add(url("https://a.io/x", UrlCategory::CompanyPage)));
        // Same resource rediscovered as a blog post: ignored.
        assert!(!agg.add(url("https://a.io/x", UrlCategory::BlogPost)));

        assert_eq!(agg.urls().len(), 1);
        assert_eq!(agg.urls()[0].category, UrlCategory::CompanyPage);
    }

    #[test]
    fn summary_counts_by_category() {
        let mut agg = UrlAggregator::new();
        agg.extend([
            url("https://a.io", UrlCategory::CompanyPage),
            url("https://a.io/blog/1", UrlCategory::BlogPost),
            url("https://a.io/blog/2", UrlCategory::BlogPost),
            url("https://press.example/a", UrlCategory::ExternalMention),
        ]);

        let summary = agg.summary(RunId::new(), "Acme", 2, vec![]);
        assert_eq!(summary.total_unique_urls, 4);
        assert_eq!(summary.company_pages, 1);
        assert_eq!(summary.blog_posts, 2);
        assert_eq!(summary.external_mentions, 1);
        assert_eq!(summary.founder_blogs, 0);
        assert_eq!(summary.failed_fetches, 2);
    }

    #[test]
    fn simple_list_appends_only_new() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("urls.txt");

        let mut agg = UrlAggregator::new();
        agg.add(url("https://a.io/x", UrlCategory::CompanyPage));
        agg.add(url("https://a.io/y", UrlCategory::CompanyPage));
        assert_eq!(agg.write_simple_list(&path).unwrap(), 2);

        // Second write with one overlapping URL.
        let mut agg2 = UrlAggregator::new();
        agg2.add(url("https://a.io/y", UrlCategory::CompanyPage));
        agg2.add(url("https://a.io/z", UrlCategory::CompanyPage));
        assert_eq!(agg2.write_simple_list(&path).unwrap(), 1);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["https://a.io/x", "https://a.io/y", "https://a.io/z"]);
    }

    #[test]
    fn json_report_contains_summary_and_urls() {
        let mut agg = UrlAggregator::new();
        agg.add(url("https://a.io/blog/1", UrlCategory::BlogPost));

        let summary = agg.summary(RunId::new(), "Acme", 0, vec![]);
        let json = agg.to_json_report(&summary).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["summary"]["company_name"], "Acme");
        assert_eq!(parsed["urls"][0]["category"], "blog_post");
    }
}
