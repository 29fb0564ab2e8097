//! Core domain types for SiteScout discovery runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for crawl run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// UrlCategory
// ---------------------------------------------------------------------------

/// What kind of resource a discovered URL points at.
///
/// Every consumer matches exhaustively; adding a variant is a deliberate
/// API change, not a stringly-typed drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlCategory {
    /// Same-domain page on the company website.
    CompanyPage,
    /// Same-domain page whose path or anchor text matches a blog keyword.
    BlogPost,
    /// Off-domain page mentioning the company, kept by the skip filter.
    ExternalMention,
    /// Off-domain blog attributed to a company founder.
    FounderBlog,
}

impl std::fmt::Display for UrlCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CompanyPage => "company_page",
            Self::BlogPost => "blog_post",
            Self::ExternalMention => "external_mention",
            Self::FounderBlog => "founder_blog",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// DiscoveredUrl
// ---------------------------------------------------------------------------

/// A single URL found during discovery.
///
/// `normalized` is the identity key: two URLs are the same resource iff
/// their normalized forms are byte-equal. `url` keeps the display form
/// as first encountered. The record is immutable once created; when the
/// same resource is reached again via a different path, the first
/// categorization wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    /// Display form, as encountered on the page.
    pub url: String,
    /// Canonical form used for deduplication.
    pub normalized: String,
    /// Hops from the seed (seed itself is depth 0).
    pub depth: u32,
    /// Heuristic categorization.
    pub category: UrlCategory,
    /// URL of the page this link was discovered on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Page or anchor title, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Founders
// ---------------------------------------------------------------------------

/// Which discovery method produced a founder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FounderSource {
    /// Present in the initial company-information extraction.
    Extraction,
    /// Found by scanning company pages for founder-indicative content.
    OnSiteSearch,
    /// Found via external web search.
    WebSearch,
    /// Found via professional directory queries (LinkedIn, Crunchbase).
    Directory,
}

/// A candidate founder name with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Founder {
    pub name: String,
    pub source: FounderSource,
}

// ---------------------------------------------------------------------------
// CompanyInfo
// ---------------------------------------------------------------------------

/// Structured company information, produced by the extraction oracle.
///
/// The LLM-backed extractor is an external collaborator; a failing
/// oracle degrades to a minimal record built from the homepage title
/// and meta description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub industry: String,
    /// Homepage URL the info was extracted from.
    pub website: String,
    /// Founder names, possibly empty.
    #[serde(default)]
    pub founders: Vec<String>,
}

// ---------------------------------------------------------------------------
// CrawlSummary
// ---------------------------------------------------------------------------

/// Counts for a completed (possibly partial) discovery run.
///
/// Generated once per run and read-only after creation. Failed fetches
/// are counted separately from successfully categorized URLs so a
/// partial run is distinguishable from a clean one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub run_id: RunId,
    pub company_name: String,
    pub generated_at: DateTime<Utc>,
    pub total_unique_urls: usize,
    pub company_pages: usize,
    pub blog_posts: usize,
    pub external_mentions: usize,
    pub founder_blogs: usize,
    pub failed_fetches: usize,
    #[serde(default)]
    pub founders: Vec<Founder>,
}

// ---------------------------------------------------------------------------
// Task progress contract
// ---------------------------------------------------------------------------

/// Observable status of a long-running discovery task.
///
/// The core emits status transitions and progress strings; the polling
/// transport is the UI layer's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}
