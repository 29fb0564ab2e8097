//! Off-site searches: founder blogs and external company mentions.
//!
//! Both searches are best-effort. A provider failure ends the query set
//! early and the hits gathered so far are returned; nothing here fails a
//! discovery run.

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use sitescout_crawler::{SkipFilter, host_of, normalize};
use sitescout_shared::{CompanyInfo, DiscoveredUrl, Founder, Result, UrlCategory};

use crate::search::{SearchHit, SearchProvider};

/// Substrings that identify a hit as personal blog content.
const BLOG_INDICATORS: &[&str] = &[
    "blog",
    "medium.com",
    "substack",
    "wordpress",
    "posts",
    "author",
    "writes",
];

/// Substrings that identify a hit as press or editorial coverage.
const NEWS_INDICATORS: &[&str] = &[
    "news",
    "article",
    "press",
    "interview",
    "review",
    "announce",
    "launch",
    "funding",
    "raises",
];

/// Search for personal blogs written by the company's founders.
///
/// A hit is kept when the founder's name appears in the title or snippet
/// and a blog indicator appears anywhere in the hit.
#[instrument(skip_all, fields(company = %company.name, founders = founders.len()))]
pub async fn search_founder_blogs<P: SearchProvider>(
    provider: &P,
    company: &CompanyInfo,
    founders: &[Founder],
    results_per_query: usize,
) -> Result<Vec<DiscoveredUrl>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut blogs: Vec<DiscoveredUrl> = Vec::new();

    'founders: for founder in founders {
        let name = &founder.name;
        let queries = [
            format!("{name} blog"),
            format!("{name} medium"),
            format!("{name} substack"),
            format!("\"{name}\" personal blog"),
        ];

        for query in &queries {
            let hits = match provider.search(query, results_per_query).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(%query, error = %e, "founder blog search failed, stopping");
                    break 'founders;
                }
            };

            for hit in hits {
                if !mentions_name(&hit, name) || !has_indicator(&hit, BLOG_INDICATORS) {
                    continue;
                }
                record(&hit, UrlCategory::FounderBlog, &mut seen, &mut blogs);
            }
        }
    }

    info!(found = blogs.len(), "founder blog search completed");
    Ok(blogs)
}

/// Search for external pages that cover the company: news, press,
/// interviews, reviews. The company's own domain and skip-filtered hosts
/// are excluded.
#[instrument(skip_all, fields(company = %company.name))]
pub async fn search_company_mentions<P: SearchProvider>(
    provider: &P,
    company: &CompanyInfo,
    filter: &SkipFilter,
    results_per_query: usize,
) -> Result<Vec<DiscoveredUrl>> {
    let name = &company.name;
    let company_domain = host_of(&company.website).unwrap_or_default();
    let queries = [
        format!("{name} news"),
        format!("\"{name}\" article"),
        format!("{name} press release"),
        format!("{name} interview"),
        format!("{name} review"),
    ];

    let mut seen: HashSet<String> = HashSet::new();
    let mut mentions: Vec<DiscoveredUrl> = Vec::new();

    for query in &queries {
        let hits = match provider.search(query, results_per_query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(%query, error = %e, "mention search failed, stopping");
                break;
            }
        };

        for hit in hits {
            // Own-domain hits are company pages, not mentions.
            if let Some(host) = host_of(&hit.url) {
                if host == company_domain {
                    continue;
                }
            }
            if filter.should_skip(&hit.url, name, &company_domain) {
                continue;
            }
            if !mentions_name(&hit, name) || !has_indicator(&hit, NEWS_INDICATORS) {
                continue;
            }
            record(&hit, UrlCategory::ExternalMention, &mut seen, &mut mentions);
        }
    }

    info!(found = mentions.len(), "mention search completed");
    Ok(mentions)
}

fn mentions_name(hit: &SearchHit, name: &str) -> bool {
    let needle = name.to_lowercase();
    hit.title.to_lowercase().contains(&needle) || hit.snippet.to_lowercase().contains(&needle)
}

fn has_indicator(hit: &SearchHit, indicators: &[&str]) -> bool {
    let haystack = format!("{} {} {}", hit.url, hit.title, hit.snippet).to_lowercase();
    indicators.iter().any(|ind| haystack.contains(ind))
}

fn record(
    hit: &SearchHit,
    category: UrlCategory,
    seen: &mut HashSet<String>,
    out: &mut Vec<DiscoveredUrl>,
) {
    let normalized = normalize(&hit.url);
    if !seen.insert(normalized.clone()) {
        return;
    }
    out.push(DiscoveredUrl {
        url: hit.url.clone(),
        normalized,
        depth: 0,
        category,
        origin: None,
        title: if hit.title.is_empty() {
            None
        } else {
            Some(hit.title.clone())
        },
    });
}
