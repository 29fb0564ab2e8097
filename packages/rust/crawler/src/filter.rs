//! Skip-word filtering for off-domain URLs.
//!
//! External links whose host contains a generic-platform word (social
//! networks, marketplaces, search engines, ...) are dropped from the
//! results. A word is exempted when it is a substring of the company's
//! own name or domain, so a company literally named after a platform is
//! not filtered out of its own results.

use crate::normalize::host_of;

/// Built-in skip words, always active. Run-supplied words extend this set.
pub const DEFAULT_SKIP_WORDS: &[&str] = &[
    // Social
    "facebook",
    "twitter",
    "instagram",
    "linkedin",
    "youtube",
    "tiktok",
    "pinterest",
    "snapchat",
    "reddit",
    "tumblr",
    "threads",
    "mastodon",
    // Communication
    "whatsapp",
    "telegram",
    "discord",
    "slack",
    "zoom",
    "skype",
    // E-commerce
    "amazon",
    "ebay",
    "etsy",
    "shopify",
    "aliexpress",
    "walmart",
    // Reviews
    "yelp",
    "trustpilot",
    "glassdoor",
    "tripadvisor",
    "capterra",
    "g2crowd",
    // Search engines
    "google",
    "bing",
    "yahoo",
    "duckduckgo",
    "baidu",
    // Knowledge bases
    "wikipedia",
    "wikihow",
    "quora",
    "stackoverflow",
    "stackexchange",
    "fandom",
    // Tech platforms
    "github",
    "gitlab",
    "bitbucket",
    "wordpress",
    "blogspot",
    "wix",
    "squarespace",
    "godaddy",
    "mailchimp",
    "eventbrite",
    "meetup",
    "producthunt",
    "apple",
    "microsoft",
];

/// Decides whether an off-domain URL should be excluded from results.
///
/// Same-domain URLs are never passed through this filter; the crawl
/// engine only consults it for external links.
#[derive(Debug, Clone)]
pub struct SkipFilter {
    words: Vec<String>,
}

impl SkipFilter {
    /// Build a filter from the default set plus run-supplied extras.
    /// Words are lowercased; duplicates are dropped.
    pub fn new(extra_words: &[String]) -> Self {
        let mut words: Vec<String> = DEFAULT_SKIP_WORDS
            .iter()
            .map(|w| w.to_string())
            .collect();

        for word in extra_words {
            let lower = word.to_ascii_lowercase();
            if !lower.is_empty() && !words.contains(&lower) {
                words.push(lower);
            }
        }

        Self { words }
    }

    /// True iff some skip word appears in the URL's host AND that word
    /// is not part of the company name or company domain.
    pub fn should_skip(&self, url: &str, company_name: &str, company_domain: &str) -> bool {
        let Some(host) = host_of(url) else {
            // Unparsable external URLs carry no host to match against.
            return false;
        };

        let name_lower = company_name.to_ascii_lowercase();
        let domain_lower = company_domain.to_ascii_lowercase();

        for word in &self.words {
            if !host.contains(word.as_str()) {
                continue;
            }
            // Exemption: the word belongs to the company itself.
            if name_lower.contains(word.as_str()) || domain_lower.contains(word.as_str()) {
                continue;
            }
            return true;
        }

        false
    }

    /// Number of active skip words (defaults + extras).
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when no words are active. Cannot happen with defaults, but
    /// keeps the `len`/`is_empty` pair honest.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for SkipFilter {
    fn default() -> Self {
        Self::new(&[])
    }
}
