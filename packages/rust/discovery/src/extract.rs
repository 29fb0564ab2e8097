//! Founder name extraction.
//!
//! The high-quality extractor is an external collaborator (an LLM-backed
//! service) consumed through the `FounderExtractor` seam. `NameHeuristic`
//! is the built-in fallback: capitalized-bigram name detection in text
//! that mentions founder-indicative keywords.

use std::sync::OnceLock;

use regex::Regex;
use sitescout_shared::Result;

/// Words that mark surrounding text as founder-relevant.
pub const FOUNDER_KEYWORDS: &[&str] = &[
    "founder",
    "co-founder",
    "cofounder",
    "founded by",
    "started by",
    "created by",
    "ceo",
];

/// Upper bound on candidate names returned per extraction.
const MAX_CANDIDATES: usize = 10;

/// Extracts founder names from free text (page bodies, search snippets).
pub trait FounderExtractor {
    fn extract_founders(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

impl<T: FounderExtractor + Sync> FounderExtractor for &T {
    fn extract_founders(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<String>>> + Send {
        (**self).extract_founders(texts)
    }
}

// ---------------------------------------------------------------------------
// NameHeuristic
// ---------------------------------------------------------------------------

/// Capitalized-bigram heuristic extractor.
///
/// A text contributes candidates only when it contains a founder keyword;
/// candidates are `First Last` pairs of capitalized words, with common
/// sentence-initial false positives filtered out. Capped at ten names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameHeuristic;

/// First words that make a capitalized bigram a non-name.
const NON_NAME_STARTERS: &[&str] = &[
    "The", "Our", "About", "Meet", "Contact", "Why", "How", "What", "When", "Join", "Learn",
    "Read", "More", "New", "Get", "See", "Chief", "Senior", "Vice",
];

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([A-Z][a-z]+)\s+([A-Z][a-z]+)\b").unwrap()
    })
}

impl NameHeuristic {
    /// Synchronous scan of one text. Returns nothing when no founder
    /// keyword is present.
    pub fn scan(text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        if !FOUNDER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return Vec::new();
        }

        let mut names = Vec::new();
        for caps in name_pattern().captures_iter(text) {
            let first = &caps[1];
            let last = &caps[2];
            if NON_NAME_STARTERS.contains(&first) || NON_NAME_STARTERS.contains(&last) {
                continue;
            }
            let name = format!("{first} {last}");
            if !names.contains(&name) {
                names.push(name);
            }
            if names.len() >= MAX_CANDIDATES {
                break;
            }
        }
        names
    }
}

impl FounderExtractor for NameHeuristic {
    async fn extract_founders(&self, texts: &[String]) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for text in texts {
            for name in Self::scan(text) {
                if !names.contains(&name) {
                    names.push(name);
                }
                if names.len() >= MAX_CANDIDATES {
                    return Ok(names);
                }
            }
        }
        Ok(names)
    }
}
