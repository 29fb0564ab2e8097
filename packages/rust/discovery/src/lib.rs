//! Founder and mention discovery.
//!
//! Search-provider abstraction, founder name extraction, the
//! early-termination founder search ladder, and off-site searches for
//! founder blogs and company mentions.

pub mod extract;
pub mod ladder;
pub mod mentions;
pub mod search;

pub use extract::{FOUNDER_KEYWORDS, FounderExtractor, NameHeuristic};
pub use ladder::{FounderSearch, LadderConfig, LadderOutcome, SearchState};
pub use mentions::{search_company_mentions, search_founder_blogs};
pub use search::{HttpSearchProvider, SearchHit, SearchProvider};
