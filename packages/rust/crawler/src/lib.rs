//! Crawler engine: URL normalization, skip-word filtering, and bounded
//! breadth-first traversal of a company website.

pub mod engine;
pub mod executor;
pub mod filter;
pub mod normalize;

pub use engine::{BLOG_KEYWORDS, CrawlOutcome, CrawledPage, Crawler};
pub use executor::{FetchExecutor, FetchMode, FetchOutcome, FetchedDocument};
pub use filter::{DEFAULT_SKIP_WORDS, SkipFilter};
pub use normalize::{host_of, normalize, same_domain};
