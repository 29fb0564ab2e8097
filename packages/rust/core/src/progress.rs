//! Progress reporting contract.
//!
//! The core emits progress events; how they reach a user (terminal
//! spinner, polling UI) is the caller's concern.

use sitescout_shared::CrawlSummary;

/// Progress callback for discovery runs.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page fetch during the crawl.
    fn url_visited(&self, url: &str, fetched: usize, budget: usize);
    /// Called after each iteration of the worklist orchestrator.
    fn iteration(&self, number: usize, batch_size: usize, total_urls: usize);
    /// Called when a run completes.
    fn done(&self, summary: &CrawlSummary);
}

/// No-op reporter for headless and test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn url_visited(&self, _url: &str, _fetched: usize, _budget: usize) {}
    fn iteration(&self, _number: usize, _batch_size: usize, _total_urls: usize) {}
    fn done(&self, _summary: &CrawlSummary) {}
}
