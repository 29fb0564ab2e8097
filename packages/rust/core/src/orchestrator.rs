//! Iterative worklist-driven subpage discovery.
//!
//! Each iteration crawls one level of subpages from the current batch,
//! diffs the discoveries against the master list, commits the new URLs,
//! and uses them as the next batch. The loop converges when an iteration
//! discovers nothing new; `max_iterations` and `max_total_urls` are the
//! safety stops for pathological sites.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use sitescout_crawler::{Crawler, normalize};
use sitescout_shared::{IterateConfig, Result};
use sitescout_worklist::WorklistStore;

use crate::progress::ProgressReporter;

/// Outcome of an iterative discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationStats {
    /// Iterations executed.
    pub iterations: usize,
    /// URLs crawled for subpages across all iterations.
    pub total_processed: usize,
    /// Size of the master list after the run.
    pub total_urls: usize,
    /// True when the run ended with an empty diff rather than a safety
    /// stop.
    pub converged: bool,
}

/// Run iterative subpage discovery for one team's worklist.
///
/// Seeds are normalized and merged with any pending URLs recovered from
/// an interrupted previous run.
#[instrument(skip_all, fields(team_id = %team_id, seeds = seeds.len()))]
pub async fn run_iterative(
    crawler: &Crawler,
    store: &WorklistStore,
    team_id: &str,
    seeds: &[String],
    limits: &IterateConfig,
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> Result<IterationStats> {
    let mut master: HashSet<String> = store.load_master(team_id)?.into_iter().collect();

    // First batch: fresh seeds plus work recovered from a crash window.
    let mut batch: Vec<String> = Vec::new();
    for seed in seeds {
        let normalized = normalize(seed.trim());
        if !master.contains(&normalized) && !batch.contains(&normalized) {
            batch.push(normalized);
        }
    }
    for url in store.recover_pending(team_id)? {
        if !master.contains(&url) && !batch.contains(&url) {
            batch.push(url);
        }
    }
    store.commit(team_id, &batch)?;
    master.extend(batch.iter().cloned());

    let mut iterations = 0usize;
    let mut total_processed = 0usize;
    let mut converged = false;

    info!(batch = batch.len(), master = master.len(), "starting iterative discovery");

    while !batch.is_empty() {
        if iterations >= limits.max_iterations {
            warn!(iterations, "iteration limit reached, stopping");
            break;
        }
        if master.len() >= limits.max_total_urls {
            warn!(total = master.len(), "URL limit reached, stopping");
            break;
        }
        iterations += 1;

        // One level of subpage discovery for every URL in the batch.
        let results: Vec<(String, Result<Vec<String>>)> = stream::iter(batch.iter().cloned())
            .map(|url| async move {
                let found = crawler.discover_subpages(&url).await;
                (url, found)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
        total_processed += batch.len();

        let mut pending: Vec<String> = Vec::new();
        let mut pending_seen: HashSet<String> = HashSet::new();
        for (url, found) in results {
            match found {
                Ok(subpages) => {
                    for sub in subpages {
                        if pending_seen.insert(sub.clone()) {
                            pending.push(sub);
                        }
                    }
                }
                Err(e) => {
                    warn!(%url, error = %e, "subpage discovery failed");
                }
            }
        }

        store.write_pending(team_id, &pending)?;

        let new_urls: Vec<String> = pending
            .into_iter()
            .filter(|url| !master.contains(url))
            .collect();

        store.commit(team_id, &new_urls)?;
        master.extend(new_urls.iter().cloned());

        progress.iteration(iterations, batch.len(), master.len());
        info!(
            iteration = iterations,
            batch = batch.len(),
            new = new_urls.len(),
            total = master.len(),
            "iteration complete"
        );

        if new_urls.is_empty() {
            converged = true;
            break;
        }
        batch = new_urls;
    }

    if batch.is_empty() {
        converged = true;
    }

    let stats = IterationStats {
        iterations,
        total_processed,
        total_urls: master.len(),
        converged,
    };
    info!(?stats, "iterative discovery finished");
    Ok(stats)
}
