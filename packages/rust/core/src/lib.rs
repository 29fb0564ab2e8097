//! Core orchestration: single-run discovery pipeline, URL aggregation,
//! and the iterative worklist orchestrator.

pub mod aggregator;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;

pub use aggregator::{JsonReport, UrlAggregator};
pub use orchestrator::{IterationStats, run_iterative};
pub use pipeline::{
    CompanyOracle, DiscoveryReport, MetadataOracle, PipelineConfig, run_discovery,
};
pub use progress::{ProgressReporter, SilentProgress};
