//! Shared types, error model, and configuration for SiteScout.
//!
//! This crate is the foundation depended on by all other SiteScout crates.
//! It provides:
//! - [`SiteScoutError`] — the unified error type
//! - Domain types ([`DiscoveredUrl`], [`UrlCategory`], [`CrawlSummary`], [`RunId`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, DefaultsConfig, FilterConfig, IterateConfig, SearchConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
    search_credentials,
};
pub use error::{Result, SiteScoutError};
pub use types::{
    CompanyInfo, CrawlSummary, DiscoveredUrl, Founder, FounderSource, RunId, TaskStatus,
    UrlCategory,
};
