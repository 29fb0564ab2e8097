//! Application configuration for SiteScout.
//!
//! User config lives at `~/.sitescout/sitescout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitescout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitescout";

// ---------------------------------------------------------------------------
// Config structs (matching sitescout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Crawl defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// External search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// URL filtering.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Iterative discovery settings.
    #[serde(default)]
    pub iterate: IterateConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum pages to visit per crawl run.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum crawl depth from the seed.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum concurrent HTTP requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Minimum ms between requests to the same host.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            concurrency: default_concurrency(),
            rate_limit_ms: default_rate_limit(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_pages() -> usize {
    50
}
fn default_max_depth() -> u32 {
    3
}
fn default_concurrency() -> usize {
    4
}
fn default_rate_limit() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the search API key (never the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Name of the env var holding the search engine id.
    #[serde(default = "default_engine_id_env")]
    pub engine_id_env: String,

    /// Results requested per individual search query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Accumulated-result count at which founder extraction is attempted
    /// before issuing further queries. Inherited from the original
    /// system without a documented tuning rationale; kept configurable.
    #[serde(default = "default_eager_threshold")]
    pub eager_extract_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            engine_id_env: default_engine_id_env(),
            results_per_query: default_results_per_query(),
            eager_extract_threshold: default_eager_threshold(),
        }
    }
}

fn default_api_key_env() -> String {
    "SEARCH_API_KEY".into()
}
fn default_engine_id_env() -> String {
    "SEARCH_ENGINE_ID".into()
}
fn default_results_per_query() -> usize {
    5
}
fn default_eager_threshold() -> usize {
    10
}

/// `[filter]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Additional skip words merged with the built-in defaults.
    #[serde(default)]
    pub skip_words: Vec<String>,
}

/// `[iterate]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterateConfig {
    /// Hard stop on iteration count, for pathological link graphs.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Hard stop on cumulative processed URLs.
    #[serde(default = "default_max_total_urls")]
    pub max_total_urls: usize,

    /// Directory holding the per-team worklist files.
    #[serde(default = "default_worklist_dir")]
    pub worklist_dir: String,
}

impl Default for IterateConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_total_urls: default_max_total_urls(),
            worklist_dir: default_worklist_dir(),
        }
    }
}

fn default_max_iterations() -> usize {
    10
}
fn default_max_total_urls() -> usize {
    1000
}
fn default_worklist_dir() -> String {
    "data/scrapped_urls".into()
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration — merged from config file + CLI flags,
/// passed into each component at construction rather than read from
/// ambient global state.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum pages to visit.
    pub max_pages: usize,
    /// Maximum crawl depth from the seed.
    pub max_depth: u32,
    /// Maximum concurrent HTTP requests.
    pub concurrency: usize,
    /// Rate limit in ms between requests.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Run-supplied skip words (merged with defaults by the filter).
    pub skip_words: Vec<String>,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_pages: config.defaults.max_pages,
            max_depth: config.defaults.max_depth,
            concurrency: config.defaults.concurrency,
            rate_limit_ms: config.defaults.rate_limit_ms,
            request_timeout_secs: config.defaults.request_timeout_secs,
            skip_words: config.filter.skip_words.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitescout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SiteScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitescout/sitescout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SiteScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SiteScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SiteScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the search API credentials are present in the environment.
/// External search is optional; callers degrade gracefully when this fails.
pub fn search_credentials(config: &AppConfig) -> Result<(String, String)> {
    let key = std::env::var(&config.search.api_key_env)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            SiteScoutError::config(format!(
                "search API key not found. Set the {} environment variable.",
                config.search.api_key_env
            ))
        })?;

    let engine = std::env::var(&config.search.engine_id_env)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            SiteScoutError::config(format!(
                "search engine id not found. Set the {} environment variable.",
                config.search.engine_id_env
            ))
        })?;

    Ok((key, engine))
}
