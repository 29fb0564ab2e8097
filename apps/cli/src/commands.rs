//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use sitescout_core::{
    MetadataOracle, PipelineConfig, ProgressReporter, UrlAggregator, run_discovery, run_iterative,
};
use sitescout_crawler::{Crawler, FetchMode};
use sitescout_discovery::{
    HttpSearchProvider, LadderConfig, NameHeuristic, SearchHit, SearchProvider,
};
use sitescout_shared::{
    AppConfig, CrawlConfig, CrawlSummary, init_config, load_config, search_credentials,
};
use sitescout_worklist::WorklistStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SiteScout — discover and categorize every URL around a company.
#[derive(Parser)]
#[command(
    name = "sitescout",
    version,
    about = "Crawl a company website, find founders, and collect categorized URLs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run a full discovery crawl for one company website.
    Crawl {
        /// Company website URL (the crawl seed).
        url: String,

        /// Company name (defaults to the homepage title or hostname).
        #[arg(short, long)]
        company_name: Option<String>,

        /// Maximum pages to fetch.
        #[arg(long)]
        max_pages: Option<usize>,

        /// Maximum link depth from the seed.
        #[arg(long)]
        max_depth: Option<u32>,

        /// Extra skip words, comma-separated.
        #[arg(long, value_delimiter = ',')]
        skip_words: Vec<String>,

        /// Skip the external mention search.
        #[arg(long)]
        skip_external: bool,

        /// Skip the founder search ladder.
        #[arg(long)]
        skip_founder_search: bool,

        /// Skip the founder blog search.
        #[arg(long)]
        skip_founder_blogs: bool,

        /// Append discovered URLs to this plain-text file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Also record discovered URLs in this team's worklist.
        #[arg(long)]
        team_id: Option<String>,
    },

    /// Iteratively expand a team's worklist by one-level subpage discovery.
    Iterate {
        /// Team identifier (names the worklist file pair).
        #[arg(long)]
        team_id: String,

        /// Seed URLs to start from (optional when pending work exists).
        seeds: Vec<String>,

        /// Maximum iterations before stopping.
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Maximum total URLs before stopping.
        #[arg(long)]
        max_urls: Option<usize>,

        /// Worklist directory (defaults to the configured one).
        #[arg(long)]
        dir: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sitescout=info",
        1 => "sitescout=debug",
        _ => "sitescout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Crawl {
            url,
            company_name,
            max_pages,
            max_depth,
            skip_words,
            skip_external,
            skip_founder_search,
            skip_founder_blogs,
            output,
            json,
            team_id,
        } => {
            cmd_crawl(CrawlArgs {
                url,
                company_name,
                max_pages,
                max_depth,
                skip_words,
                skip_external,
                skip_founder_search,
                skip_founder_blogs,
                output,
                json,
                team_id,
            })
            .await
        }
        Command::Iterate {
            team_id,
            seeds,
            max_iterations,
            max_urls,
            dir,
        } => cmd_iterate(&team_id, &seeds, max_iterations, max_urls, dir.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// crawl
// ---------------------------------------------------------------------------

struct CrawlArgs {
    url: String,
    company_name: Option<String>,
    max_pages: Option<usize>,
    max_depth: Option<u32>,
    skip_words: Vec<String>,
    skip_external: bool,
    skip_founder_search: bool,
    skip_founder_blogs: bool,
    output: Option<PathBuf>,
    json: bool,
    team_id: Option<String>,
}

/// Search provider selected at startup: real endpoint when credentials
/// are present, otherwise a provider that finds nothing.
enum AnyProvider {
    Http(HttpSearchProvider),
    Null,
}

impl SearchProvider for AnyProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> sitescout_shared::Result<Vec<SearchHit>> {
        match self {
            Self::Http(provider) => provider.search(query, max_results).await,
            Self::Null => Ok(Vec::new()),
        }
    }
}

async fn cmd_crawl(args: CrawlArgs) -> Result<()> {
    let config = load_config()?;

    let seed = Url::parse(&args.url).map_err(|e| eyre!("invalid URL '{}': {e}", args.url))?;

    let mut crawl_config = CrawlConfig::from(&config);
    if let Some(max_pages) = args.max_pages {
        crawl_config.max_pages = max_pages;
    }
    if let Some(max_depth) = args.max_depth {
        crawl_config.max_depth = max_depth;
    }
    crawl_config.skip_words.extend(args.skip_words);

    let pipeline_config = PipelineConfig {
        crawl: crawl_config,
        ladder: LadderConfig {
            results_per_query: config.search.results_per_query,
            eager_extract_threshold: config.search.eager_extract_threshold,
        },
        results_per_query: config.search.results_per_query,
        skip_external: args.skip_external,
        skip_founder_search: args.skip_founder_search,
        skip_founder_blogs: args.skip_founder_blogs,
    };

    let provider = match search_credentials(&config) {
        Ok((api_key, engine_id)) => AnyProvider::Http(HttpSearchProvider::new(api_key, engine_id)?),
        Err(e) => {
            warn!(error = %e, "external search disabled");
            AnyProvider::Null
        }
    };

    let oracle = MetadataOracle {
        company_name: args.company_name,
    };

    info!(url = %seed, "starting discovery");

    let reporter = CliProgress::new();
    let report = run_discovery(
        &pipeline_config,
        &seed,
        &oracle,
        &provider,
        &NameHeuristic,
        &reporter,
    )
    .await?;

    let mut aggregator = UrlAggregator::new();
    aggregator.extend(report.urls.iter().cloned());

    if let Some(path) = &args.output {
        let appended = aggregator.write_simple_list(path)?;
        info!(appended, path = %path.display(), "URL list written");
    }

    if let Some(team_id) = &args.team_id {
        let store = WorklistStore::new(&config.iterate.worklist_dir)?;
        let normalized: Vec<String> = report.urls.iter().map(|u| u.normalized.clone()).collect();
        let added = store.append_master(team_id, &normalized)?;
        info!(%team_id, added, "worklist updated");
    }

    if args.json {
        println!("{}", aggregator.to_json_report(&report.summary)?);
        return Ok(());
    }

    let summary = &report.summary;
    println!();
    println!("  Discovery complete for {}", summary.company_name);
    println!("  Run:               {}", report.run_id);
    println!("  Unique URLs:       {}", summary.total_unique_urls);
    println!("  Company pages:     {}", summary.company_pages);
    println!("  Blog posts:        {}", summary.blog_posts);
    println!("  External mentions: {}", summary.external_mentions);
    println!("  Founder blogs:     {}", summary.founder_blogs);
    println!("  Failed fetches:    {}", summary.failed_fetches);
    if !report.founders.is_empty() {
        let names: Vec<&str> = report.founders.iter().map(|f| f.name.as_str()).collect();
        println!("  Founders:          {}", names.join(", "));
    }
    println!("  Time:              {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// iterate
// ---------------------------------------------------------------------------

async fn cmd_iterate(
    team_id: &str,
    seeds: &[String],
    max_iterations: Option<usize>,
    max_urls: Option<usize>,
    dir: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    let mut limits = config.iterate.clone();
    if let Some(max) = max_iterations {
        limits.max_iterations = max;
    }
    if let Some(max) = max_urls {
        limits.max_total_urls = max;
    }

    let worklist_dir = dir.unwrap_or(&limits.worklist_dir);
    let store = WorklistStore::new(worklist_dir)?;

    let crawl_config = CrawlConfig::from(&config);
    let concurrency = crawl_config.concurrency;
    // The orchestrator already fans each batch out on its own tasks;
    // cooperative fetching keeps that the single scheduling layer.
    let crawler = Crawler::new(crawl_config)?.with_mode(FetchMode::Cooperative);

    info!(team_id, seeds = seeds.len(), "starting iterative discovery");

    let reporter = CliProgress::new();
    let stats = run_iterative(
        &crawler,
        &store,
        team_id,
        seeds,
        &limits,
        concurrency,
        &reporter,
    )
    .await?;
    reporter.finish();

    println!();
    println!("  Iterative discovery for team '{team_id}'");
    println!("  Iterations:    {}", stats.iterations);
    println!("  URLs crawled:  {}", stats.total_processed);
    println!("  Master total:  {}", stats.total_urls);
    println!(
        "  Converged:     {}",
        if stats.converged { "yes" } else { "no (safety stop)" }
    );
    println!("  Worklist:      {}", store.master_path(team_id).display());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Progress reporter backed by an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn url_visited(&self, url: &str, fetched: usize, budget: usize) {
        self.spinner
            .set_message(format!("Crawling [{fetched}/{budget}] {url}"));
    }

    fn iteration(&self, number: usize, batch_size: usize, total_urls: usize) {
        self.spinner.set_message(format!(
            "Iteration {number}: {batch_size} crawled, {total_urls} total URLs"
        ));
    }

    fn done(&self, _summary: &CrawlSummary) {
        self.spinner.finish_and_clear();
    }
}
