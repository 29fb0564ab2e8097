//! SiteScout CLI — company URL discovery tool.
//!
//! Crawls a company website, categorizes every URL it finds, searches
//! for founders and external coverage, and maintains iterative worklists
//! for team-scale URL collection.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
