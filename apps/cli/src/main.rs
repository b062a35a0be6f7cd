//! cardtrack CLI: card catalog scraping, merge, and enrichment.
//!
//! Crawls expansions from the marketplace catalog into a persisted dataset
//! and patches tournament usage and price trends onto selected rows.

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
