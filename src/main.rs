use anyhow::Result;
use clap::Parser;

mod cli;
mod config;

use cli::Cli;

/// Main entry point for the expense tracker.
#[tokio::main]
async fn main() -> Result<()> {
    // Load `.env` before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    model::init_tracing(config::DEFAULT_LOG_FILTER);

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}
