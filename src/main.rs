//! Binary entry point for the TuneFetch bot.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

mod app;
mod cli;
mod config;

use cli::Args;
use config::BotConfig;

fn main() -> Result<()> {
    // Missing .env is fine; the environment and flags still apply.
    let dotenv = dotenvy::dotenv();

    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!(error = %e, "no .env loaded"),
    }

    let config = match BotConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };
    debug!(?config, "configuration resolved");

    // One task per update, interleaved on a single thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::runtime::run_bot(config))
}
