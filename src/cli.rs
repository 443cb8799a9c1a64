//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use tunefetch_core::download::DEFAULT_DOWNLOADER_PROGRAM;

/// Telegram bot that searches Spotify and downloads tracks as MP3.
///
/// Credentials are read from flags or the environment; a `.env` file in the
/// working directory is loaded first.
#[derive(Parser, Debug)]
#[command(name = "tunefetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Spotify application client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    /// Spotify application client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    /// Download tool to invoke
    #[arg(long, env = "TUNEFETCH_DOWNLOADER", default_value = DEFAULT_DOWNLOADER_PROGRAM)]
    pub downloader: PathBuf,

    /// Seconds allowed for starting the download tool (1-60)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=60))]
    pub startup_timeout_secs: u64,

    /// Seconds allowed for one download to finish (1-3600)
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub completion_timeout_secs: u64,
}
