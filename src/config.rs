//! Validated runtime configuration built from CLI arguments.

use std::time::Duration;

use thiserror::Error;
use tunefetch_core::{ControllerSettings, DownloaderConfig};

use crate::cli::Args;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not set (pass --{flag} or set {env})")]
    Missing {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
    },
}

/// Everything the bot needs to start.
#[derive(Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub downloader: DownloaderConfig,
    pub controller: ControllerSettings,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("downloader", &self.downloader)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    /// Validates credentials and applies timeouts from `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an absent or blank credential.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let bot_token = required(args.bot_token.as_deref(), "bot token", "bot-token", "BOT_TOKEN")?;
        let spotify_client_id = required(
            args.spotify_client_id.as_deref(),
            "Spotify client id",
            "spotify-client-id",
            "SPOTIFY_CLIENT_ID",
        )?;
        let spotify_client_secret = required(
            args.spotify_client_secret.as_deref(),
            "Spotify client secret",
            "spotify-client-secret",
            "SPOTIFY_CLIENT_SECRET",
        )?;

        let downloader = DownloaderConfig {
            program: args.downloader.clone(),
            startup_timeout: Duration::from_secs(args.startup_timeout_secs),
            completion_timeout: Duration::from_secs(args.completion_timeout_secs),
            ..DownloaderConfig::default()
        };

        Ok(Self {
            bot_token,
            spotify_client_id,
            spotify_client_secret,
            downloader,
            controller: ControllerSettings::default(),
        })
    }
}

fn required(
    value: Option<&str>,
    name: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::Missing { name, flag, env }),
    }
}
