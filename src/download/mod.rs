//! Track downloads through an external download tool.
//!
//! This module provides the download side of the bot:
//!
//! - [`CooldownLimiter`] - per-conversation cooldown gate with check-and-set
//! - [`DownloadOrchestrator`] - runs the tool with separate startup and
//!   completion timeouts and loads the produced audio
//! - [`DownloadFailure`] - one variant per failure class, each with its own
//!   user-facing message
//! - [`TrackDownloader`] - the trait seam the conversation layer depends on

mod artifact;
mod constants;
mod error;
mod orchestrator;
pub mod rate_limiter;

pub use artifact::{AudioArtifact, find_audio_file};
pub use constants::{
    AUDIO_EXTENSION, COMPLETION_TIMEOUT, DEFAULT_DOWNLOADER_PROGRAM, DOWNLOAD_COOLDOWN,
    MAX_DIAGNOSTIC_CHARS, STARTUP_TIMEOUT,
};
pub use error::{DownloadFailure, truncate_diagnostic};
pub use orchestrator::{DownloadOrchestrator, DownloaderConfig, TrackDownloader};
pub use rate_limiter::{CooldownLimiter, Reservation};

// Note: no module-local Result alias. Use `Result<T, DownloadFailure>` explicitly.
