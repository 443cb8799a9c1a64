//! Constants for the download module (timeouts, cooldown, output matching).

use std::time::Duration;

/// Minimum interval between two downloads reserved by one conversation.
pub const DOWNLOAD_COOLDOWN: Duration = Duration::from_secs(30);

/// Bound on creating the download subprocess.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on the download subprocess running to completion.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default download tool.
pub const DEFAULT_DOWNLOADER_PROGRAM: &str = "spotdl";

/// Extension of the files the download tool writes.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Longest tool diagnostic (in characters) carried into a user-facing message.
pub const MAX_DIAGNOSTIC_CHARS: usize = 1000;
