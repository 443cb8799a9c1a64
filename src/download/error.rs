//! Error types for the download module.
//!
//! Every way a single track download can end without an artifact is one
//! [`DownloadFailure`] variant. None of them is retried; each maps to its own
//! user-facing message via [`DownloadFailure::user_message`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::constants::MAX_DIAGNOSTIC_CHARS;

/// Reasons a download produced no deliverable artifact.
#[derive(Debug, Error)]
pub enum DownloadFailure {
    /// The download tool could not be spawned at all (missing binary, permissions).
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that was being launched.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Process creation did not finish within the startup bound.
    #[error("download tool did not start within {}s", timeout.as_secs())]
    StartupTimeout {
        /// The startup bound that elapsed.
        timeout: Duration,
    },

    /// The process ran past the completion bound and was killed.
    #[error("download of {url} timed out after {}s", timeout.as_secs())]
    ExecutionTimeout {
        /// Source URL being downloaded.
        url: String,
        /// The completion bound that elapsed.
        timeout: Duration,
    },

    /// The tool exited with a non-zero status.
    #[error("download tool exited with {status}: {stderr}")]
    ToolFailure {
        /// Exit status description (`"exit status: 1"`, `"signal: 9"`, ...).
        status: String,
        /// Captured error stream, already bounded.
        stderr: String,
    },

    /// The tool reported success but wrote no audio file.
    #[error("download tool succeeded but no .{extension} file was found")]
    ArtifactMissing {
        /// Extension that was searched for.
        extension: String,
    },

    /// File system error around the scratch directory or the artifact.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadFailure {
    /// Creates a launch error.
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }

    /// Creates a tool failure, bounding the diagnostic text.
    pub fn tool_failure(status: impl Into<String>, stderr: &str) -> Self {
        Self::ToolFailure {
            status: status.into(),
            stderr: truncate_diagnostic(stderr.trim(), MAX_DIAGNOSTIC_CHARS),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Message shown to the chat user. Distinct per failure class.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Launch { .. } => "❌ The download tool could not be started.".to_string(),
            Self::StartupTimeout { .. } => "❌ Download setup timed out.".to_string(),
            Self::ExecutionTimeout { timeout, .. } => {
                format!("❌ Download timed out after {} seconds.", timeout.as_secs())
            }
            Self::ToolFailure { stderr, .. } => {
                // Backticks inside the diagnostic would break the code span.
                format!("❌ Download failed:\n`{}`", stderr.replace('`', "'"))
            }
            Self::ArtifactMissing { extension } => format!(
                "❌ Download failed. No {} file found.",
                extension.to_uppercase()
            ),
            Self::Io { .. } => "❌ Download failed while reading the audio file.".to_string(),
        }
    }
}

/// Truncates `text` to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_diagnostic(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}…", &text[..byte_index]),
        None => text.to_string(),
    }
}
