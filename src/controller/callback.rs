//! Inline-button payloads.

use std::fmt;
use std::str::FromStr;

const PREVIOUS_PAGE: &str = "prev_page";
const NEXT_PAGE: &str = "next_page";
const DOWNLOAD_PAGE: &str = "download_page";
const TRACK_PREFIX: &str = "track_";

/// What a pressed button asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    PreviousPage,
    NextPage,
    /// Absolute index into the session's results.
    Track(usize),
    DownloadPage,
}

/// Callback payload the bot did not produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized callback data: {0}")]
pub struct UnknownCallback(pub String);

impl FromStr for CallbackAction {
    type Err = UnknownCallback;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            PREVIOUS_PAGE => Ok(Self::PreviousPage),
            NEXT_PAGE => Ok(Self::NextPage),
            DOWNLOAD_PAGE => Ok(Self::DownloadPage),
            _ => data
                .strip_prefix(TRACK_PREFIX)
                .and_then(|index| index.parse().ok())
                .map(Self::Track)
                .ok_or_else(|| UnknownCallback(data.to_string())),
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreviousPage => f.write_str(PREVIOUS_PAGE),
            Self::NextPage => f.write_str(NEXT_PAGE),
            Self::DownloadPage => f.write_str(DOWNLOAD_PAGE),
            Self::Track(index) => write!(f, "{TRACK_PREFIX}{index}"),
        }
    }
}
