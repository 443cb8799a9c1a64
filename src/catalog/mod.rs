//! Music catalog search capability.
//!
//! - [`CatalogSearch`] - async trait the conversation layer depends on
//! - [`SpotifyCatalog`] - implementation over the Spotify Web API
//! - [`CatalogError`] - search failures

pub mod spotify;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::Track;

pub use spotify::SpotifyCatalog;

/// Maximum number of tracks requested per search.
pub const SEARCH_LIMIT: usize = 50;

/// Errors from a catalog search.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Obtaining or refreshing API credentials failed.
    #[error("catalog authentication failed: {reason}")]
    Auth {
        /// What went wrong.
        reason: String,
    },

    /// Network-level failure.
    #[error("network error searching catalog: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },

    /// The catalog answered with an error status.
    #[error("catalog returned HTTP {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The answer could not be decoded.
    #[error("invalid catalog response: {reason}")]
    InvalidResponse {
        reason: String,
    },
}

impl CatalogError {
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network { source }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// Query → ranked tracks.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Searches for tracks matching `query`, at most `limit` of them, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError>;
}
