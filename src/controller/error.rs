//! Error taxonomy of the conversation handlers.
//!
//! A handler returns a [`ControllerError`] when it cannot complete; the
//! controller turns it into a reply with [`ControllerError::user_message`] and
//! logs it at the level its class deserves. Per-track download failures are
//! not part of this enum: they are reported where they happen so a page
//! download keeps going.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::messenger::MessengerError;

/// Problems with what the user sent or the state it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("empty search query")]
    EmptyQuery,
    #[error("no search results to act on")]
    SessionExpired,
    #[error("track index {index} out of range")]
    InvalidSelection { index: usize },
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("no results for {query:?}")]
    NoResults { query: String },

    #[error("download cooldown active, {remaining_secs}s remaining")]
    RateLimited { remaining_secs: u64 },

    #[error("catalog search failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("chat transport failed: {0}")]
    Messenger(#[from] MessengerError),
}

impl ControllerError {
    /// Text sent back to the conversation.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(InvalidInput::EmptyQuery) => {
                "❗ Please provide a search term.".to_string()
            }
            Self::InvalidInput(InvalidInput::SessionExpired) => {
                "❗ Session expired. Please search again.".to_string()
            }
            Self::InvalidInput(InvalidInput::InvalidSelection { .. }) => {
                "❗ That track is no longer available. Please search again.".to_string()
            }
            Self::NoResults { .. } => "❌ No results found.".to_string(),
            Self::RateLimited { remaining_secs } => {
                format!("⏳ Please wait {remaining_secs} seconds before downloading again.")
            }
            Self::Catalog(_) => {
                "⚠️ Search is unavailable right now. Please try again later.".to_string()
            }
            Self::Messenger(_) => "⚠️ Something went wrong. Please try again.".to_string(),
        }
    }

    /// Upstream failures are operational problems; everything else is routine.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::Messenger(_))
    }
}
