//! Chat transport capability.
//!
//! The conversation layer only talks to the chat through the [`Messenger`]
//! trait. [`TelegramMessenger`] implements it over the Telegram Bot API; tests
//! substitute an in-memory recorder.

pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::download::AudioArtifact;
use crate::session::{ConversationId, MessageId};

pub use telegram::TelegramMessenger;

/// One inline button: visible label plus opaque callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    #[must_use]
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Appends a row; empty rows are skipped.
    pub fn push_row(&mut self, row: Vec<InlineButton>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    /// All buttons in display order.
    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

/// Errors from the chat transport.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// The request never got an answer (DNS, TLS, connection reset, timeout).
    #[error("transport error calling {method}: {source}")]
    Transport {
        /// API method being called.
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered but rejected the call.
    #[error("{method} rejected: {description}")]
    Api {
        /// API method being called.
        method: &'static str,
        /// Error description returned by the API.
        description: String,
    },

    /// The API answer could not be decoded.
    #[error("invalid response to {method}: {reason}")]
    InvalidResponse {
        /// API method being called.
        method: &'static str,
        reason: String,
    },
}

impl MessengerError {
    pub fn transport(method: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { method, source }
    }

    pub fn api(method: &'static str, description: impl Into<String>) -> Self {
        Self::Api {
            method,
            description: description.into(),
        }
    }

    pub fn invalid_response(method: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            method,
            reason: reason.into(),
        }
    }
}

/// Chat transport operations used by the bot.
///
/// Text is sent with Markdown formatting. Every call can fail; callers decide
/// whether a failure is cosmetic (log and move on) or worth an apology.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a text message, optionally with an inline keyboard.
    async fn send_message(
        &self,
        conversation: ConversationId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, MessengerError>;

    /// Sends a photo by URL with a caption.
    async fn send_photo(
        &self,
        conversation: ConversationId,
        photo_url: &str,
        caption: &str,
    ) -> Result<MessageId, MessengerError>;

    /// Uploads an audio file.
    async fn send_audio(
        &self,
        conversation: ConversationId,
        audio: &AudioArtifact,
        caption: &str,
    ) -> Result<MessageId, MessengerError>;

    /// Replaces the text of an existing message (and drops its keyboard).
    async fn edit_message_text(
        &self,
        conversation: ConversationId,
        message: MessageId,
        text: &str,
    ) -> Result<(), MessengerError>;

    async fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), MessengerError>;

    /// Acknowledges a button press so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessengerError>;

    /// Shows the "typing…" indicator.
    async fn send_typing(&self, conversation: ConversationId) -> Result<(), MessengerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_skips_empty_rows() {
        let mut keyboard = InlineKeyboard::default();
        keyboard.push_row(vec![]);
        keyboard.push_row(vec![InlineButton::new("a", "x")]);
        assert_eq!(keyboard.rows.len(), 1);
        assert_eq!(keyboard.buttons().count(), 1);
    }

    #[test]
    fn test_api_error_display() {
        let err = MessengerError::api("deleteMessage", "Bad Request: message to delete not found");
        let msg = err.to_string();
        assert!(msg.contains("deleteMessage"), "got: {msg}");
        assert!(msg.contains("not found"), "got: {msg}");
    }
}
