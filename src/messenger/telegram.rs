//! Telegram Bot API transport.
//!
//! Every method is a JSON `POST` to `{base}/bot{token}/{method}` answered with
//! the `{ok, result, description}` envelope; audio uploads go as multipart.
//! Inbound traffic is fetched with long-polling `getUpdates` and converted to
//! [`InboundEvent`]s by [`Update::into_event`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument, trace};

use super::{InlineKeyboard, Messenger, MessengerError};
use crate::controller::{BotCommand, InboundEvent};
use crate::download::AudioArtifact;
use crate::session::{ConversationId, MessageId};

/// Default Bot API base URL.
const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Long-poll window requested from `getUpdates`.
pub const LONG_POLL_SECS: u64 = 30;

/// Total request bound; must exceed the long-poll window.
const REQUEST_TIMEOUT_SECS: u64 = LONG_POLL_SECS + 60;

const PARSE_MODE: &str = "Markdown";

// ==================== Bot API wire types ====================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// One entry of a `getUpdates` answer.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

impl Update {
    /// Converts the update into an event the controller understands.
    ///
    /// Returns `None` for traffic the bot ignores: non-text messages, unknown
    /// slash commands, and button presses detached from a chat message.
    #[must_use]
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(callback) = self.callback_query {
            let message = callback.message?;
            return Some(InboundEvent::Callback {
                conversation: ConversationId(message.chat.id),
                callback_id: callback.id,
                message: MessageId(message.message_id),
                data: callback.data?,
            });
        }

        let message = self.message?;
        let conversation = ConversationId(message.chat.id);
        let text = message.text?;
        if text.trim_start().starts_with('/') {
            let command = BotCommand::parse(&text)?;
            return Some(InboundEvent::Command {
                conversation,
                command,
            });
        }
        Some(InboundEvent::Text { conversation, text })
    }
}

// ==================== TelegramMessenger ====================

/// [`Messenger`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramMessenger {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramMessenger")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TelegramMessenger {
    /// Creates a messenger for the public Bot API.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError`] if HTTP client construction fails.
    pub fn new(token: impl Into<String>) -> Result<Self, MessengerError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Creates a messenger with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError`] if HTTP client construction fails.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, MessengerError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| MessengerError::transport("client", e))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &Value,
    ) -> Result<T, MessengerError> {
        trace!(method, "calling Bot API");
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| MessengerError::transport(method, e))?;
        decode(method, response).await
    }

    /// Long-polls for new updates starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError`] on transport or API failure.
    #[instrument(skip(self))]
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, MessengerError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;
        debug!(count = updates.len(), "received updates");
        Ok(updates)
    }
}

async fn decode<T: DeserializeOwned>(
    method: &'static str,
    response: reqwest::Response,
) -> Result<T, MessengerError> {
    let status = response.status();
    let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
        MessengerError::invalid_response(method, format!("HTTP {status}: {e}"))
    })?;

    if !envelope.ok {
        let description = envelope
            .description
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(MessengerError::api(method, description));
    }
    envelope
        .result
        .ok_or_else(|| MessengerError::invalid_response(method, "missing result"))
}

fn keyboard_markup(keyboard: &InlineKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.text, "callback_data": b.callback_data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(
        &self,
        conversation: ConversationId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, MessengerError> {
        let mut body = json!({
            "chat_id": conversation.0,
            "text": text,
            "parse_mode": PARSE_MODE,
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = keyboard_markup(keyboard);
        }
        let sent: SentMessage = self.call("sendMessage", &body).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn send_photo(
        &self,
        conversation: ConversationId,
        photo_url: &str,
        caption: &str,
    ) -> Result<MessageId, MessengerError> {
        let body = json!({
            "chat_id": conversation.0,
            "photo": photo_url,
            "caption": caption,
            "parse_mode": PARSE_MODE,
        });
        let sent: SentMessage = self.call("sendPhoto", &body).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn send_audio(
        &self,
        conversation: ConversationId,
        audio: &AudioArtifact,
        caption: &str,
    ) -> Result<MessageId, MessengerError> {
        const METHOD: &str = "sendAudio";
        let part = Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name.clone())
            .mime_str("audio/mpeg")
            .map_err(|e| MessengerError::transport(METHOD, e))?;
        let form = Form::new()
            .text("chat_id", conversation.to_string())
            .text("title", audio.title.clone())
            .text("performer", audio.performer.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", PARSE_MODE)
            .part("audio", part);

        let response = self
            .client
            .post(self.method_url(METHOD))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MessengerError::transport(METHOD, e))?;
        let sent: SentMessage = decode(METHOD, response).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn edit_message_text(
        &self,
        conversation: ConversationId,
        message: MessageId,
        text: &str,
    ) -> Result<(), MessengerError> {
        let body = json!({
            "chat_id": conversation.0,
            "message_id": message.0,
            "text": text,
            "parse_mode": PARSE_MODE,
        });
        // Result is the edited message or `true`; neither is needed.
        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), MessengerError> {
        let body = json!({ "chat_id": conversation.0, "message_id": message.0 });
        let _: bool = self.call("deleteMessage", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessengerError> {
        let body = json!({ "callback_query_id": callback_id });
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn send_typing(&self, conversation: ConversationId) -> Result<(), MessengerError> {
        let body = json!({ "chat_id": conversation.0, "action": "typing" });
        let _: bool = self.call("sendChatAction", &body).await?;
        Ok(())
    }
}
