//! TuneFetch Core Library
//!
//! A chat bot that searches a music catalog, shows results as paginated
//! inline keyboards, and downloads selected tracks as MP3 with an external
//! command-line tool.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`session`] - Per-conversation state and pagination
//! - [`download`] - Cooldown limiter and the subprocess download pipeline
//! - [`messenger`] - Chat transport abstraction and the Telegram Bot API client
//! - [`catalog`] - Track search abstraction and the Spotify Web API client
//! - [`scheduler`] - Delayed deletion of transient messages
//! - [`controller`] - Event handlers composing all of the above

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod controller;
pub mod download;
pub mod messenger;
pub mod scheduler;
pub mod session;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogSearch, SpotifyCatalog};
pub use controller::{
    BotCommand, ControllerError, ControllerSettings, ConversationController, EventHook,
    InboundEvent, TypingIndicator,
};
pub use download::{
    AudioArtifact, CooldownLimiter, DownloadFailure, DownloadOrchestrator, DownloaderConfig,
    Reservation, TrackDownloader,
};
pub use messenger::{InlineButton, InlineKeyboard, Messenger, MessengerError};
pub use scheduler::{EphemeralMessageScheduler, MESSAGE_TTL};
pub use session::{ConversationId, MessageId, Paginator, SessionStore, Track};
