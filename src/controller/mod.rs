//! Conversation handlers: search, paginate, select-one, download-page.
//!
//! The [`ConversationController`] is the only component that composes the
//! others. Each inbound event is handled by one call to
//! [`ConversationController::handle`], normally on its own task:
//!
//! ```text
//! Idle ──search──▶ PageDisplayed ◀──prev/next──▶ PageDisplayed
//!                        │
//!                 track_N / download_page
//!                        ▼
//!                  Downloading ──▶ PageDisplayed
//! ```
//!
//! Session reads and writes happen in short synchronous windows between
//! awaits. Anything learned before an await (search results, pinned message
//! ids) is re-checked against the session after it, since another event for
//! the same conversation may have run in between.

mod callback;
mod error;
mod render;

pub use callback::{CallbackAction, UnknownCallback};
pub use error::{ControllerError, InvalidInput};
pub use render::{escape_markdown, format_duration};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::{CatalogSearch, SEARCH_LIMIT};
use crate::download::{CooldownLimiter, DOWNLOAD_COOLDOWN, Reservation, TrackDownloader};
use crate::messenger::{InlineKeyboard, Messenger};
use crate::scheduler::{EphemeralMessageScheduler, MESSAGE_TTL};
use crate::session::{
    ConversationId, Direction, MessageId, PAGE_SIZE, Paginator, SessionStore, Track,
};

/// Slash commands the bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Recent,
}

impl BotCommand {
    /// Parses `/start`, `/help`, `/recent`, optionally `@botname`-suffixed.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "recent" => Some(Self::Recent),
            _ => None,
        }
    }
}

/// A transport-neutral inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        conversation: ConversationId,
        command: BotCommand,
    },
    /// Free text, treated as a search query.
    Text {
        conversation: ConversationId,
        text: String,
    },
    /// A pressed inline button on `message`.
    Callback {
        conversation: ConversationId,
        callback_id: String,
        message: MessageId,
        data: String,
    },
}

impl InboundEvent {
    #[must_use]
    pub fn conversation(&self) -> ConversationId {
        match self {
            Self::Command { conversation, .. }
            | Self::Text { conversation, .. }
            | Self::Callback { conversation, .. } => *conversation,
        }
    }
}

/// Runs before every event is dispatched. Must not fail the event.
#[async_trait]
pub trait EventHook: Send + Sync {
    async fn before_dispatch(&self, event: &InboundEvent);
}

/// Shows "typing…" in the conversation while the event is handled.
pub struct TypingIndicator {
    messenger: Arc<dyn Messenger>,
}

impl TypingIndicator {
    #[must_use]
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl EventHook for TypingIndicator {
    async fn before_dispatch(&self, event: &InboundEvent) {
        if let Err(e) = self.messenger.send_typing(event.conversation()).await {
            debug!(error = %e, "typing indicator failed");
        }
    }
}

/// Tunables of the conversation layer.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub page_size: usize,
    pub search_limit: usize,
    /// Lifetime of transient result messages.
    pub message_ttl: Duration,
    /// Download cooldown per conversation.
    pub cooldown: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            search_limit: SEARCH_LIMIT,
            message_ttl: MESSAGE_TTL,
            cooldown: DOWNLOAD_COOLDOWN,
        }
    }
}

/// What a render needs, captured from the session in one step.
struct ResultsView {
    stale: Vec<MessageId>,
    poster_url: Option<String>,
    caption: String,
    keyboard: InlineKeyboard,
}

/// Top-level event handlers.
pub struct ConversationController {
    sessions: SessionStore,
    paginator: Paginator,
    limiter: CooldownLimiter,
    messenger: Arc<dyn Messenger>,
    catalog: Arc<dyn CatalogSearch>,
    downloader: Arc<dyn TrackDownloader>,
    scheduler: EphemeralMessageScheduler,
    hooks: Vec<Arc<dyn EventHook>>,
    settings: ControllerSettings,
}

impl std::fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController")
            .field("sessions", &self.sessions.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ConversationController {
    /// Creates a controller with the typing indicator registered as a hook.
    #[must_use]
    pub fn new(
        messenger: Arc<dyn Messenger>,
        catalog: Arc<dyn CatalogSearch>,
        downloader: Arc<dyn TrackDownloader>,
        settings: ControllerSettings,
    ) -> Self {
        let typing: Arc<dyn EventHook> = Arc::new(TypingIndicator::new(Arc::clone(&messenger)));
        Self {
            sessions: SessionStore::new(),
            paginator: Paginator::new(settings.page_size),
            limiter: CooldownLimiter::new(settings.cooldown),
            scheduler: EphemeralMessageScheduler::new(Arc::clone(&messenger)),
            messenger,
            catalog,
            downloader,
            hooks: vec![typing],
            settings,
        }
    }

    /// Adds a hook that runs after the already registered ones.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn EventHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one event end to end. Never fails: errors become replies.
    pub async fn handle(&self, event: InboundEvent) {
        for hook in &self.hooks {
            hook.before_dispatch(&event).await;
        }

        let conversation = event.conversation();
        let result = match event {
            InboundEvent::Command { command, .. } => self.on_command(conversation, command).await,
            InboundEvent::Text { text, .. } => self.on_search(conversation, &text).await,
            InboundEvent::Callback {
                callback_id,
                message,
                data,
                ..
            } => {
                self.on_callback(conversation, &callback_id, message, &data)
                    .await
            }
        };

        if let Err(err) = result {
            self.report(conversation, &err).await;
        }
    }

    async fn report(&self, conversation: ConversationId, err: &ControllerError) {
        if err.is_upstream() {
            error!(%conversation, error = %err, "request failed upstream");
        } else if let ControllerError::RateLimited { remaining_secs } = err {
            info!(%conversation, remaining_secs, "download rate limited");
        } else {
            debug!(%conversation, error = %err, "rejected request");
        }
        self.reply(conversation, &err.user_message()).await;
    }

    /// Sends a plain reply; failures are logged only.
    async fn reply(&self, conversation: ConversationId, text: &str) {
        if let Err(e) = self.messenger.send_message(conversation, text, None).await {
            warn!(%conversation, error = %e, "failed to send reply");
        }
    }

    /// Edits a status message; failures are logged only.
    async fn edit_status(&self, conversation: ConversationId, message: MessageId, text: &str) {
        if let Err(e) = self
            .messenger
            .edit_message_text(conversation, message, text)
            .await
        {
            warn!(%conversation, %message, error = %e, "failed to edit status message");
        }
    }

    async fn retire(&self, conversation: ConversationId, messages: Vec<MessageId>) {
        for message in messages {
            if let Err(e) = self.messenger.delete_message(conversation, message).await {
                debug!(%conversation, %message, error = %e, "failed to retire message");
            }
        }
    }

    // ==================== Commands ====================

    #[instrument(skip(self))]
    async fn on_command(
        &self,
        conversation: ConversationId,
        command: BotCommand,
    ) -> Result<(), ControllerError> {
        let text = match command {
            BotCommand::Start => render::WELCOME_TEXT.to_string(),
            BotCommand::Help => render::HELP_TEXT.to_string(),
            BotCommand::Recent => {
                let session = self.sessions.get(conversation);
                render::recent_text(session.recent_queries.latest(render::RECENT_SHOWN))
            }
        };
        self.messenger
            .send_message(conversation, &text, None)
            .await?;
        Ok(())
    }

    // ==================== Search ====================

    /// Runs a search and shows its first page.
    ///
    /// An empty result leaves the previous results, page and active query
    /// untouched; the query is still recorded in the recent history.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] for empty queries, empty results, catalog
    /// failures, and a failed results message.
    #[instrument(skip(self))]
    pub async fn on_search(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Result<(), ControllerError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(InvalidInput::EmptyQuery.into());
        }

        self.sessions
            .with_session(conversation, |session| session.record_query(query));

        let tracks = self
            .catalog
            .search(query, self.settings.search_limit)
            .await?;
        if tracks.is_empty() {
            return Err(ControllerError::NoResults {
                query: query.to_string(),
            });
        }
        info!(results = tracks.len(), "search complete");

        self.sessions.with_session(conversation, |session| {
            session.replace_results(query, tracks);
        });
        self.render_results(conversation).await
    }

    // ==================== Rendering ====================

    /// Replaces the pinned results view with the session's current page.
    async fn render_results(&self, conversation: ConversationId) -> Result<(), ControllerError> {
        let view = self.sessions.with_session(conversation, |session| {
            let stale = session.pinned.take();
            let window = session.current_window(&self.paginator);
            ResultsView {
                stale,
                poster_url: session.results.first().and_then(|t| t.cover_art_url.clone()),
                caption: render::poster_caption(
                    session.active_query.as_deref().unwrap_or_default(),
                    &window,
                ),
                keyboard: render::results_keyboard(&window),
            }
        });
        self.retire(conversation, view.stale).await;

        let ttl = self.settings.message_ttl;
        let mut photo = None;
        if let Some(poster_url) = view.poster_url.as_deref() {
            match self
                .messenger
                .send_photo(conversation, poster_url, &view.caption)
                .await
            {
                Ok(id) => {
                    self.scheduler.schedule_deletion(conversation, id, ttl);
                    photo = Some(id);
                }
                Err(e) => warn!(%conversation, error = %e, "could not send poster photo"),
            }
        }

        let sent = self
            .messenger
            .send_message(conversation, render::RESULTS_PROMPT, Some(&view.keyboard))
            .await;
        let results = match sent {
            Ok(id) => {
                self.scheduler.schedule_deletion(conversation, id, ttl);
                Some(id)
            }
            Err(e) => {
                self.pin(conversation, None, photo).await;
                return Err(e.into());
            }
        };
        self.pin(conversation, results, photo).await;
        Ok(())
    }

    /// Pins freshly sent messages, retiring anything a concurrent render pinned
    /// in the meantime.
    async fn pin(
        &self,
        conversation: ConversationId,
        results: Option<MessageId>,
        photo: Option<MessageId>,
    ) {
        let displaced = self.sessions.with_session(conversation, |session| {
            let displaced = session.pinned.take();
            session.pinned.results = results;
            session.pinned.photo = photo;
            displaced
        });
        self.retire(conversation, displaced).await;
    }

    // ==================== Callbacks ====================

    async fn on_callback(
        &self,
        conversation: ConversationId,
        callback_id: &str,
        message: MessageId,
        data: &str,
    ) -> Result<(), ControllerError> {
        if let Err(e) = self.messenger.answer_callback(callback_id).await {
            debug!(error = %e, "failed to answer callback");
        }

        match data.parse::<CallbackAction>() {
            Ok(CallbackAction::PreviousPage) => {
                self.on_navigate(conversation, Direction::Previous).await
            }
            Ok(CallbackAction::NextPage) => self.on_navigate(conversation, Direction::Next).await,
            Ok(CallbackAction::Track(index)) => {
                self.on_select(conversation, message, index).await
            }
            Ok(CallbackAction::DownloadPage) => self.on_download_page(conversation, message).await,
            Err(unknown) => {
                debug!(%conversation, error = %unknown, "ignoring callback");
                Ok(())
            }
        }
    }

    /// Moves one page and re-renders from the stored results.
    ///
    /// # Errors
    ///
    /// [`InvalidInput::SessionExpired`] when the conversation has no results.
    #[instrument(skip(self))]
    pub async fn on_navigate(
        &self,
        conversation: ConversationId,
        direction: Direction,
    ) -> Result<(), ControllerError> {
        let page = self.sessions.with_session(conversation, |session| {
            session
                .has_results()
                .then(|| session.navigate(direction, &self.paginator))
        });
        let Some(page) = page else {
            return Err(InvalidInput::SessionExpired.into());
        };
        debug!(page, "navigated");
        self.render_results(conversation).await
    }

    /// Downloads one track and delivers it.
    ///
    /// The session and index are validated before the cooldown is reserved,
    /// so a stale button does not cost the user a download slot.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] for missing results, a bad index, or an
    /// active cooldown. Download failures are reported to the user directly.
    #[instrument(skip(self))]
    pub async fn on_select(
        &self,
        conversation: ConversationId,
        message: MessageId,
        index: usize,
    ) -> Result<(), ControllerError> {
        let track = self.sessions.with_session(conversation, |session| {
            if !session.has_results() {
                return Err(ControllerError::from(InvalidInput::SessionExpired));
            }
            let track = session
                .track(index)
                .cloned()
                .ok_or(InvalidInput::InvalidSelection { index })?;
            match self.limiter.check_and_reserve(session, Instant::now()) {
                Reservation::Allowed => Ok(track),
                Reservation::Denied { remaining_secs } => {
                    Err(ControllerError::RateLimited { remaining_secs })
                }
            }
        })?;

        self.edit_status(conversation, message, &render::selected_text(&track))
            .await;
        let delivered = self
            .download_and_deliver(conversation, &track, render::DOWNLOAD_SUCCESS_CAPTION)
            .await;
        let status = if delivered {
            render::selected_done_text(&track)
        } else {
            render::selected_failed_text(&track)
        };
        self.edit_status(conversation, message, &status).await;
        Ok(())
    }

    /// Downloads every track of the current page, one after another.
    ///
    /// One cooldown reservation covers the whole page. A failed track is
    /// reported and the next one is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] for missing results or an active cooldown.
    #[instrument(skip(self))]
    pub async fn on_download_page(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), ControllerError> {
        let (page, tracks) = self.sessions.with_session(conversation, |session| {
            if !session.has_results() {
                return Err(ControllerError::from(InvalidInput::SessionExpired));
            }
            match self.limiter.check_and_reserve(session, Instant::now()) {
                Reservation::Allowed => {
                    let window = session.current_window(&self.paginator);
                    Ok((window.page, window.tracks.to_vec()))
                }
                Reservation::Denied { remaining_secs } => {
                    Err(ControllerError::RateLimited { remaining_secs })
                }
            }
        })?;

        self.edit_status(conversation, message, &render::page_download_text(page))
            .await;

        let mut delivered = 0usize;
        for track in &tracks {
            let caption = render::page_track_caption(track);
            if self.download_and_deliver(conversation, track, &caption).await {
                delivered += 1;
            }
        }
        info!(page, delivered, total = tracks.len(), "page download finished");

        self.reply(conversation, render::PAGE_FINISHED).await;
        Ok(())
    }

    /// Runs one download and sends the audio. Returns whether it arrived.
    async fn download_and_deliver(
        &self,
        conversation: ConversationId,
        track: &Track,
        caption: &str,
    ) -> bool {
        let performer = track.artist_line();
        let artifact = match self
            .downloader
            .download(&track.external_url, &track.title, &performer)
            .await
        {
            Ok(artifact) => artifact,
            Err(failure) => {
                error!(
                    %conversation,
                    url = %track.external_url,
                    title = %track.title,
                    error = %failure,
                    "download failed"
                );
                self.reply(conversation, &failure.user_message()).await;
                return false;
            }
        };

        match self
            .messenger
            .send_audio(conversation, &artifact, caption)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(%conversation, title = %track.title, error = %e, "failed to send audio");
                self.reply(conversation, render::AUDIO_SEND_FAILED).await;
                false
            }
        }
    }
}
