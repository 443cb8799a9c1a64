//! Per-conversation session state.
//!
//! Every chat the bot talks to gets one [`ConversationSession`], created lazily
//! the first time the conversation is seen and kept in process memory only.
//! The [`SessionStore`] owns all sessions and hands out short, synchronous
//! mutation windows so no entry lock is ever held across an `.await`.
//!
//! # Example
//!
//! ```
//! use tunefetch_core::session::{ConversationId, SessionStore};
//!
//! let store = SessionStore::new();
//! let chat = ConversationId(42);
//!
//! store.with_session(chat, |session| session.record_query("imagine"));
//! assert_eq!(store.get(chat).recent_queries.len(), 1);
//! ```

pub mod paginator;

use std::collections::VecDeque;
use std::fmt;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

pub use paginator::{Direction, PAGE_SIZE, PageWindow, Paginator};

/// Maximum number of distinct queries remembered per conversation.
pub const RECENT_QUERY_CAP: usize = 20;

/// Identifier of one chat context (the unit of session isolation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message inside a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog track as returned by a search. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Track title.
    pub title: String,
    /// Performing artists, in catalog order.
    pub artists: Vec<String>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Public catalog URL handed to the download tool.
    pub external_url: String,
    /// Cover art, when the catalog has one.
    pub cover_art_url: Option<String>,
}

impl Track {
    /// Artists joined for display, e.g. `"Queen, David Bowie"`.
    #[must_use]
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// Deduplicated query history, most recent last.
///
/// A query that is already present is not re-appended, so its position is
/// stable. Past the cap the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct RecentQueries {
    entries: VecDeque<String>,
    cap: usize,
}

impl RecentQueries {
    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Records a query. Returns `false` when it was already known.
    pub fn record(&mut self, query: &str) -> bool {
        if self.entries.iter().any(|q| q == query) {
            return false;
        }
        self.entries.push_back(query.to_string());
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        true
    }

    /// The last `n` queries, oldest first.
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &str> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for RecentQueries {
    fn default() -> Self {
        Self::with_cap(RECENT_QUERY_CAP)
    }
}

/// UI messages that must be retired when a new result view is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinnedMessages {
    pub results: Option<MessageId>,
    pub photo: Option<MessageId>,
}

impl PinnedMessages {
    /// Clears both slots and returns whatever was pinned.
    pub fn take(&mut self) -> Vec<MessageId> {
        let taken = [self.results.take(), self.photo.take()];
        taken.into_iter().flatten().collect()
    }
}

/// Mutable state of one conversation.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    /// Full result set of the last successful search.
    pub results: Vec<Track>,
    /// 1-indexed page cursor into `results`.
    pub current_page: usize,
    /// Query that produced `results`.
    pub active_query: Option<String>,
    pub recent_queries: RecentQueries,
    /// `None` means no download was ever reserved.
    pub last_download_at: Option<Instant>,
    pub pinned: PinnedMessages,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            current_page: 1,
            active_query: None,
            recent_queries: RecentQueries::default(),
            last_download_at: None,
            pinned: PinnedMessages::default(),
        }
    }
}

impl ConversationSession {
    /// True once a search has produced results for this conversation.
    #[must_use]
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn record_query(&mut self, query: &str) -> bool {
        self.recent_queries.record(query)
    }

    /// Replaces the result set wholesale and rewinds to page 1.
    pub fn replace_results(&mut self, query: impl Into<String>, tracks: Vec<Track>) {
        self.results = tracks;
        self.current_page = 1;
        self.active_query = Some(query.into());
    }

    /// Moves one page in `direction`, clamped to the valid range.
    ///
    /// Returns the resulting page. At either bound the cursor stays put.
    pub fn navigate(&mut self, direction: Direction, paginator: &Paginator) -> usize {
        let requested = match direction {
            Direction::Previous => self.current_page.saturating_sub(1),
            Direction::Next => self.current_page.saturating_add(1),
        };
        self.current_page = paginator.clamp(requested, self.results.len());
        self.current_page
    }

    /// Window of `results` for the current page.
    #[must_use]
    pub fn current_window<'a>(&'a self, paginator: &Paginator) -> PageWindow<'a> {
        paginator.window(&self.results, self.current_page)
    }

    #[must_use]
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.results.get(index)
    }
}

/// All conversation sessions of this process.
///
/// Sessions are created on first access and never removed. Mutation goes
/// through [`SessionStore::with_session`], whose closure runs under the
/// entry's shard lock; keep it synchronous and short.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<ConversationId, ConversationSession>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the conversation's session, creating it if needed.
    #[must_use]
    pub fn get(&self, conversation: ConversationId) -> ConversationSession {
        self.with_session(conversation, |session| session.clone())
    }

    /// Runs `f` against the conversation's session in place.
    pub fn with_session<R>(
        &self,
        conversation: ConversationId,
        f: impl FnOnce(&mut ConversationSession) -> R,
    ) -> R {
        let mut entry = self.sessions.entry(conversation).or_insert_with(|| {
            debug!(%conversation, "creating session");
            ConversationSession::default()
        });
        f(entry.value_mut())
    }

    /// Number of conversations seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
