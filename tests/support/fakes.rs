//! In-memory stand-ins for the chat transport, catalog and download tool.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tunefetch_core::download::AudioArtifact;
use tunefetch_core::{
    CatalogError, CatalogSearch, ConversationId, DownloadFailure, InlineKeyboard, MessageId,
    Messenger, MessengerError, Track, TrackDownloader,
};

/// One recorded messenger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message {
        conversation: ConversationId,
        id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Photo {
        conversation: ConversationId,
        id: MessageId,
        url: String,
        caption: String,
    },
    Audio {
        conversation: ConversationId,
        title: String,
        caption: String,
    },
    Edit {
        message: MessageId,
        text: String,
    },
    Delete {
        message: MessageId,
    },
    CallbackAnswer {
        callback_id: String,
    },
    Typing {
        conversation: ConversationId,
    },
}

/// Records every call and hands out increasing message ids.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    calls: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    pub fail_photos: AtomicBool,
    pub fail_audio: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Sent> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, sent: Sent) {
        self.calls.lock().unwrap().push(sent);
    }

    fn allocate(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 100)
    }

    /// Texts of plain messages, in order.
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Sent::Message { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Keyboard of the most recent message that carried one.
    pub fn last_keyboard(&self) -> Option<InlineKeyboard> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Sent::Message {
                keyboard: Some(k), ..
            } => Some(k),
            _ => None,
        })
    }

    pub fn photos(&self) -> Vec<(MessageId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Sent::Photo { id, caption, .. } => Some((id, caption)),
                _ => None,
            })
            .collect()
    }

    pub fn audio_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Sent::Audio { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Sent::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Sent::Delete { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        conversation: ConversationId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, MessengerError> {
        let id = self.allocate();
        self.record(Sent::Message {
            conversation,
            id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(id)
    }

    async fn send_photo(
        &self,
        conversation: ConversationId,
        photo_url: &str,
        caption: &str,
    ) -> Result<MessageId, MessengerError> {
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(MessengerError::api("sendPhoto", "Bad Request: wrong file"));
        }
        let id = self.allocate();
        self.record(Sent::Photo {
            conversation,
            id,
            url: photo_url.to_string(),
            caption: caption.to_string(),
        });
        Ok(id)
    }

    async fn send_audio(
        &self,
        conversation: ConversationId,
        audio: &AudioArtifact,
        caption: &str,
    ) -> Result<MessageId, MessengerError> {
        if self.fail_audio.load(Ordering::SeqCst) {
            return Err(MessengerError::api("sendAudio", "Request Entity Too Large"));
        }
        self.record(Sent::Audio {
            conversation,
            title: audio.title.clone(),
            caption: caption.to_string(),
        });
        Ok(self.allocate())
    }

    async fn edit_message_text(
        &self,
        _conversation: ConversationId,
        message: MessageId,
        text: &str,
    ) -> Result<(), MessengerError> {
        self.record(Sent::Edit {
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(
        &self,
        _conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), MessengerError> {
        self.record(Sent::Delete { message });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessengerError> {
        self.record(Sent::CallbackAnswer {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }

    async fn send_typing(&self, conversation: ConversationId) -> Result<(), MessengerError> {
        self.record(Sent::Typing { conversation });
        Ok(())
    }
}

/// Answers searches from a fixed table; unknown queries return nothing.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    results: Mutex<HashMap<String, Vec<Track>>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(self, query: &str, tracks: Vec<Track>) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), tracks);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CatalogError::HttpStatus { status: 503 });
        }
        let mut tracks = self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        tracks.truncate(limit);
        Ok(tracks)
    }
}

/// Succeeds for every track except the titles marked as failing.
#[derive(Debug, Default)]
pub struct FakeDownloader {
    failing: Mutex<HashSet<String>>,
    requested: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, title: &str) -> Self {
        self.failing.lock().unwrap().insert(title.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackDownloader for FakeDownloader {
    async fn download(
        &self,
        source_url: &str,
        title: &str,
        performer: &str,
    ) -> Result<AudioArtifact, DownloadFailure> {
        self.requested.lock().unwrap().push(source_url.to_string());
        if self.failing.lock().unwrap().contains(title) {
            return Err(DownloadFailure::tool_failure("exit status: 1", "403 Forbidden"));
        }
        Ok(AudioArtifact {
            file_name: format!("{title}.mp3"),
            title: title.to_string(),
            performer: performer.to_string(),
            bytes: b"ID3".to_vec(),
        })
    }
}

/// `count` tracks titled "Song 0".."Song {count-1}", first one with cover art.
pub fn tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| Track {
            title: format!("Song {i}"),
            artists: vec![format!("Artist {i}")],
            duration_ms: 180_000 + i as u64 * 1000,
            external_url: format!("https://open.spotify.com/track/{i}"),
            cover_art_url: (i == 0).then(|| "https://i.scdn.co/image/cover0".to_string()),
        })
        .collect()
}
