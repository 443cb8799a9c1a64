//! User-facing texts and keyboards.

use crate::messenger::{InlineButton, InlineKeyboard};
use crate::session::{PageWindow, Track};

use super::callback::CallbackAction;

pub(crate) const WELCOME_TEXT: &str = "🎵 *Welcome to TuneFetch!*\n\
    Search for songs and download them as MP3.\n\n\
    Commands:\n\
    /start - Show welcome message\n\
    /help - Show usage instructions\n\
    /recent - Show your last 5 searches";

pub(crate) const HELP_TEXT: &str = "📖 *How to use the bot:*\n\n\
    1. Send a song name to search.\n\
    2. Browse pages of tracks.\n\
    3. Click the track button to download individual songs.\n\
    4. Or click \"Download This Page\" to download all songs on the current page.\n\
    5. Use /recent to see your recent searches.\n\n\
    _Please wait 30 seconds between downloads._";

pub(crate) const NO_RECENT_TEXT: &str = "😕 You have no recent searches yet.";
pub(crate) const RESULTS_PROMPT: &str =
    "📍 *Choose a track to download or download the entire page:*";
pub(crate) const DOWNLOAD_SUCCESS_CAPTION: &str = "✅ *Downloaded successfully!*";
pub(crate) const AUDIO_SEND_FAILED: &str = "⚠️ Error sending audio.";
pub(crate) const PAGE_FINISHED: &str = "✔️ Finished downloading all songs on this page.";

/// Number of recent queries listed by `/recent`.
pub(crate) const RECENT_SHOWN: usize = 5;

/// Escapes the legacy Markdown markers (`_ * [ \``) in user or catalog text.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `m:ss` from milliseconds.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub(crate) fn recent_text<'a>(queries: impl Iterator<Item = &'a str>) -> String {
    let lines: Vec<String> = queries.map(|q| format!("- {}", escape_markdown(q))).collect();
    if lines.is_empty() {
        NO_RECENT_TEXT.to_string()
    } else {
        format!("🕘 Your recent searches:\n{}", lines.join("\n"))
    }
}

pub(crate) fn poster_caption(query: &str, window: &PageWindow<'_>) -> String {
    format!(
        "🎧 *Results for:* `{}` (Page {}/{})",
        query.replace('`', "'"),
        window.page,
        window.total_pages
    )
}

pub(crate) fn track_label(track: &Track) -> String {
    format!(
        "{} — {} [{}]",
        track.title,
        track.artist_line(),
        format_duration(track.duration_ms)
    )
}

/// Track buttons, then the navigation row, then "download this page".
pub(crate) fn results_keyboard(window: &PageWindow<'_>) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::default();
    for (index, track) in window.indexed() {
        keyboard.push_row(vec![InlineButton::new(
            track_label(track),
            CallbackAction::Track(index).to_string(),
        )]);
    }

    let mut nav = Vec::new();
    if window.has_previous() {
        nav.push(InlineButton::new(
            "⬅️ Back",
            CallbackAction::PreviousPage.to_string(),
        ));
    }
    if window.has_next() {
        nav.push(InlineButton::new(
            "Next ➡️",
            CallbackAction::NextPage.to_string(),
        ));
    }
    keyboard.push_row(nav);
    keyboard.push_row(vec![InlineButton::new(
        "⬇️ Download This Page",
        CallbackAction::DownloadPage.to_string(),
    )]);
    keyboard
}

pub(crate) fn selected_text(track: &Track) -> String {
    format!(
        "🎶 Selected: *{}* by *{}*\n\n⏳ Downloading...",
        escape_markdown(&track.title),
        escape_markdown(&track.artist_line())
    )
}

pub(crate) fn selected_done_text(track: &Track) -> String {
    format!(
        "✅ *{}* by *{}*",
        escape_markdown(&track.title),
        escape_markdown(&track.artist_line())
    )
}

pub(crate) fn selected_failed_text(track: &Track) -> String {
    format!(
        "❌ *{}* by *{}* could not be downloaded.",
        escape_markdown(&track.title),
        escape_markdown(&track.artist_line())
    )
}

pub(crate) fn page_download_text(page: usize) -> String {
    format!("⬇️ Downloading all songs on page {page}...\n\n⏳ Please wait...")
}

pub(crate) fn page_track_caption(track: &Track) -> String {
    format!(
        "✅ *Downloaded: {}*\n👤 *Artist:* {}",
        escape_markdown(&track.title),
        escape_markdown(&track.artist_line())
    )
}
