//! Integration tests for the Telegram Bot API client against a mock server.

use serde_json::json;
use tunefetch_core::messenger::TelegramMessenger;
use tunefetch_core::{
    AudioArtifact, ConversationId, InlineButton, InlineKeyboard, InboundEvent, MessageId,
    Messenger, MessengerError,
};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

const TOKEN: &str = "123:abc";
const CHAT: ConversationId = ConversationId(77);

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": result }))
}

#[tokio::test]
async fn test_send_message_with_keyboard() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({
            "chat_id": 77,
            "text": "pick one",
            "parse_mode": "Markdown",
            "reply_markup": {"inline_keyboard": [[{"text": "Song", "callback_data": "track_0"}]]}
        })))
        .respond_with(ok(json!({ "message_id": 501 })))
        .expect(1)
        .mount(&server)
        .await;

    let messenger = TelegramMessenger::with_base_url(TOKEN, server.uri()).unwrap();
    let mut keyboard = InlineKeyboard::default();
    keyboard.push_row(vec![InlineButton::new("Song", "track_0")]);

    let id = messenger
        .send_message(CHAT, "pick one", Some(&keyboard))
        .await
        .unwrap();
    assert_eq!(id, MessageId(501));
}

#[tokio::test]
async fn test_api_rejection_maps_to_api_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/deleteMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message to delete not found"
        })))
        .mount(&server)
        .await;

    let messenger = TelegramMessenger::with_base_url(TOKEN, server.uri()).unwrap();
    let err = messenger
        .delete_message(CHAT, MessageId(9))
        .await
        .unwrap_err();

    match err {
        MessengerError::Api {
            method,
            description,
        } => {
            assert_eq!(method, "deleteMessage");
            assert!(description.contains("not found"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendChatAction")))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let messenger = TelegramMessenger::with_base_url(TOKEN, server.uri()).unwrap();
    let err = messenger.send_typing(CHAT).await.unwrap_err();
    assert!(matches!(err, MessengerError::InvalidResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn test_send_audio_uploads_multipart() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendAudio")))
        .and(body_string_contains("name=\"audio\"; filename=\"imagine.mp3\""))
        .and(body_string_contains("John Lennon"))
        .and(body_string_contains("ID3-bytes"))
        .respond_with(ok(json!({ "message_id": 900 })))
        .expect(1)
        .mount(&server)
        .await;

    let messenger = TelegramMessenger::with_base_url(TOKEN, server.uri()).unwrap();
    let artifact = AudioArtifact {
        file_name: "imagine.mp3".to_string(),
        title: "Imagine".to_string(),
        performer: "John Lennon".to_string(),
        bytes: b"ID3-bytes".to_vec(),
    };

    let id = messenger
        .send_audio(CHAT, &artifact, "✅ done")
        .await
        .unwrap();
    assert_eq!(id, MessageId(900));
}

#[tokio::test]
async fn test_get_updates_passes_offset_and_converts_events() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({ "offset": 11, "timeout": 0 })))
        .respond_with(ok(json!([
            {"update_id": 11, "message": {"message_id": 1, "chat": {"id": 77}, "text": "lofi"}},
            {"update_id": 12, "callback_query": {"id": "cb", "data": "next_page",
                "message": {"message_id": 2, "chat": {"id": 77}}}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let messenger = TelegramMessenger::with_base_url(TOKEN, server.uri()).unwrap();
    let updates = messenger.get_updates(Some(11), 0).await.unwrap();
    assert_eq!(updates.len(), 2);

    let events: Vec<InboundEvent> = updates.into_iter().filter_map(|u| u.into_event()).collect();
    assert_eq!(
        events,
        vec![
            InboundEvent::Text {
                conversation: CHAT,
                text: "lofi".to_string(),
            },
            InboundEvent::Callback {
                conversation: CHAT,
                callback_id: "cb".to_string(),
                message: MessageId(2),
                data: "next_page".to_string(),
            },
        ]
    );
}
