//! Integration test: OpencodeClient against a stub OpenCode server.

mod common;

use axum::http::StatusCode;
use bridge::backend::{Backend, BackendError, OpencodeClient, ReplyKind, ERROR_MARKER, NO_TEXT_PLACEHOLDER};
use bridge::config::BackendConfig;
use common::{spawn_opencode, MessageReply};
use serde_json::json;

#[tokio::test]
async fn create_session_posts_title_and_returns_id() {
    let stub = spawn_opencode().await;
    let client = OpencodeClient::new(&stub.backend_config()).unwrap();
    let id = client.create_session().await.unwrap();
    assert_eq!(id, "ses_1");
    assert_eq!(
        stub.recorded.lock().unwrap().session_titles,
        vec!["Telegram Session".to_string()]
    );
}

#[tokio::test]
async fn send_message_posts_agent_model_and_text_part() {
    let stub = spawn_opencode().await;
    let client = OpencodeClient::new(&stub.backend_config()).unwrap();
    let reply = client.send_message("ses_9", "ping").await;
    assert_eq!(reply.text, "pong");
    assert_eq!(reply.kind, ReplyKind::Content);

    let messages = stub.messages();
    assert_eq!(messages.len(), 1);
    let (session, body) = &messages[0];
    assert_eq!(session, "ses_9");
    assert_eq!(body["agent"], "sisyphus");
    assert_eq!(body["model"]["providerID"], "opencode");
    assert_eq!(body["model"]["modelID"], "glm-4.7-free");
    assert_eq!(body["parts"], json!([{ "type": "text", "text": "ping" }]));
}

#[tokio::test]
async fn model_is_left_out_when_not_configured() {
    let stub = spawn_opencode().await;
    let config = BackendConfig {
        default_model: None,
        ..stub.backend_config()
    };
    let client = OpencodeClient::new(&config).unwrap();
    client.send_message("ses_1", "ping").await;
    assert!(stub.messages()[0].1.get("model").is_none());
}

#[tokio::test]
async fn backend_error_object_becomes_error_reply() {
    let stub = spawn_opencode().await;
    stub.set_message_reply(MessageReply::Json(json!({
        "error": { "name": "ProviderModelNotFoundError", "data": { "message": "model not found" } },
        "parts": []
    })));
    let client = OpencodeClient::new(&stub.backend_config()).unwrap();
    let reply = client.send_message("ses_1", "ping").await;
    assert!(reply.text.starts_with(ERROR_MARKER));
    assert!(reply.text.contains("model not found"));
}

#[tokio::test]
async fn empty_parts_give_placeholder() {
    let stub = spawn_opencode().await;
    stub.set_message_reply(MessageReply::Json(json!({ "info": { "id": "m" }, "parts": [] })));
    let client = OpencodeClient::new(&stub.backend_config()).unwrap();
    assert_eq!(client.send_message("ses_1", "ping").await.text, NO_TEXT_PLACEHOLDER);
}

#[tokio::test]
async fn http_error_on_send_becomes_error_reply() {
    let stub = spawn_opencode().await;
    stub.set_message_reply(MessageReply::Status(StatusCode::INTERNAL_SERVER_ERROR));
    let client = OpencodeClient::new(&stub.backend_config()).unwrap();
    let reply = client.send_message("ses_1", "ping").await;
    assert!(reply.is_error());
    assert!(reply.text.contains("Error communicating with OpenCode"));
    assert!(reply.text.contains("500"));
}

#[tokio::test]
async fn http_error_on_create_is_unavailable() {
    let stub = spawn_opencode().await;
    stub.set_session_reply(MessageReply::Status(StatusCode::SERVICE_UNAVAILABLE));
    let client = OpencodeClient::new(&stub.backend_config()).unwrap();
    assert!(matches!(
        client.create_session().await,
        Err(BackendError::Unavailable(_))
    ));
}

#[tokio::test]
async fn session_without_id_is_malformed() {
    let stub = spawn_opencode().await;
    stub.set_session_reply(MessageReply::Json(json!({ "title": "Telegram Session" })));
    let client = OpencodeClient::new(&stub.backend_config()).unwrap();
    assert!(matches!(
        client.create_session().await,
        Err(BackendError::Malformed(_))
    ));
}

#[tokio::test]
async fn unreachable_backend_degrades_to_error_reply() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
        listener.local_addr().expect("local_addr").port()
    };
    let config = BackendConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        request_timeout_secs: 5,
        ..BackendConfig::default()
    };
    let client = OpencodeClient::new(&config).unwrap();
    assert!(matches!(
        client.create_session().await,
        Err(BackendError::Unavailable(_))
    ));
    let reply = client.send_message("ses_1", "ping").await;
    assert!(reply.text.starts_with(ERROR_MARKER));
}
