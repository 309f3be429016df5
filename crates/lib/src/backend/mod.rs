//! OpenCode backend: session creation, message send, and reply normalization.
//!
//! The [`Backend`] trait is the seam the session registry and relay engine use;
//! [`OpencodeClient`] is the HTTP implementation.

mod opencode;
mod reply;

pub use opencode::{parse_model, ModelRef, OpencodeClient};
pub use reply::{
    error_reply, normalize_response, truncate_chars, RelayReply, ReplyKind, ERROR_MARKER,
    NO_TEXT_PLACEHOLDER,
};

use async_trait::async_trait;

/// Backend-assigned session identifier (opaque string).
pub type SessionId = String;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Network failure or non-success HTTP status.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend answered but flagged an application-level error.
    #[error("backend error: {0}")]
    Api(String),
    /// The response did not have the expected shape.
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Unavailable(e.to_string())
    }
}

/// Agent backend reachable by session id.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create a new session; returns its id. No retry.
    async fn create_session(&self) -> Result<SessionId, BackendError>;

    /// Send `text` to the session and return the raw response body.
    async fn post_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<serde_json::Value, BackendError>;

    /// Send `text` and normalize the response into a reply. Never fails: errors become error replies.
    async fn send_message(&self, session_id: &str, text: &str) -> RelayReply {
        match self.post_message(session_id, text).await {
            Ok(body) => normalize_response(&body),
            Err(e) => {
                log::error!("backend: failed to send message to {}: {}", session_id, e);
                error_reply("Error communicating with OpenCode", &e.to_string())
            }
        }
    }
}
