//! Transport seam used by the bridge and the polling loop.

use crate::channels::TelegramUpdate;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Request(reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
}

/// Request URLs carry the bot token, so it is stripped before the error can be logged.
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.without_url())
    }
}

/// Chat transport operations the bridge needs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-poll for updates with id >= `offset`.
    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, TransportError>;

    /// Send a text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Show a chat action (e.g. "typing"). Default does nothing.
    async fn send_chat_action(&self, _chat_id: i64, _action: &str) -> Result<(), TransportError> {
        Ok(())
    }
}
