//! Relay engine: resolve the user's session, forward the text, bound the reply length.

use crate::backend::{error_reply, truncate_chars, Backend, RelayReply};
use crate::session::{ChatIdentity, SessionRegistry};
use std::sync::Arc;

/// Longest reply body sent to Telegram (its hard limit is 4096).
pub const MAX_REPLY_CHARS: usize = 4000;

/// Appended to replies cut at [`MAX_REPLY_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n\n... (response truncated)";

/// Label of the reply sent when no session could be obtained.
pub const PROCESSING_ERROR_LABEL: &str =
    "Sorry, an error occurred while processing your message.\n\nError";

pub struct RelayEngine {
    registry: Arc<SessionRegistry>,
    backend: Arc<dyn Backend>,
}

impl RelayEngine {
    pub fn new(registry: Arc<SessionRegistry>, backend: Arc<dyn Backend>) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Relay `text` for `identity` and return the reply to deliver. Never fails.
    pub async fn handle(&self, identity: ChatIdentity, text: &str) -> RelayReply {
        // The lease is held through the send so a concurrent /reset cannot retire the
        // session while a message is still going out on it.
        let lease = match self.registry.lease(identity).await {
            Ok(lease) => lease,
            Err(e) => {
                log::error!("relay: no session for user {}: {}", identity, e);
                return error_reply(PROCESSING_ERROR_LABEL, &e.to_string());
            }
        };
        log::info!("relay: using session {} for user {}", lease.id(), identity);
        let reply = self.backend.send_message(lease.id(), text).await;
        drop(lease);
        bound_reply(reply)
    }
}

/// Cut the reply to [`MAX_REPLY_CHARS`] and append the marker when it was longer.
pub fn bound_reply(mut reply: RelayReply) -> RelayReply {
    if reply.text.chars().count() > MAX_REPLY_CHARS {
        let mut text = truncate_chars(&reply.text, MAX_REPLY_CHARS).to_string();
        text.push_str(TRUNCATION_MARKER);
        reply.text = text;
    }
    reply
}
