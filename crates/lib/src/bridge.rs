//! Per-update handling shared by the polling loop and the webhook endpoint.
//!
//! Decode the update, route commands locally, relay everything else to OpenCode,
//! and deliver the reply to the chat the message came from.

use crate::backend::Backend;
use crate::channels::{InboundMessage, TelegramUpdate, Transport};
use crate::commands::{CommandDispatcher, Route};
use crate::relay::RelayEngine;
use crate::session::SessionRegistry;
use std::sync::Arc;

const TYPING_ACTION: &str = "typing";

pub struct Bridge {
    commands: CommandDispatcher,
    relay: RelayEngine,
    transport: Arc<dyn Transport>,
}

impl Bridge {
    pub fn new(backend: Arc<dyn Backend>, transport: Arc<dyn Transport>) -> Self {
        let registry = Arc::new(SessionRegistry::new(backend.clone()));
        Self {
            commands: CommandDispatcher::new(registry.clone()),
            relay: RelayEngine::new(registry, backend),
            transport,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.relay.registry()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Handle one update. Returns the reply that was produced, or None when the update
    /// has no text (nothing is sent and the backend is not called).
    pub async fn handle_update(&self, update: &TelegramUpdate) -> Option<String> {
        let Some(msg) = InboundMessage::from_update(update) else {
            log::debug!("bridge: ignoring update {} without text", update.update_id);
            return None;
        };
        Some(self.handle_message(&msg).await)
    }

    pub async fn handle_message(&self, msg: &InboundMessage) -> String {
        log::info!(
            "bridge: received message from {} (ID={})",
            msg.display_name,
            msg.identity
        );
        log::debug!("bridge: message text: {}", msg.text);

        let reply = match self
            .commands
            .dispatch(msg.identity, &msg.display_name, &msg.text)
            .await
        {
            Route::Reply(reply) => reply,
            Route::Relay => {
                if let Err(e) = self
                    .transport
                    .send_chat_action(msg.chat_id, TYPING_ACTION)
                    .await
                {
                    log::debug!("bridge: typing indicator failed: {}", e);
                }
                self.relay.handle(msg.identity, &msg.text).await
            }
        };

        if reply.text.trim().is_empty() {
            log::debug!("bridge: empty reply for user {}, nothing sent", msg.identity);
            return reply.text;
        }
        match self.transport.send_message(msg.chat_id, &reply.text).await {
            Ok(()) => log::info!("bridge: sent response to user {}", msg.identity),
            Err(e) => log::warn!(
                "bridge: failed to deliver reply to chat {}: {}",
                msg.chat_id,
                e
            ),
        }
        reply.text
    }
}
