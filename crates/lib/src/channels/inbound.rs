//! Inbound message decoded from a Telegram update.

use crate::channels::TelegramUpdate;
use crate::session::ChatIdentity;

/// A text message from a user, with the chat to answer in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub identity: ChatIdentity,
    pub display_name: String,
    pub chat_id: i64,
    pub text: String,
}

impl InboundMessage {
    /// Decode an update. None when it carries no message, no sender, or no text
    /// (stickers, photos, membership events, channel posts).
    pub fn from_update(update: &TelegramUpdate) -> Option<Self> {
        let msg = update.message.as_ref()?;
        let text = msg.text.as_ref()?;
        let from = msg.from.as_ref()?;
        let display_name = from
            .first_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| from.username.clone())
            .unwrap_or_else(|| from.id.to_string());
        Some(Self {
            identity: from.id,
            display_name,
            chat_id: msg.chat.id,
            text: text.clone(),
        })
    }
}
