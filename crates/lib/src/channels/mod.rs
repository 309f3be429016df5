//! Telegram transport: Bot API client, update wire types, and the `Transport` seam.
//!
//! Both ingestion modes decode updates into an [`InboundMessage`] and reply through a
//! [`Transport`]; [`TelegramChannel`] is the HTTP implementation.

mod inbound;
mod telegram;
mod transport;

pub use inbound::InboundMessage;
pub use telegram::{TelegramChannel, TelegramChat, TelegramMessage, TelegramUpdate, TelegramUser};
pub use transport::{Transport, TransportError};
