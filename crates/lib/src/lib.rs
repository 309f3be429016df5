//! Bridge core library: relays Telegram chats to OpenCode sessions, one session per user,
//! fed either by a getUpdates polling loop or by a webhook endpoint.

pub mod backend;
pub mod bridge;
pub mod channels;
pub mod commands;
pub mod config;
pub mod gateway;
pub mod poller;
pub mod relay;
pub mod runtime;
pub mod session;
