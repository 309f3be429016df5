//! Control commands (/start, /help, /reset) versus ordinary content.

use crate::backend::{error_reply, RelayReply, ReplyKind};
use crate::relay::PROCESSING_ERROR_LABEL;
use crate::session::{ChatIdentity, SessionRegistry};
use std::sync::Arc;

pub const COMMAND_PREFIX: char = '/';

pub const HELP_TEXT: &str = "📖 **Help**\n\n\
Just send me a message and I'll forward it to OpenCode.\n\n\
Available commands:\n\
/start - Start the bot\n\
/help - Show this help\n\
/reset - Reset your session and start fresh";

pub const RESET_TEXT: &str = "✅ Session reset! Starting fresh.";

/// A recognized (or unrecognized) control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Reset,
    /// Prefixed word that is not a known command (lowercased, without the prefix).
    Unknown(String),
}

impl Command {
    /// Parse a command from message text. Returns None for ordinary (non-prefixed) text.
    ///
    /// Only the first word counts; a trailing `@botname` and any arguments are ignored.
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.trim_start().split_whitespace().next()?;
        let name = word.strip_prefix(COMMAND_PREFIX)?;
        let name = name.split('@').next().unwrap_or("").to_lowercase();
        Some(match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "reset" => Command::Reset,
            _ => Command::Unknown(name),
        })
    }
}

/// Where a message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Command handled locally; send this reply.
    Reply(RelayReply),
    /// Ordinary content for the relay engine.
    Relay,
}

pub struct CommandDispatcher {
    registry: Arc<SessionRegistry>,
}

fn welcome_text(display_name: &str) -> String {
    format!(
        "👋 Hello, {}!\n\n\
I'm your OpenCode assistant.\n\
Send me any message and I'll forward it to OpenCode for processing.\n\n\
Commands:\n\
/start - Show this welcome message\n\
/help - Show help information\n\
/reset - Create a new session",
        display_name
    )
}

fn unknown_text(name: &str) -> String {
    format!(
        "❓ Unknown command: /{}\n\nSend /help to see the available commands.",
        name
    )
}

fn local(text: impl Into<String>) -> Route {
    Route::Reply(RelayReply {
        text: text.into(),
        kind: ReplyKind::Content,
    })
}

impl CommandDispatcher {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Handle `text` if it is a command; otherwise route it to the relay engine.
    pub async fn dispatch(
        &self,
        identity: ChatIdentity,
        display_name: &str,
        text: &str,
    ) -> Route {
        let Some(command) = Command::parse(text) else {
            return Route::Relay;
        };
        log::debug!("commands: user {} sent {:?}", identity, command);
        match command {
            Command::Start => local(welcome_text(display_name)),
            Command::Help => local(HELP_TEXT),
            Command::Reset => {
                self.registry.reset(identity).await;
                match self.registry.resolve(identity).await {
                    Ok(_) => local(RESET_TEXT),
                    Err(e) => {
                        log::error!("commands: reset for user {} failed: {}", identity, e);
                        Route::Reply(error_reply(PROCESSING_ERROR_LABEL, &e.to_string()))
                    }
                }
            }
            Command::Unknown(name) => local(unknown_text(&name)),
        }
    }
}
