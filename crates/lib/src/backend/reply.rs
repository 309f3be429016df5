//! Reply text produced from an OpenCode message response.

use serde_json::Value;

/// Prefix of every chat-visible failure.
pub const ERROR_MARKER: &str = "❌";

/// Sent when the backend accepted the message but returned no text part.
pub const NO_TEXT_PLACEHOLDER: &str = "Message sent to OpenCode (waiting for response...)";

/// Longest diagnostic carried in an error reply, in characters.
const MAX_DIAGNOSTIC_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Text part returned by the agent.
    Content,
    /// Backend answered without any text part.
    Placeholder,
    /// Something failed; text starts with [`ERROR_MARKER`].
    Error,
}

/// Plain-text reply destined for the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    pub text: String,
    pub kind: ReplyKind,
}

impl RelayReply {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ReplyKind::Content,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            text: NO_TEXT_PLACEHOLDER.to_string(),
            kind: ReplyKind::Placeholder,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ReplyKind::Error
    }
}

/// Longest prefix of `s` with at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Error reply: marker, label, and the diagnostic capped to 500 characters.
pub fn error_reply(label: &str, diagnostic: &str) -> RelayReply {
    RelayReply {
        text: format!(
            "{} {}: {}",
            ERROR_MARKER,
            label,
            truncate_chars(diagnostic, MAX_DIAGNOSTIC_CHARS)
        ),
        kind: ReplyKind::Error,
    }
}

/// Loose truthiness: null, false, 0, "", [] and {} count as "no error".
fn is_set(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Human-readable message of a non-empty `error` field: `error.data.message`, else the JSON text.
fn error_message(body: &Value) -> Option<String> {
    let err = body.get("error").filter(|e| is_set(e))?;
    let msg = err
        .get("data")
        .and_then(|d| d.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    Some(msg)
}

/// Normalize a message response: error first, then the first text part, else the placeholder.
pub fn normalize_response(body: &Value) -> RelayReply {
    if let Some(msg) = error_message(body) {
        log::error!("backend: {}", super::BackendError::Api(msg.clone()));
        return error_reply("OpenCode Error", &msg);
    }

    let parts = body.get("parts").and_then(|p| p.as_array());
    let text = parts.and_then(|parts| {
        parts
            .iter()
            .filter_map(|p| p.as_object())
            .find(|p| p.get("type").and_then(|t| t.as_str()) == Some("text"))
            .map(|p| p.get("text").and_then(|t| t.as_str()).unwrap_or(""))
    });
    match text {
        Some(text) => RelayReply::content(text),
        None => {
            if !body.is_object() {
                log::debug!("backend: response is not an object, using placeholder");
            }
            RelayReply::placeholder()
        }
    }
}
