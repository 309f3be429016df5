//! Telegram channel: getUpdates, sendMessage, sendChatAction and webhook registration via the Bot API.

use crate::channels::transport::{Transport, TransportError};
use crate::config::DEFAULT_API_BASE;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Slack on top of the long-poll timeout so the HTTP client does not abort first.
const CLIENT_TIMEOUT_SLACK_SECS: u64 = 15;

/// Timeout for every call except getUpdates, which sets its own.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram update payload (getUpdates result item or webhook POST body).
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// Telegram Bot API client.
pub struct TelegramChannel {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Client against a custom Bot API base (local Bot API server, tests).
    pub fn with_api_base(
        token: impl Into<String>,
        api_base: &str,
    ) -> Result<Self, TransportError> {
        Self::with_request_timeout(token, api_base, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Like [`TelegramChannel::with_api_base`] with an explicit timeout for non-polling calls.
    pub fn with_request_timeout(
        token: impl Into<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// POST a Bot API method with a JSON body; fails on non-2xx or `ok: false`.
    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let res = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        parse_api_response(method, res).await
    }

    /// Set webhook URL (and optional secret). Telegram then POSTs updates there instead of getUpdates.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TransportError> {
        let mut body = json!({ "url": url });
        if let Some(s) = secret {
            body["secret_token"] = serde_json::Value::String(s.to_string());
        }
        self.call("setWebhook", body).await.map(|_| ())
    }

    /// Remove webhook so the bot can use getUpdates again.
    pub async fn delete_webhook(&self) -> Result<(), TransportError> {
        self.call("deleteWebhook", json!({})).await.map(|_| ())
    }
}

async fn parse_api_response<T: serde::de::DeserializeOwned>(
    method: &str,
    res: reqwest::Response,
) -> Result<T, TransportError> {
    let status = res.status();
    let text = res.text().await?;
    let data: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
        TransportError::Api(format!("{} returned {} with unreadable body: {}", method, status, e))
    })?;
    if !status.is_success() || !data.ok {
        return Err(TransportError::Api(format!(
            "{} failed: {} {}",
            method,
            status,
            data.description.unwrap_or_default()
        )));
    }
    data.result
        .ok_or_else(|| TransportError::Api(format!("{} returned no result", method)))
}

#[async_trait]
impl Transport for TelegramChannel {
    /// GET getUpdates (long poll).
    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, TransportError> {
        let res = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("offset", offset.to_string()), ("timeout", timeout_secs.to_string())])
            .timeout(Duration::from_secs(timeout_secs + CLIENT_TIMEOUT_SLACK_SECS))
            .send()
            .await?;
        parse_api_response("getUpdates", res).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
            .map(|_| ())
    }

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TransportError> {
        self.call("sendChatAction", json!({ "chat_id": chat_id, "action": action }))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_joins_base_token_and_method() {
        let t = TelegramChannel::with_api_base("123:abc", "http://127.0.0.1:9/").unwrap();
        assert_eq!(t.method_url("getUpdates"), "http://127.0.0.1:9/bot123:abc/getUpdates");
    }

    #[test]
    fn update_ignores_unknown_fields() {
        let u: TelegramUpdate = serde_json::from_str(
            r#"{"update_id":9,"edited_message":{"chat":{"id":1}},"message":{"chat":{"id":3,"title":"x"},"text":"t","entities":[]}}"#,
        )
        .unwrap();
        assert_eq!(u.update_id, 9);
        assert_eq!(u.message.unwrap().chat.id, 3);
    }

    #[tokio::test]
    async fn request_failure_does_not_expose_the_token() {
        let t = TelegramChannel::with_api_base("123456:SECRET-TOKEN", "http://127.0.0.1:1").unwrap();
        let err = t.get_updates(0, 1).await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
        assert!(!err.to_string().contains("SECRET-TOKEN"), "{}", err);
        assert!(!format!("{:?}", err).contains("SECRET-TOKEN"), "{:?}", err);

        let err = t.send_message(1, "hi").await.unwrap_err();
        assert!(!err.to_string().contains("SECRET-TOKEN"), "{}", err);
        let err = t.delete_webhook().await.unwrap_err();
        assert!(!err.to_string().contains("SECRET-TOKEN"), "{}", err);
    }
}
