//! OpenCode server client (http://localhost:4096 by default).

use crate::backend::{Backend, BackendError, SessionId};
use crate::config::BackendConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const FALLBACK_PROVIDER: &str = "opencode";
const FALLBACK_MODEL: &str = "glm-4.7-free";

/// Model selector sent with each message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRef {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    #[serde(rename = "modelID")]
    pub model_id: String,
}

/// Parse "provider/model". Anything that is not exactly two segments falls back to the free default model.
pub fn parse_model(s: &str) -> ModelRef {
    let parts: Vec<&str> = s.split('/').collect();
    match parts.as_slice() {
        [provider, model] => ModelRef {
            provider_id: provider.to_string(),
            model_id: model.to_string(),
        },
        _ => ModelRef {
            provider_id: FALLBACK_PROVIDER.to_string(),
            model_id: FALLBACK_MODEL.to_string(),
        },
    }
}

/// Client for the OpenCode HTTP API.
#[derive(Clone)]
pub struct OpencodeClient {
    base_url: String,
    agent: String,
    model: Option<ModelRef>,
    session_title: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a ModelRef>,
    agent: &'a str,
    parts: Vec<TextPart<'a>>,
}

impl OpencodeClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent: config.agent.clone(),
            model: config.default_model.as_deref().map(parse_model),
            session_title: config.session_title.clone(),
            client,
        })
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.client.post(&url).json(body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(BackendError::Unavailable(format!(
                "POST {} returned {} {}",
                path, status, body
            )));
        }
        Ok(res)
    }
}

#[async_trait]
impl Backend for OpencodeClient {
    /// POST /session: create a session titled with the configured title.
    async fn create_session(&self) -> Result<SessionId, BackendError> {
        let res = self
            .post_json(
                "/session",
                &CreateSessionRequest {
                    title: &self.session_title,
                },
            )
            .await?;
        let data: CreateSessionResponse = res
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        data.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BackendError::Malformed("session response has no id".to_string()))
    }

    /// POST /session/{id}/message: one text part, configured agent and model.
    async fn post_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<serde_json::Value, BackendError> {
        let body = MessageRequest {
            model: self.model.as_ref(),
            agent: &self.agent,
            parts: vec![TextPart { typ: "text", text }],
        };
        let res = self
            .post_json(&format!("/session/{}/message", session_id), &body)
            .await?;
        // A body that is not JSON degrades to the placeholder reply rather than an error.
        let raw = res.text().await?;
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::debug!("backend: message response is not JSON: {}", e);
            serde_json::Value::Null
        }))
    }
}
