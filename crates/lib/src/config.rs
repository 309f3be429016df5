//! Configuration types and loading.
//!
//! Config is loaded from an optional JSON file (e.g. `~/.tgbridge/config.json`) and then
//! overridden from the environment (`BOT_TOKEN`, `OPENCODE_URL`, ...). Every field has a
//! default except the bot token and, in webhook mode, the public webhook URL.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Telegram bot settings (token, webhook).
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// OpenCode backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Listener for webhook mode.
    #[serde(default)]
    pub server: ServerConfig,

    /// getUpdates loop tuning for polling mode.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Bot token from BotFather. Overridden by BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// Public base URL Telegram should POST updates to (webhook mode only). The webhook path is appended.
    pub webhook_url: Option<String>,
    /// Optional secret checked against X-Telegram-Bot-Api-Secret-Token on every webhook POST.
    pub webhook_secret: Option<String>,
    /// Path the webhook is served on (default "/webhook").
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    /// Bot API base (default https://api.telegram.org). Overridden by TELEGRAM_API_BASE.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

/// OpenCode backend config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL of the OpenCode server (default http://localhost:4096).
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Model as "provider/model" (e.g. "opencode/glm-4.7-free"). None omits the model from requests.
    #[serde(default = "default_model")]
    pub default_model: Option<String>,
    /// Agent name sent with every message.
    #[serde(default = "default_agent")]
    pub agent: String,
    /// Title given to sessions created by the bridge.
    #[serde(default = "default_session_title")]
    pub session_title: String,
    /// Per-request timeout; agent turns can take minutes.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Webhook listener bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address (default "0.0.0.0").
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port (default 8443). Overridden by PORT env.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Long-poll settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    /// Seconds Telegram holds a getUpdates request open.
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
    /// Delay before retrying after a failed getUpdates.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_backend_url() -> String {
    "http://localhost:4096".to_string()
}

fn default_model() -> Option<String> {
    Some("opencode/glm-4.7-free".to_string())
}

fn default_agent() -> String {
    "sisyphus".to_string()
}

fn default_session_title() -> String {
    "Telegram Session".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8443
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_backoff_secs() -> u64 {
    5
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            webhook_url: None,
            webhook_secret: None,
            webhook_path: default_webhook_path(),
            api_base: default_api_base(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            default_model: default_model(),
            agent: default_agent(),
            session_title: default_session_title(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout_secs(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Config {
    /// Apply environment overrides. `lookup` returns the raw value of a variable, if set.
    ///
    /// Blank values are ignored, except `DEFAULT_MODEL` where a blank value clears the model.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(token) = non_empty(lookup("BOT_TOKEN")) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(url) = non_empty(lookup("WEBHOOK_URL")) {
            self.telegram.webhook_url = Some(url);
        }
        if let Some(secret) = non_empty(lookup("WEBHOOK_SECRET")) {
            self.telegram.webhook_secret = Some(secret);
        }
        if let Some(base) = non_empty(lookup("TELEGRAM_API_BASE")) {
            self.telegram.api_base = base;
        }
        if let Some(url) = non_empty(lookup("OPENCODE_URL")) {
            self.backend.base_url = url;
        }
        if let Some(model) = lookup("DEFAULT_MODEL") {
            self.backend.default_model = non_empty(Some(model));
        }
        if let Some(port) = non_empty(lookup("PORT")) {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {:?}", port))?;
        }
        Ok(())
    }

    /// The bot token, or an error when none is configured.
    pub fn require_bot_token(&self) -> Result<String> {
        non_empty(self.telegram.bot_token.clone())
            .context("BOT_TOKEN environment variable is required")
    }

    /// Full URL to register with setWebhook: webhook_url + webhook_path.
    pub fn require_webhook_endpoint(&self) -> Result<String> {
        let base = non_empty(self.telegram.webhook_url.clone())
            .context("WEBHOOK_URL environment variable is required for webhook mode")?;
        Ok(format!(
            "{}{}",
            base.trim_end_matches('/'),
            normalized_path(&self.telegram.webhook_path)
        ))
    }

    /// Configured webhook secret, if any (blank counts as unset).
    pub fn webhook_secret(&self) -> Option<String> {
        non_empty(self.telegram.webhook_secret.clone())
    }
}

/// Ensure a route path starts with exactly one '/'.
pub fn normalized_path(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/'))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TGBRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".tgbridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Environment overrides are applied on top.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}
