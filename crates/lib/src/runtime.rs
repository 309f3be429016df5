//! Process-level wiring: build the bridge from config, run polling mode, wait for shutdown.

use crate::backend::OpencodeClient;
use crate::bridge::Bridge;
use crate::channels::TelegramChannel;
use crate::config::Config;
use crate::poller::Poller;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Build the OpenCode client, the Telegram client, and the bridge over both.
/// Fails when no bot token is configured.
pub fn build_bridge(config: &Config) -> Result<(Arc<Bridge>, Arc<TelegramChannel>)> {
    let token = config.require_bot_token()?;
    let backend =
        Arc::new(OpencodeClient::new(&config.backend).context("building OpenCode client")?);
    let telegram = Arc::new(
        TelegramChannel::with_api_base(token, &config.telegram.api_base)
            .context("building Telegram client")?,
    );
    let bridge = Arc::new(Bridge::new(backend, telegram.clone()));
    log::info!("bridge: relaying to OpenCode at {}", config.backend.base_url);
    Ok((bridge, telegram))
}

/// Run polling mode until SIGINT/SIGTERM.
pub async fn run_polling(config: Config) -> Result<()> {
    let (bridge, telegram) = build_bridge(&config)?;
    // getUpdates is rejected while a webhook is registered.
    if let Err(e) = telegram.delete_webhook().await {
        log::warn!("telegram delete_webhook failed: {}", e);
    }
    let poller = Poller::new(bridge, &config.polling);
    log::info!("starting Telegram bot with polling...");
    tokio::select! {
        _ = poller.run() => {}
        _ = shutdown_signal() => {
            poller.stop();
            log::info!("bot stopped by signal");
        }
    }
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_bot_token() {
        assert!(build_bridge(&Config::default()).is_err());
    }

    #[test]
    fn build_with_token() {
        let mut config = Config::default();
        config.telegram.bot_token = Some("123:abc".to_string());
        assert!(build_bridge(&config).is_ok());
    }
}
