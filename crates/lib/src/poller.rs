//! Polling mode: long-poll getUpdates and hand each update to the bridge.
//!
//! The offset advances right after each update is handled, so a crash mid-batch does not
//! redeliver what was already answered. A failed fetch keeps the offset and retries after
//! a fixed backoff.

use crate::bridge::Bridge;
use crate::channels::{Transport, TransportError};
use crate::config::PollingConfig;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Poller {
    bridge: Arc<Bridge>,
    transport: Arc<dyn Transport>,
    offset: AtomicI64,
    running: AtomicBool,
    poll_timeout_secs: u64,
    backoff: Duration,
}

impl Poller {
    pub fn new(bridge: Arc<Bridge>, config: &PollingConfig) -> Self {
        let transport = bridge.transport().clone();
        Self {
            bridge,
            transport,
            offset: AtomicI64::new(0),
            running: AtomicBool::new(true),
            poll_timeout_secs: config.timeout_secs,
            backoff: Duration::from_secs(config.backoff_secs),
        }
    }

    /// Next update id to request.
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop after the current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Fetch one batch and handle it in order. Returns how many updates were handled.
    pub async fn poll_once(&self) -> Result<usize, TransportError> {
        let updates = self
            .transport
            .get_updates(self.offset(), self.poll_timeout_secs)
            .await?;
        let n = updates.len();
        for update in updates {
            self.bridge.handle_update(&update).await;
            self.offset.store(update.update_id + 1, Ordering::SeqCst);
        }
        Ok(n)
    }

    /// Poll until [`Poller::stop`] is called.
    pub async fn run(&self) {
        log::info!("poller: starting getUpdates long-poll loop");
        while self.running() {
            match self.poll_once().await {
                Ok(0) => {}
                Ok(n) => log::debug!("poller: handled {} update(s), offset {}", n, self.offset()),
                Err(e) => {
                    log::error!("poller: error polling updates: {}", e);
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
        log::info!("poller: getUpdates loop stopped");
    }

    /// Spawn [`Poller::run`] on the runtime.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
