//! Session registry: chat identity -> OpenCode session id.
//!
//! Sessions are created lazily on first use and live until reset or process exit.
//! Each identity owns a slot with a turn lock: resolve-or-create, reset and a whole relay
//! (see [`SessionRegistry::lease`]) hold it, so one user's operations run one at a time while
//! other users proceed in parallel. The stored id sits behind a separate lock that is never
//! held across a backend call, so inspection does not wait for in-flight turns.

use crate::backend::{Backend, BackendError, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Stable identifier of a message originator (Telegram user id).
pub type ChatIdentity = i64;

#[derive(Default)]
struct Slot {
    turn: Arc<Mutex<()>>,
    session: RwLock<Option<SessionId>>,
}

/// A resolved session plus exclusive use of its identity's slot until dropped.
/// A reset for the same identity waits until the lease is released.
pub struct SessionLease {
    id: SessionId,
    _turn: OwnedMutexGuard<()>,
}

impl SessionLease {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// In-memory identity -> session map that creates sessions through a [`Backend`].
pub struct SessionRegistry {
    backend: Arc<dyn Backend>,
    slots: RwLock<HashMap<ChatIdentity, Arc<Slot>>>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            slots: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, identity: ChatIdentity) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().await.get(&identity) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(identity)
            .or_default()
            .clone()
    }

    async fn existing(&self, identity: ChatIdentity) -> Option<Arc<Slot>> {
        self.slots.read().await.get(&identity).cloned()
    }

    /// Existing or newly created session for `identity`, held until the lease is dropped.
    /// A failed creation stores nothing.
    pub async fn lease(&self, identity: ChatIdentity) -> Result<SessionLease, BackendError> {
        let slot = self.slot(identity).await;
        let turn = slot.turn.clone().lock_owned().await;
        let current = slot.session.read().await.clone();
        let id = match current {
            Some(id) => id,
            None => {
                log::info!("session: creating new session for user {}", identity);
                let id = self.backend.create_session().await?;
                *slot.session.write().await = Some(id.clone());
                id
            }
        };
        Ok(SessionLease { id, _turn: turn })
    }

    /// Existing session for `identity`, or a newly created one. A failed creation stores nothing.
    pub async fn resolve(&self, identity: ChatIdentity) -> Result<SessionId, BackendError> {
        Ok(self.lease(identity).await?.id)
    }

    /// Drop the session for `identity`, returning the old id. Does not create a replacement.
    /// Waits for an outstanding lease on the same identity.
    pub async fn reset(&self, identity: ChatIdentity) -> Option<SessionId> {
        let slot = self.existing(identity).await?;
        let _turn = slot.turn.lock().await;
        let old = slot.session.write().await.take();
        if let Some(ref id) = old {
            log::info!("session: reset session for user {} (was {})", identity, id);
        }
        old
    }

    /// Current session for `identity` without creating one.
    pub async fn get(&self, identity: ChatIdentity) -> Option<SessionId> {
        let slot = self.existing(identity).await?;
        let id = slot.session.read().await.clone();
        id
    }

    /// Number of identities with a live session.
    pub async fn len(&self) -> usize {
        let slots: Vec<Arc<Slot>> = self.slots.read().await.values().cloned().collect();
        let mut n = 0;
        for slot in slots {
            if slot.session.read().await.is_some() {
                n += 1;
            }
        }
        n
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
