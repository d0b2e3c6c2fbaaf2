use std::sync::Arc;

use anyhow::Result;

use super::message::{Message, SessionKey};
use super::store::SessionStore;

/// Request-scoped view of one session's log.
#[derive(Clone)]
pub struct SessionMemory {
    store: Arc<SessionStore>,
    key: SessionKey,
}

impl SessionMemory {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, key: SessionKey) -> Self {
        Self { store, key }
    }

    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn history(&self) -> Result<Vec<Message>> {
        self.store.get(&self.key).await
    }

    /// Persist one completed turn: user, optional stage trace, assistant.
    ///
    /// # Errors
    /// Propagates store failures; nothing is written partially.
    pub async fn append_exchange(
        &self,
        user: Message,
        stage_trace: Option<Message>,
        assistant: Message,
    ) -> Result<()> {
        let mut batch = Vec::with_capacity(3);
        batch.push(user);
        batch.extend(stage_trace);
        batch.push(assistant);
        self.store.append(&self.key, batch).await
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear(&self.key).await
    }
}
