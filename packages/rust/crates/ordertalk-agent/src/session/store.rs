//! Session store: `(user_id, session_id)` → ordered message log.

use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;

use crate::config::SessionSettings;
use crate::observability::PipelineEvent;

use super::message::{Message, SessionKey};
use super::redis_backend::{DEFAULT_SESSION_KEY_PREFIX, RedisSessionBackend, ValkeySessionConfig};

/// Append-only message log keyed by session; in-memory unless a Valkey URL is configured.
///
/// The in-memory map is sharded, so unrelated sessions do not contend on one lock.
pub struct SessionStore {
    inner: DashMap<SessionKey, Vec<Message>>,
    redis: Option<Arc<RedisSessionBackend>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    fn from_redis_backend(redis: Option<Arc<RedisSessionBackend>>) -> Self {
        Self {
            inner: DashMap::new(),
            redis,
        }
    }

    /// In-memory store; logs live as long as the process.
    #[must_use]
    pub fn new() -> Self {
        Self::from_redis_backend(None)
    }

    /// Store selected from settings and `VALKEY_URL`.
    ///
    /// # Errors
    /// Fails when a Valkey URL is configured but cannot be parsed.
    pub fn from_settings(settings: &SessionSettings) -> Result<Self> {
        let Some(cfg) = ValkeySessionConfig::resolve(settings) else {
            return Ok(Self::new());
        };
        let backend =
            RedisSessionBackend::new(cfg).context("failed to initialize valkey session store")?;
        tracing::info!(
            event = PipelineEvent::SessionBackendEnabled.as_str(),
            key_prefix = %backend.key_prefix(),
            ttl_secs = ?backend.ttl_secs(),
            "session store backend enabled: valkey"
        );
        Ok(Self::from_redis_backend(Some(Arc::new(backend))))
    }

    /// Store with explicit Valkey backend parameters.
    ///
    /// # Errors
    /// Fails when `redis_url` cannot be parsed.
    pub fn new_with_valkey(
        redis_url: impl Into<String>,
        key_prefix: Option<String>,
        ttl_secs: Option<u64>,
    ) -> Result<Self> {
        let key_prefix = key_prefix
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_KEY_PREFIX.to_string());
        let backend = RedisSessionBackend::new(ValkeySessionConfig {
            url: redis_url.into(),
            key_prefix,
            ttl_secs: ttl_secs.filter(|v| *v > 0),
        })?;
        Ok(Self::from_redis_backend(Some(Arc::new(backend))))
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        if self.redis.is_some() { "valkey" } else { "memory" }
    }

    /// Append messages for a session in one step.
    ///
    /// # Errors
    /// Propagates Valkey failures.
    pub async fn append(&self, key: &SessionKey, messages: Vec<Message>) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let storage_key = key.storage_key();
        if let Some(ref redis) = self.redis {
            redis
                .append_messages(&storage_key, &messages)
                .await
                .with_context(|| format!("valkey session append failed for session={key}"))?;
            tracing::debug!(
                event = PipelineEvent::SessionMessagesAppended.as_str(),
                session_key = %storage_key,
                appended_messages = messages.len(),
                backend = "valkey",
                "session messages appended"
            );
            return Ok(());
        }
        let total_messages = {
            let mut entry = self.inner.entry(key.clone()).or_default();
            entry.extend(messages);
            entry.len()
        };
        tracing::debug!(
            event = PipelineEvent::SessionMessagesAppended.as_str(),
            session_key = %storage_key,
            total_messages,
            backend = "memory",
            "session messages appended"
        );
        Ok(())
    }

    /// Copy of the full log in append order.
    ///
    /// # Errors
    /// Propagates Valkey failures.
    pub async fn get(&self, key: &SessionKey) -> Result<Vec<Message>> {
        let storage_key = key.storage_key();
        let (messages, backend) = if let Some(ref redis) = self.redis {
            let messages = redis
                .get_messages(&storage_key)
                .await
                .with_context(|| format!("valkey session read failed for session={key}"))?;
            (messages, "valkey")
        } else {
            let messages = self
                .inner
                .get(key)
                .map(|entry| entry.value().clone())
                .unwrap_or_default();
            (messages, "memory")
        };
        tracing::debug!(
            event = PipelineEvent::SessionMessagesLoaded.as_str(),
            session_key = %storage_key,
            loaded_messages = messages.len(),
            backend,
            "session messages loaded"
        );
        Ok(messages)
    }

    /// Message count without loading payloads.
    ///
    /// # Errors
    /// Propagates Valkey failures.
    pub async fn len(&self, key: &SessionKey) -> Result<usize> {
        let storage_key = key.storage_key();
        if let Some(ref redis) = self.redis {
            return redis
                .get_messages_len(&storage_key)
                .await
                .with_context(|| format!("valkey session length read failed for session={key}"));
        }
        Ok(self.inner.get(key).map_or(0, |entry| entry.len()))
    }

    /// Drop the whole log; clearing an empty session succeeds.
    ///
    /// # Errors
    /// Propagates Valkey failures.
    pub async fn clear(&self, key: &SessionKey) -> Result<()> {
        let storage_key = key.storage_key();
        let backend = if let Some(ref redis) = self.redis {
            redis
                .clear_messages(&storage_key)
                .await
                .with_context(|| format!("valkey session clear failed for session={key}"))?;
            "valkey"
        } else {
            self.inner.remove(key);
            "memory"
        };
        tracing::debug!(
            event = PipelineEvent::SessionMessagesCleared.as_str(),
            session_key = %storage_key,
            backend,
            "session messages cleared"
        );
        Ok(())
    }
}
