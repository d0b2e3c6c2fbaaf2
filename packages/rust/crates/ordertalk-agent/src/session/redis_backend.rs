//! Valkey/Redis list backend for session logs shared across gateway instances.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::config::SessionSettings;
use crate::observability::PipelineEvent;

use super::message::Message;

pub(crate) const DEFAULT_SESSION_KEY_PREFIX: &str = "ordertalk:session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValkeySessionConfig {
    pub(crate) url: String,
    pub(crate) key_prefix: String,
    pub(crate) ttl_secs: Option<u64>,
}

impl ValkeySessionConfig {
    /// `VALKEY_URL` wins over `session.valkey_url`; `None` keeps the in-memory store.
    pub(crate) fn resolve(settings: &SessionSettings) -> Option<Self> {
        let url = std::env::var("VALKEY_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                settings
                    .valkey_url
                    .as_deref()
                    .map(str::trim)
                    .map(str::to_string)
                    .filter(|v| !v.is_empty())
            })?;
        let key_prefix = settings
            .key_prefix
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_SESSION_KEY_PREFIX)
            .to_string();
        Some(Self {
            url,
            key_prefix,
            ttl_secs: settings.ttl_secs.filter(|v| *v > 0),
        })
    }
}

#[derive(Debug)]
pub(crate) struct RedisSessionBackend {
    client: redis::Client,
    key_prefix: String,
    ttl_secs: Option<u64>,
    connection: Arc<Mutex<Option<redis::aio::MultiplexedConnection>>>,
}

impl RedisSessionBackend {
    pub(crate) fn new(cfg: ValkeySessionConfig) -> Result<Self> {
        let client = redis::Client::open(cfg.url.as_str())
            .with_context(|| format!("invalid redis url for session backend: {}", cfg.url))?;
        Ok(Self {
            client,
            key_prefix: cfg.key_prefix,
            ttl_secs: cfg.ttl_secs,
            connection: Arc::new(Mutex::new(None)),
        })
    }

    pub(crate) fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub(crate) fn ttl_secs(&self) -> Option<u64> {
        self.ttl_secs
    }

    fn messages_key(&self, storage_key: &str) -> String {
        format!("{}:messages:{}", self.key_prefix, storage_key)
    }

    /// Shared multiplexed connection, opened on first use; the lock is released before any command runs.
    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let mut slot = self.connection.lock().await;
        if let Some(ref conn) = *slot {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("failed to open redis connection for session backend")?;
        tracing::debug!(
            event = PipelineEvent::SessionValkeyConnected.as_str(),
            key_prefix = %self.key_prefix,
            "valkey session backend connected"
        );
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Runs `exec` once, and once more on a fresh connection if the first attempt fails.
    async fn run<T, F, Fut>(&self, operation: &'static str, exec: F) -> Result<T>
    where
        F: Fn(redis::aio::MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..2 {
            let conn = self.connection().await?;
            match exec(conn).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(
                        event = PipelineEvent::SessionValkeyCommandRetryFailed.as_str(),
                        operation,
                        attempt = attempt + 1,
                        error = %err,
                        "valkey command attempt failed; reconnecting"
                    );
                    *self.connection.lock().await = None;
                    last_err = Some(
                        anyhow::anyhow!(err).context("redis command failed for session backend"),
                    );
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("redis command failed for unknown reason")))
    }

    /// RPUSH all messages and refresh the TTL in one MULTI/EXEC.
    pub(crate) async fn append_messages(&self, storage_key: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let key = self.messages_key(storage_key);
        let encoded: Vec<String> = messages
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to encode session messages for redis")?;
        let ttl_secs = self.ttl_secs;

        self.run("append_messages", |mut conn| {
            let mut pipe = redis::pipe();
            pipe.atomic();
            pipe.cmd("RPUSH").arg(&key);
            for payload in &encoded {
                pipe.arg(payload);
            }
            pipe.ignore();
            if let Some(ttl) = ttl_secs {
                pipe.cmd("EXPIRE").arg(&key).arg(ttl).ignore();
            }
            async move { pipe.query_async::<()>(&mut conn).await }
        })
        .await
    }

    pub(crate) async fn get_messages(&self, storage_key: &str) -> Result<Vec<Message>> {
        let key = self.messages_key(storage_key);
        let payloads = self
            .run("get_messages", |mut conn| {
                let mut cmd = redis::cmd("LRANGE");
                cmd.arg(&key).arg(0).arg(-1);
                async move { cmd.query_async::<Vec<String>>(&mut conn).await }
            })
            .await?;
        let mut out = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match serde_json::from_str::<Message>(&payload) {
                Ok(message) => out.push(message),
                Err(error) => {
                    tracing::warn!(
                        event = PipelineEvent::SessionMessageDecodeFailed.as_str(),
                        session_key = storage_key,
                        error = %error,
                        "dropping undecodable message payload from valkey session store"
                    );
                }
            }
        }
        Ok(out)
    }

    pub(crate) async fn get_messages_len(&self, storage_key: &str) -> Result<usize> {
        let key = self.messages_key(storage_key);
        self.run("get_messages_len", |mut conn| {
            let mut cmd = redis::cmd("LLEN");
            cmd.arg(&key);
            async move { cmd.query_async::<usize>(&mut conn).await }
        })
        .await
    }

    pub(crate) async fn clear_messages(&self, storage_key: &str) -> Result<()> {
        let key = self.messages_key(storage_key);
        let _ = self
            .run("clear_messages", |mut conn| {
                let mut cmd = redis::cmd("DEL");
                cmd.arg(&key);
                async move { cmd.query_async::<i64>(&mut conn).await }
            })
            .await?;
        Ok(())
    }
}
