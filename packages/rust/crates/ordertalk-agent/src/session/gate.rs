//! Per-session turn serialization.
//!
//! One async mutex per session key, created on first acquire and removed when
//! the last holder or waiter drops its guard. Unrelated keys never share a lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::observability::PipelineEvent;

use super::message::SessionKey;

type EntryMap = Arc<StdMutex<HashMap<SessionKey, Arc<SessionGateEntry>>>>;

#[derive(Default)]
struct SessionGateEntry {
    lock: Arc<Mutex<()>>,
    permits: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct SessionGate {
    inner: EntryMap,
}

/// Held for the duration of one turn.
pub struct SessionGuard {
    _lock_guard: OwnedMutexGuard<()>,
    _permit: SessionPermit,
}

struct SessionPermit {
    key: SessionKey,
    inner: EntryMap,
    entry: Arc<SessionGateEntry>,
}

impl SessionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn of `key` is running.
    pub async fn acquire(&self, key: &SessionKey) -> SessionGuard {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| Arc::new(SessionGateEntry::default()))
                .clone();
            // Counted under the map lock so a concurrent drop cannot evict this entry.
            entry.permits.fetch_add(1, Ordering::AcqRel);
            entry
        };
        let permit = SessionPermit {
            key: key.clone(),
            inner: Arc::clone(&self.inner),
            entry: Arc::clone(&entry),
        };

        let lock_guard = match Arc::clone(&entry.lock).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!(
                    event = PipelineEvent::SessionGateContended.as_str(),
                    session_key = %permit.key,
                    "session turn waiting for in-flight turn"
                );
                Arc::clone(&entry.lock).lock_owned().await
            }
        };
        SessionGuard {
            _lock_guard: lock_guard,
            _permit: permit,
        }
    }

    #[doc(hidden)]
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.entry.permits.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "session gate permit underflow");
        if previous != 1 {
            return;
        }
        let should_remove = map
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.entry));
        if should_remove {
            map.remove(&self.key);
        }
    }
}
