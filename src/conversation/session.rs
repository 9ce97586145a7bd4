//! Reused assistant and thread identifiers.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// Identifiers of the remote assistant and thread reused across turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIds {
    pub assistant_id: Option<String>,
    pub thread_id: Option<String>,
}

impl SessionIds {
    pub fn new(assistant_id: Option<String>, thread_id: Option<String>) -> Self {
        Self {
            assistant_id: assistant_id.filter(|s| !s.trim().is_empty()),
            thread_id: thread_id.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Shared holder of the process-wide [`SessionIds`].
///
/// A turn holds the lock from lookup to completion, so create-if-absent
/// paths never race and a thread never has two active runs.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<SessionIds>>,
}

impl SessionStore {
    pub fn new(ids: SessionIds) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ids)),
        }
    }

    /// Lock the identifiers for the duration of a turn.
    pub async fn lock(&self) -> MutexGuard<'_, SessionIds> {
        self.inner.lock().await
    }

    /// Copy of the current identifiers.
    pub async fn snapshot(&self) -> SessionIds {
        self.inner.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_ids_are_unset() {
        let ids = SessionIds::new(Some("  ".to_string()), Some("thread_1".to_string()));
        assert_eq!(ids.assistant_id, None);
        assert_eq!(ids.thread_id.as_deref(), Some("thread_1"));
    }

    #[tokio::test]
    async fn test_store_updates_are_shared() {
        let store = SessionStore::new(SessionIds::default());
        let other = store.clone();

        other.lock().await.thread_id = Some("thread_9".to_string());
        assert_eq!(store.snapshot().await.thread_id.as_deref(), Some("thread_9"));
    }
}
