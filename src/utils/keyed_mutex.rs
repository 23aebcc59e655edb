use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async mutex. Bulk file operations lock the acting user's key so
/// two concurrent bulk requests from the same user serialize, while other
/// users proceed unhindered.
#[derive(Debug, Clone, Default)]
pub struct KeyedMutex {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`; released when the guard drops. Entries
    /// stay in the map until `cleanup` runs, which is fine for the number
    /// of distinct users a single deployment sees.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        mutex.lock_owned().await
    }

    /// Drop map entries whose mutex no task currently holds.
    pub fn cleanup(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let m = KeyedMutex::new();
        let g1 = m.lock("user-a").await;
        // A second lock on the same key must not be available yet
        let m2 = m.clone();
        let pending = tokio::spawn(async move { m2.lock("user-a").await });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());
        drop(g1);
        pending.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_independent() {
        let m = KeyedMutex::new();
        let _g1 = m.lock("user-a").await;
        // Different key locks immediately
        let _g2 = m.lock("user-b").await;
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_entries() {
        let m = KeyedMutex::new();
        drop(m.lock("user-a").await);
        m.cleanup();
        assert!(m.locks.is_empty());
    }
}
