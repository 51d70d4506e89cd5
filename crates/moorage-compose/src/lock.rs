//! In-process mutual exclusion keyed by project.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per key. Different keys never contend.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`. The guard releases on drop.
    pub async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Like [`acquire`](Self::acquire), but the entry is forgotten when the
    /// guard drops, including when the holding future is cancelled.
    pub async fn acquire_scoped(&self, key: &K) -> ScopedGuard<'_, K> {
        let guard = self.acquire(key).await;
        ScopedGuard {
            locks: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    /// Drop the entry for `key` once nothing else holds or waits on it.
    pub fn forget(&self, key: &K) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lock) = locks.get(key)
            && Arc::strong_count(lock) == 1
        {
            locks.remove(key);
        }
    }
}

/// Guard from [`KeyedLocks::acquire_scoped`].
pub struct ScopedGuard<'a, K: Eq + Hash + Clone> {
    locks: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for ScopedGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.forget(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialised() {
        let locks = Arc::new(KeyedLocks::<i64>::new());
        let guard = locks.acquire(&1).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = KeyedLocks::<i64>::new();
        let _first = locks.acquire(&1).await;

        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&2)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_forget_keeps_held_locks() {
        let locks = KeyedLocks::<String>::new();
        let key = "blog".to_string();

        let guard = locks.acquire(&key).await;
        locks.forget(&key);
        assert_eq!(locks.locks.lock().unwrap().len(), 1);

        drop(guard);
        locks.forget(&key);
        assert!(locks.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scoped_guard_forgets_on_drop() {
        let locks = KeyedLocks::<String>::new();
        let key = "blog".to_string();

        let guard = locks.acquire_scoped(&key).await;
        assert_eq!(locks.locks.lock().unwrap().len(), 1);

        drop(guard);
        assert!(locks.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scoped_guard_keeps_entry_for_waiter() {
        let locks = Arc::new(KeyedLocks::<String>::new());
        let key = "blog".to_string();

        let guard = locks.acquire_scoped(&key).await;
        let waiter = {
            let locks = locks.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&key).await;
                tokio::time::sleep(Duration::from_millis(50)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.locks.lock().unwrap().len(), 1);
        waiter.await.unwrap();
    }
}
