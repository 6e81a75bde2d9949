use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per key currently in use. Entries are dropped when the last
/// holder or waiter for a key goes away.
pub(crate) struct KeyLocks<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Hash + Eq + Clone> KeyLocks<K> {
    pub(crate) fn new() -> Self {
        KeyLocks {
            slots: Mutex::new(HashMap::new()),
        }
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn slots(&self) -> MutexGuard<'_, HashMap<K, Arc<AsyncMutex<()>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) async fn lock(&self, key: &K) -> KeyGuard<'_, K> {
        // Created before waiting so a cancelled wait still releases the slot.
        // The pending `lock_owned` future is dropped first and gives back its
        // reference to the slot before `pending` checks whether it is idle.
        let mut pending = KeyGuard {
            locks: self,
            key: key.clone(),
            guard: None,
        };
        let slot = self.slots().entry(key.clone()).or_default().clone();
        pending.guard = Some(slot.lock_owned().await);
        pending
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots().len()
    }
}

pub(crate) struct KeyGuard<'a, K: Hash + Eq + Clone> {
    locks: &'a KeyLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<'a, K: Hash + Eq + Clone> Drop for KeyGuard<'a, K> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.locks.slots();
        let idle = slots
            .get(&self.key)
            .map(|slot| Arc::strong_count(slot) == 1)
            .unwrap_or(false);
        if idle {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[tokio::test]
    async fn released_keys_are_forgotten() {
        let locks = KeyLocks::new();
        {
            let _a = locks.lock(&"a").await;
            let _b = locks.lock(&"b").await;
            assert_eq!(locks.len(), 2);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = KeyLocks::new();
        let events = Rc::new(RefCell::new(Vec::new()));

        let first = async {
            let _g = locks.lock(&1).await;
            events.borrow_mut().push("first in");
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            events.borrow_mut().push("first out");
        };
        let second = async {
            tokio::task::yield_now().await;
            let _g = locks.lock(&1).await;
            events.borrow_mut().push("second in");
        };
        futures::join!(first, second);

        assert_eq!(*events.borrow(), vec!["first in", "first out", "second in"]);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn cancelled_waiter_releases_slot() {
        let locks = KeyLocks::new();
        let held = locks.lock(&1).await;
        let mut waiter = Box::pin(locks.lock(&1));
        assert!(futures::poll!(&mut waiter).is_pending());

        drop(held);
        assert_eq!(locks.len(), 1);
        drop(waiter);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn cancelled_waiter_keeps_holder_slot() {
        let locks = KeyLocks::new();
        let held = locks.lock(&1).await;
        let mut waiter = Box::pin(locks.lock(&1));
        assert!(futures::poll!(&mut waiter).is_pending());

        drop(waiter);
        assert_eq!(locks.len(), 1);
        drop(held);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let locks = KeyLocks::new();
        let _a = locks.lock(&1).await;
        let _b = locks.lock(&2).await;
        assert_eq!(locks.len(), 2);
    }
}
