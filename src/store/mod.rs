use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;

pub mod changelog;

pub use changelog::ChangelogStore;

/// Keyed state backing a join.
///
/// Absent keys must read as `None`. A store that hands out a default value for
/// missing keys reports it through [`KVStore::has_default`] and is refused by
/// [`crate::joiner`].
///
/// Writes must be atomic per key, and a `put` must be visible to the next
/// `get` issued through the same instance.
#[async_trait(? Send)]
pub trait KVStore<K, V> {
    async fn get(&self, key: &K) -> Result<Option<V>, StoreError>;
    async fn put(&self, key: K, value: V) -> Result<Option<V>, StoreError>;
    async fn delete(&self, key: &K) -> Result<Option<V>, StoreError>;

    fn has_default(&self) -> bool {
        false
    }
}

/// Plain `HashMap` store, used in tests and for state that doesn't need to
/// outlive the process.
#[derive(Debug)]
pub struct InMemory<K: Hash + Eq, V> {
    inner: Mutex<HashMap<K, V>>,
    default: Option<V>,
}

impl<K: Hash + Eq, V: Clone> InMemory<K, V> {
    pub fn new() -> Self {
        InMemory {
            inner: Mutex::new(HashMap::new()),
            default: None,
        }
    }

    /// A store that answers lookups of absent keys with `default`.
    /// Joins reject it.
    pub fn with_default(default: V) -> Self {
        InMemory {
            inner: Mutex::new(HashMap::new()),
            default: Some(default),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<K, V>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    // Inspection reads through a poisoned lock: every mutation is a single
    // map call, so the contents are whole even when `get`/`put` refuse them.
    fn inspect(&self) -> MutexGuard<'_, HashMap<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.inspect().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inspect().contains_key(key)
    }

    /// Copy of the stored value for `key`, bypassing any default.
    pub fn snapshot(&self, key: &K) -> Option<V> {
        self.inspect().get(key).cloned()
    }
}

impl<K: Hash + Eq, V: Clone> Default for InMemory<K, V> {
    fn default() -> Self {
        InMemory::new()
    }
}

#[async_trait(? Send)]
impl<K: Hash + Eq, V: Clone> KVStore<K, V> for InMemory<K, V> {
    async fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.get(key).cloned().or_else(|| self.default.clone()))
    }

    async fn put(&self, key: K, value: V) -> Result<Option<V>, StoreError> {
        Ok(self.lock()?.insert(key, value))
    }

    async fn delete(&self, key: &K) -> Result<Option<V>, StoreError> {
        Ok(self.lock()?.remove(key))
    }

    fn has_default(&self) -> bool {
        self.default.is_some()
    }
}
