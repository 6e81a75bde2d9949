use std::hash::Hash;

use crate::error::{ConfigurationError, StoreError};
use crate::join::lock::KeyLocks;
use crate::join::policy::{JoinPolicy, Retention};
use crate::store::KVStore;

/// Builds a [`Joiner`] over `store`.
///
/// Fails when the store answers absent keys with a default value, since the
/// first message of a group could then never be told apart from a stored one.
pub fn joiner<M, K, V, R, S>(policy: JoinPolicy<M, K, V, R>, store: S) -> Result<Joiner<M, K, V, R, S>, ConfigurationError>
    where K: Hash + Eq + Clone,
          S: KVStore<K, V>
{
    if store.has_default() {
        warn!("Refusing to join over a store with a default value");
        return Err(ConfigurationError::DefaultValue);
    }
    Ok(Joiner {
        policy,
        store,
        locks: KeyLocks::new(),
    })
}

/// Reassembles messages that share a correlation key.
///
/// Every call to [`Joiner::process`] reads the partial value for the message's
/// key, merges the message into it, writes it back and then dispatches on the
/// policy's sufficiency test. Calls for the same key are serialized; calls for
/// different keys may interleave freely.
///
/// Under [`Retention::EvictOnComplete`] a group that completes is not written
/// back; its earlier partial value is deleted once the handler returns.
///
/// Under [`Retention::Retain`] a group that already completed keeps its entry,
/// so a late message merges into it and is dispatched again.
pub struct Joiner<M, K, V, R, S> {
    policy: JoinPolicy<M, K, V, R>,
    store: S,
    locks: KeyLocks<K>,
}

impl<M, K, V, R, S> Joiner<M, K, V, R, S>
    where K: Hash + Eq + Clone,
          V: From<M> + Clone,
          S: KVStore<K, V>
{
    /// Joins one message. Returns the completion handler's result when the
    /// merged group is sufficient and `None` otherwise.
    ///
    /// Store failures abort the call; nothing is retried.
    pub async fn process(&self, message: M) -> Result<Option<R>, StoreError> {
        let key = (self.policy.key_fn)(&message);
        let _guard = self.locks.lock(&key).await;

        let (merged, existed) = match self.store.get(&key).await? {
            Some(accumulated) => ((self.policy.merge_fn)(message, accumulated), true),
            None => {
                trace!("Seeding join group");
                (V::from(message), false)
            }
        };
        let complete = (self.policy.sufficiency_fn)(&merged);

        // A group about to be evicted is never written, only its earlier
        // partial value (if any) is deleted.
        if complete && self.policy.retention == Retention::EvictOnComplete {
            debug!("Join group complete, evicting");
            let result = (self.policy.process_fn)(merged);
            if existed {
                self.store.delete(&key).await?;
            }
            return Ok(Some(result));
        }

        self.store.put(key, merged.clone()).await?;

        if !complete {
            debug!("Join group incomplete");
            (self.policy.handle_incomplete_fn)(&merged);
            return Ok(None);
        }

        debug!("Join group complete");
        Ok(Some((self.policy.process_fn)(merged)))
    }

    /// Backing store, for inspecting join state.
    pub fn store(&self) -> &S {
        &self.store
    }
}
