use std::hash::Hash;

use futures::future;
use futures::stream::{LocalBoxStream, Stream, StreamExt};

use crate::error::StoreError;
use crate::join::Joiner;
use crate::store::KVStore;

pub type Joined<R> = Result<Option<R>, StoreError>;

/// Drives a stream of messages through a [`Joiner`].
pub trait JoinStreamExt: Stream + Sized {
    /// Joins messages one at a time, in arrival order. Yields one item per
    /// message.
    fn join_with<'a, K, V, R, S>(self, joiner: &'a Joiner<Self::Item, K, V, R, S>) -> LocalBoxStream<'a, Joined<R>>
        where Self: 'a,
              Self::Item: 'a,
              K: Hash + Eq + Clone + 'a,
              V: From<Self::Item> + Clone + 'a,
              R: 'a,
              S: KVStore<K, V> + 'a
    {
        self.then(move |message| joiner.process(message)).boxed_local()
    }

    /// Joins up to `limit` messages at once. Messages sharing a key still merge
    /// one after another; results come out in completion order.
    fn join_with_concurrent<'a, K, V, R, S>(self, joiner: &'a Joiner<Self::Item, K, V, R, S>, limit: usize) -> LocalBoxStream<'a, Joined<R>>
        where Self: 'a,
              Self::Item: 'a,
              K: Hash + Eq + Clone + 'a,
              V: From<Self::Item> + Clone + 'a,
              R: 'a,
              S: KVStore<K, V> + 'a
    {
        self.map(move |message| joiner.process(message))
            .buffer_unordered(limit.max(1))
            .boxed_local()
    }
}

impl<T: Stream> JoinStreamExt for T {}

pub trait JoinedStreamExt<R>: Stream<Item = Joined<R>> + Sized {
    /// Drops messages that left their group incomplete, keeping completed
    /// results and errors.
    fn completed<'a>(self) -> LocalBoxStream<'a, Result<R, StoreError>>
        where Self: 'a,
              R: 'a
    {
        self.filter_map(|joined| future::ready(joined.transpose()))
            .boxed_local()
    }
}

impl<R, T: Stream<Item = Joined<R>>> JoinedStreamExt<R> for T {}
