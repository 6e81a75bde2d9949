/// Whether a completed group stays in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Completed groups stay in the store; a later message for the same key
    /// merges into the completed value and dispatches again.
    Retain,
    /// Completed groups are deleted once the completion handler returned, so
    /// the next message for the key seeds a new group.
    EvictOnComplete,
}

impl Default for Retention {
    fn default() -> Self {
        Retention::Retain
    }
}

pub(crate) type KeyFn<M, K> = Box<dyn Fn(&M) -> K>;
pub(crate) type MergeFn<M, V> = Box<dyn Fn(M, V) -> V>;
pub(crate) type SufficiencyFn<V> = Box<dyn Fn(&V) -> bool>;
pub(crate) type ProcessFn<V, R> = Box<dyn Fn(V) -> R>;
pub(crate) type IncompleteFn<V> = Box<dyn Fn(&V)>;

/// Caller supplied behaviour of a join.
///
/// `M` is the incoming message, `K` the correlation key, `V` the partial value
/// kept in the store and `R` what a completed group turns into. The first
/// message of a group is stored as `V::from(message)` without calling the merge
/// function.
///
/// The completion handler defaults to the identity and the incompletion
/// handler to a no-op.
pub struct JoinPolicy<M, K, V = M, R = V> {
    pub(crate) key_fn: KeyFn<M, K>,
    pub(crate) merge_fn: MergeFn<M, V>,
    pub(crate) sufficiency_fn: SufficiencyFn<V>,
    pub(crate) process_fn: ProcessFn<V, R>,
    pub(crate) handle_incomplete_fn: IncompleteFn<V>,
    pub(crate) retention: Retention,
}

impl<M, K, V> JoinPolicy<M, K, V, V>
    where V: From<M> + 'static
{
    /// `merge_fn` is called as `merge_fn(incoming, accumulated)`.
    pub fn new<KF, MF, SF>(key_fn: KF, merge_fn: MF, sufficiency_fn: SF) -> Self
        where KF: Fn(&M) -> K + 'static,
              MF: Fn(M, V) -> V + 'static,
              SF: Fn(&V) -> bool + 'static
    {
        JoinPolicy {
            key_fn: Box::new(key_fn),
            merge_fn: Box::new(merge_fn),
            sufficiency_fn: Box::new(sufficiency_fn),
            process_fn: Box::new(|value: V| value),
            handle_incomplete_fn: Box::new(|_: &V| ()),
            retention: Retention::default(),
        }
    }
}

impl<M, K, V, R> JoinPolicy<M, K, V, R> {
    /// Runs on every merge that leaves the group sufficient. Its return value
    /// is what [`crate::Joiner::process`] yields.
    pub fn on_complete<R2, F>(self, process_fn: F) -> JoinPolicy<M, K, V, R2>
        where F: Fn(V) -> R2 + 'static
    {
        JoinPolicy {
            key_fn: self.key_fn,
            merge_fn: self.merge_fn,
            sufficiency_fn: self.sufficiency_fn,
            process_fn: Box::new(process_fn),
            handle_incomplete_fn: self.handle_incomplete_fn,
            retention: self.retention,
        }
    }

    /// Runs on every merge that leaves the group insufficient.
    pub fn on_incomplete<F>(mut self, handle_incomplete_fn: F) -> Self
        where F: Fn(&V) + 'static
    {
        self.handle_incomplete_fn = Box::new(handle_incomplete_fn);
        self
    }

    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }
}
