//! Shared mutable state for tools.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Mutable state shared by tool invocations, split into partitions with
/// their own locks.
///
/// The state is never handed out directly. [`read`] and [`update`] run a
/// closure while holding the partition's lock, so a check-and-mutate
/// sequence inside one `update` call is atomic with respect to every other
/// call on the same partition. Partitions are fixed when the resource is
/// created.
///
/// The closures run synchronously and must not block.
///
/// [`read`]: SharedResource::read
/// [`update`]: SharedResource::update
pub struct SharedResource<K, V> {
    partitions: HashMap<K, Mutex<V>>,
}

impl<K: Eq + Hash, V> SharedResource<K, V> {
    /// Creates a resource with the given partitions.
    pub fn new<I: IntoIterator<Item = (K, V)>>(partitions: I) -> Self {
        Self {
            partitions: partitions
                .into_iter()
                .map(|(key, value)| (key, Mutex::new(value)))
                .collect(),
        }
    }

    /// Returns `true` if the partition exists.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.partitions.contains_key(key)
    }

    /// Runs `f` with shared access to a partition.
    ///
    /// Returns `None` if the partition doesn't exist.
    pub fn read<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        let partition = self.partitions.get(key)?;
        let guard = partition.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&guard))
    }

    /// Runs `f` with exclusive access to a partition.
    ///
    /// Returns `None` if the partition doesn't exist.
    pub fn update<R>(
        &self,
        key: &K,
        f: impl FnOnce(&mut V) -> R,
    ) -> Option<R> {
        let partition = self.partitions.get(key)?;
        let mut guard =
            partition.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }
}

impl<K, V> Debug for SharedResource<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedResource")
            .field("partitions", &self.partitions.len())
            .finish_non_exhaustive()
    }
}
