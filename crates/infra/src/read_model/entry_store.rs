use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use dairyledger_core::{DomainError, DomainResult};

/// Keyed record storage for history rows.
///
/// Rows are immutable facts; the only write is [`replace`](EntryStore::replace),
/// a compare-and-swap that fails with `DomainError::Conflict` when the stored
/// row is no longer the one the caller read.
pub trait EntryStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    /// Swap `expected` for `new`.
    ///
    /// - insert: `expected = None`, `new = Some(row)`
    /// - edit: `expected = Some(old)`, `new = Some(row)`
    /// - delete: `expected = Some(old)`, `new = None`
    fn replace(&self, key: K, expected: Option<&V>, new: Option<V>) -> DomainResult<()>;

    fn list(&self) -> Vec<V>;
}

impl<K, V, S> EntryStore<K, V> for Arc<S>
where
    S: EntryStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn replace(&self, key: K, expected: Option<&V>, new: Option<V>) -> DomainResult<()> {
        (**self).replace(key, expected, new)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }
}

/// In-memory history store for tests/dev.
#[derive(Debug)]
pub struct InMemoryEntryStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryEntryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryEntryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> EntryStore<K, V> for InMemoryEntryStore<K, V>
where
    K: Clone + Eq + Hash + Ord + core::fmt::Display + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn replace(&self, key: K, expected: Option<&V>, new: Option<V>) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::store("entry store lock poisoned"))?;

        if map.get(&key) != expected {
            return Err(DomainError::conflict(format!("record {key} was modified concurrently")));
        }

        match new {
            Some(row) => map.insert(key, row),
            None => map.remove(&key),
        };
        Ok(())
    }

    /// Rows in key order (ids are time-ordered, so this is insertion order).
    fn list(&self) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut rows: Vec<(&K, &V)> = map.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows.into_iter().map(|(_, v)| v.clone()).collect()
    }
}
