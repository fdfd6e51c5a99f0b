use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};

use dairyledger_core::{DomainError, DomainResult};

type Slot = Arc<Mutex<()>>;

/// Keyed critical sections over history rows.
///
/// [`EntryStore::replace`](super::EntryStore::replace) only guards a single row.
/// Checks that span several rows (every separation drawn from one collection)
/// run under the lock of the key they are about. Slots are created on demand
/// and dropped once nobody holds or waits on them.
#[derive(Debug)]
pub struct RowLocks<K> {
    slots: RwLock<HashMap<K, Slot>>,
}

impl<K> Default for RowLocks<K> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<K> RowLocks<K>
where
    K: Copy + Ord + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` while holding the lock of every key in `keys`.
    pub fn with<R, F>(&self, keys: &[K], work: F) -> DomainResult<R>
    where
        F: FnOnce() -> DomainResult<R>,
    {
        // Global order, so overlapping key sets cannot deadlock.
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let slots = keys
            .iter()
            .map(|key| self.slot(*key).map(|slot| (*key, slot)))
            .collect::<DomainResult<Vec<_>>>()?;

        let result = {
            let mut guards = Vec::with_capacity(slots.len());
            for (_, slot) in &slots {
                guards.push(slot.lock().map_err(|_| poisoned())?);
            }
            work()
        };

        for (key, slot) in slots {
            self.reclaim(key, slot)?;
        }
        result
    }

    fn slot(&self, key: K) -> DomainResult<Slot> {
        {
            let slots = self.slots.read().map_err(|_| poisoned())?;
            if let Some(slot) = slots.get(&key) {
                return Ok(slot.clone());
            }
        }

        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        Ok(slots.entry(key).or_default().clone())
    }

    fn reclaim(&self, key: K, slot: Slot) -> DomainResult<()> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        let unused = Arc::strong_count(&slot) == 2
            && slots.get(&key).is_some_and(|s| Arc::ptr_eq(s, &slot));
        drop(slot);
        if unused {
            slots.remove(&key);
        }
        Ok(())
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots.read().map(|s| s.len()).unwrap_or(0)
    }
}

fn poisoned() -> DomainError {
    DomainError::store("row lock poisoned")
}
