//! Named in-process locks.
//!
//! Filesystem primitives are atomic one syscall at a time, but several index
//! operations are sequences (rename then prune, glob then remove). [`NamedLocks`]
//! hands out one `RwLock` per name so such sequences can be serialised per value
//! bucket or per entity type without a global lock.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// A set of read/write locks addressed by name.
///
/// Locks are created on first use and dropped again once no caller holds or
/// waits on them, so the set only ever holds names that are in use.
#[derive(Debug, Default)]
pub struct NamedLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl NamedLocks {
    /// Creates an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, name: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    /// Hands back a lock taken with [`get`](Self::get), evicting it if the map
    /// holds the last reference.
    ///
    /// References are only cloned under the map mutex, so a count of one seen
    /// here cannot grow before the entry is removed.
    fn release(&self, name: &str, lock: Arc<RwLock<()>>) {
        let mut locks = self.locks.lock();
        drop(lock);
        if locks.get(name).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(name);
        }
    }

    /// Runs `f` while holding the shared lock for `name`.
    pub fn read<R>(&self, name: &str, f: impl FnOnce() -> R) -> R {
        let lock = self.get(name);
        let result = {
            let _guard = lock.read();
            f()
        };
        self.release(name, lock);
        result
    }

    /// Runs `f` while holding the exclusive lock for `name`.
    pub fn write<R>(&self, name: &str, f: impl FnOnce() -> R) -> R {
        let lock = self.get(name);
        let result = {
            let _guard = lock.write();
            f()
        };
        self.release(name, lock);
        result
    }

    /// Runs `f` while holding the exclusive locks for both names.
    ///
    /// Locks are taken in lexical order so two callers passing the same pair
    /// in opposite order cannot deadlock. Equal names lock once.
    pub fn write_pair<R>(&self, a: &str, b: &str, f: impl FnOnce() -> R) -> R {
        if a == b {
            return self.write(a, f);
        }
        let (first_name, second_name) = if a < b { (a, b) } else { (b, a) };
        let first = self.get(first_name);
        let second = self.get(second_name);
        let result = {
            let _g1 = first.write();
            let _g2 = second.write();
            f()
        };
        self.release(second_name, second);
        self.release(first_name, first);
        result
    }

    /// Returns the number of names currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no name is currently held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
