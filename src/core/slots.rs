//! Keyed slot table with one lock per key.
//!
//! Mutations on different keys never contend: the outer map is locked only
//! long enough to find or create a slot, then the caller works under the
//! slot's own `Mutex`. Slots are never removed.

use crate::core::error::AbstractError;
use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};

pub struct Slots<K, T> {
    entries: RwLock<FxHashMap<K, Arc<Mutex<T>>>>,
    label: &'static str,
}

impl<K, T> Slots<K, T>
where
    K: Copy + Eq + Hash,
    T: Default,
{
    pub fn new(label: &'static str) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            label,
        }
    }

    fn existing(&self, key: K) -> Result<Option<Arc<Mutex<T>>>, AbstractError> {
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries.get(&key).cloned())
    }

    fn slot(&self, key: K) -> Result<Arc<Mutex<T>>, AbstractError> {
        if let Some(slot) = self.existing(key)? {
            return Ok(slot);
        }
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        Ok(entries.entry(key).or_default().clone())
    }

    /// Run `f` inside the critical section for `key`, creating the slot if needed.
    pub fn with<R>(&self, key: K, f: impl FnOnce(&mut T) -> R) -> Result<R, AbstractError> {
        let slot = self.slot(key)?;
        let mut guard = slot.lock().map_err(|_| self.poisoned())?;
        Ok(f(&mut guard))
    }

    /// Read the slot for `key` if it exists; never creates one.
    pub fn read<R>(&self, key: K, f: impl FnOnce(&T) -> R) -> Result<Option<R>, AbstractError> {
        let Some(slot) = self.existing(key)? else {
            return Ok(None);
        };
        let guard = slot.lock().map_err(|_| self.poisoned())?;
        Ok(Some(f(&guard)))
    }

    fn poisoned(&self) -> AbstractError {
        AbstractError::LockPoisoned(format!("{} slot table", self.label))
    }
}
