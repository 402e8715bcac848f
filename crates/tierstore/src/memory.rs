//! In-process store on top of the LRU map

use parking_lot::Mutex;
use regex::Regex;
use tracing::trace;

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::lru::LruMap;
use crate::options::Options;
use crate::store::Store;

/// Default number of entries a memory store holds
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Thread-safe, bounded in-memory store
///
/// Expired entries are dropped when read and by [`Store::cleanup`]; the
/// least recently used entry is evicted once `capacity` is reached.
pub struct MemoryStore {
    options: Options,
    entries: Mutex<LruMap<String, Entry>>,
}

impl MemoryStore {
    /// Create a store with the given defaults and capacity
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(options: Options, capacity: usize) -> Self {
        Self {
            options,
            entries: Mutex::new(LruMap::new(capacity)),
        }
    }

    /// Number of entries held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }

    fn adjust(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        let mut entries = self.entries.lock();
        let key = key.to_string();

        let current = match entries.peek(&key).cloned() {
            Some(entry) if entry.is_expired() => {
                entries.remove(&key);
                return Ok(None);
            }
            Some(entry) => entry,
            None => return Ok(None),
        };

        let n = current
            .as_integer()
            .ok_or_else(|| Error::NotNumeric(key.clone()))?
            .wrapping_add(delta);
        entries.insert(key, current.replace_value(n.to_string()));
        Ok(Some(n))
    }
}

impl Store for MemoryStore {
    fn kind(&self) -> &str {
        "memory_store"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn read_entry(&self, key: &str, _options: &Options) -> Result<Option<Entry>> {
        let mut entries = self.entries.lock();
        let key = key.to_string();

        match entries.get(&key).cloned() {
            Some(entry) if entry.is_expired() => {
                entries.remove(&key);
                Ok(None)
            }
            found => Ok(found),
        }
    }

    fn write_entry(&self, key: &str, entry: &Entry, _options: &Options) -> Result<bool> {
        let evicted = self.entries.lock().insert(key.to_string(), entry.clone());
        if let Some((old, _)) = evicted {
            trace!(key = %old, "memory store evicted entry");
        }
        Ok(true)
    }

    fn delete_entry(&self, key: &str, _options: &Options) -> Result<bool> {
        Ok(self.entries.lock().remove(&key.to_string()).is_some())
    }

    fn increment(&self, key: &str, amount: i64, _options: &Options) -> Result<Option<i64>> {
        self.adjust(key, amount)
    }

    fn decrement(&self, key: &str, amount: i64, _options: &Options) -> Result<Option<i64>> {
        self.adjust(key, amount.wrapping_neg())
    }

    fn delete_matched(&self, pattern: &Regex, _options: &Options) -> Result<usize> {
        Ok(self.entries.lock().retain(|key, _| !pattern.is_match(key)))
    }

    fn clear(&self, _options: &Options) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }

    fn cleanup(&self, _options: &Options) -> Result<usize> {
        Ok(self.entries.lock().retain(|_, entry| !entry.is_expired()))
    }
}
