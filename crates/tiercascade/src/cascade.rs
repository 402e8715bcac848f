//! CascadeStore: ordered tiers coordinated as one store
//!
//! Reads go to the fastest tier first and stop at the first hit; a hit in a
//! slower tier is copied into every faster tier before returning. Writes,
//! deletes and maintenance calls go to every tier. Any single tier may fail
//! without affecting the others or the caller.

use std::sync::Arc;

use parking_lot::Mutex;
use tierstore::{Entry, Options, Regex, Result, Store};
use tracing::{debug, info, warn};

use crate::config::CascadeConfig;
use crate::registry::StoreRegistry;
use crate::stats::CascadeStats;

/// A cache store that cascades operations across ordered tiers
///
/// Tier 0 is the fastest, most local store; the last tier is the most
/// authoritative. The tier list is fixed at construction.
pub struct CascadeStore {
    /// Defaults merged into every call
    options: Options,

    /// Tiers, fastest first
    tiers: Vec<Arc<dyn Store>>,

    /// Serializes scan-then-promote and full fan-outs on this instance
    guard: Mutex<()>,

    /// Read statistics
    stats: CascadeStats,
}

impl CascadeStore {
    /// Create a cascade over already constructed tiers
    pub fn new(options: Options, tiers: Vec<Arc<dyn Store>>) -> Self {
        let kinds: Vec<&str> = tiers.iter().map(|tier| tier.kind()).collect();
        info!(tiers = ?kinds, "cascade store initialized");

        let stats = CascadeStats::new(tiers.len());
        Self {
            options,
            tiers,
            guard: Mutex::new(()),
            stats,
        }
    }

    /// Build every tier of `config` through `registry`
    ///
    /// # Errors
    /// `Error::UnknownStore` for a kind the registry does not know and
    /// `Error::Config` for settings a constructor rejects.
    pub fn from_config(config: &CascadeConfig, registry: &StoreRegistry) -> Result<Self> {
        let tiers = config
            .stores
            .iter()
            .map(|spec| {
                let (kind, settings) = spec.resolve(&config.store);
                registry.build(kind, settings)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(config.store.options.clone(), tiers))
    }

    /// Tiers, fastest first
    pub fn tiers(&self) -> &[Arc<dyn Store>] {
        &self.tiers
    }

    /// Tier at `index`
    pub fn tier(&self, index: usize) -> Option<&Arc<dyn Store>> {
        self.tiers.get(index)
    }

    /// Number of tiers
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether the cascade has no tiers
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Get cascade statistics
    pub fn stats(&self) -> &CascadeStats {
        &self.stats
    }

    /// Read `key` from the first tier that has it
    ///
    /// A hit at tier `i > 0` is written to tiers `0..i` before returning.
    /// With `last_store` only the last tier is consulted and nothing is
    /// promoted.
    pub fn read(&self, key: &str, options: &Options) -> Option<Entry> {
        let options = self.options.merged(options);

        if options.is_last_store() {
            let last = self.last_index()?;
            let found = self
                .isolate(last, "read_entry", |tier| tier.read_entry(key, &options))
                .flatten();
            match found {
                Some(_) => self.stats.record_hit(last),
                None => self.stats.record_miss(),
            }
            return found;
        }

        let _guard = self.guard.lock();

        let hit = (0..self.tiers.len()).find_map(|index| {
            self.isolate(index, "read_entry", |tier| tier.read_entry(key, &options))
                .flatten()
                .map(|entry| (index, entry))
        });

        let Some((index, entry)) = hit else {
            self.stats.record_miss();
            return None;
        };
        self.stats.record_hit(index);

        if index > 0 {
            debug!(key, from = index, "promoting entry to faster tiers");
            for faster in 0..index {
                self.isolate(faster, "write_entry", |tier| {
                    tier.write_entry(key, &entry, &options)
                });
            }
            self.stats.record_promotion();
        }

        Some(entry)
    }

    /// Write `entry` to every tier, or only the last with `last_store`
    ///
    /// Always reports success; tiers that fail are skipped.
    pub fn write(&self, key: &str, entry: &Entry, options: &Options) -> bool {
        let options = self.options.merged(options);

        if options.is_last_store() {
            if let Some(last) = self.last_index() {
                self.isolate(last, "write_entry", |tier| {
                    tier.write_entry(key, entry, &options)
                });
            }
        } else {
            self.fan_out("write_entry", |tier| tier.write_entry(key, entry, &options));
        }
        true
    }

    /// Delete `key` from every tier
    ///
    /// Always reports success; tiers that fail are skipped.
    pub fn delete(&self, key: &str, options: &Options) -> bool {
        let options = self.options.merged(options);
        self.fan_out("delete_entry", |tier| tier.delete_entry(key, &options));
        true
    }

    /// Delete keys matching `pattern` from every tier
    ///
    /// Tiers may encode keys differently, so per-tier counts are not combined.
    pub fn delete_matched(&self, pattern: &Regex, options: &Options) {
        let options = self.options.merged(options);
        self.fan_out("delete_matched", |tier| tier.delete_matched(pattern, &options));
    }

    /// Clear every tier, returning each tier's outcome in tier order
    pub fn clear(&self, options: &Options) -> Vec<Option<()>> {
        let options = self.options.merged(options);
        self.fan_out("clear", |tier| tier.clear(&options))
    }

    /// Prune expired entries in every tier, returning each tier's count
    pub fn cleanup(&self, options: &Options) -> Vec<Option<usize>> {
        let options = self.options.merged(options);
        self.fan_out("cleanup", |tier| tier.cleanup(&options))
    }

    /// Increment `key` in every tier
    ///
    /// Returns the first value reported in tier order, or `None` if no tier
    /// held the key. Counts that differ between tiers are not reconciled.
    pub fn increment(&self, key: &str, amount: i64, options: &Options) -> Option<i64> {
        let options = self.options.merged(options);
        first_present(self.fan_out("increment", |tier| tier.increment(key, amount, &options)))
    }

    /// Decrement `key` in every tier
    ///
    /// Same aggregation as [`increment`](Self::increment).
    pub fn decrement(&self, key: &str, amount: i64, options: &Options) -> Option<i64> {
        let options = self.options.merged(options);
        first_present(self.fan_out("decrement", |tier| tier.decrement(key, amount, &options)))
    }

    fn last_index(&self) -> Option<usize> {
        self.tiers.len().checked_sub(1)
    }

    /// Call every tier in order under the guard
    fn fan_out<T, F>(&self, op: &'static str, call: F) -> Vec<Option<T>>
    where
        F: Fn(&dyn Store) -> Result<T>,
    {
        let _guard = self.guard.lock();
        (0..self.tiers.len())
            .map(|index| self.isolate(index, op, &call))
            .collect()
    }

    /// Make one call against one tier, turning a failure into `None`
    fn isolate<T, F>(&self, index: usize, op: &'static str, call: F) -> Option<T>
    where
        F: FnOnce(&dyn Store) -> Result<T>,
    {
        let tier = &self.tiers[index];
        match call(tier.as_ref()) {
            Ok(value) => Some(value),
            Err(error) => {
                self.stats.record_failure();
                warn!(tier = index, store = tier.kind(), op, %error, "tier call failed");
                None
            }
        }
    }
}

fn first_present(results: Vec<Option<Option<i64>>>) -> Option<i64> {
    results.into_iter().flatten().flatten().next()
}

impl Store for CascadeStore {
    fn kind(&self) -> &str {
        "cascade_store"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn read_entry(&self, key: &str, options: &Options) -> Result<Option<Entry>> {
        Ok(self.read(key, options))
    }

    fn write_entry(&self, key: &str, entry: &Entry, options: &Options) -> Result<bool> {
        Ok(self.write(key, entry, options))
    }

    fn delete_entry(&self, key: &str, options: &Options) -> Result<bool> {
        Ok(self.delete(key, options))
    }

    fn increment(&self, key: &str, amount: i64, options: &Options) -> Result<Option<i64>> {
        Ok(CascadeStore::increment(self, key, amount, options))
    }

    fn decrement(&self, key: &str, amount: i64, options: &Options) -> Result<Option<i64>> {
        Ok(CascadeStore::decrement(self, key, amount, options))
    }

    fn delete_matched(&self, pattern: &Regex, options: &Options) -> Result<usize> {
        CascadeStore::delete_matched(self, pattern, options);
        Ok(0)
    }

    fn clear(&self, options: &Options) -> Result<()> {
        CascadeStore::clear(self, options);
        Ok(())
    }

    fn cleanup(&self, options: &Options) -> Result<usize> {
        Ok(CascadeStore::cleanup(self, options).into_iter().flatten().sum())
    }
}
