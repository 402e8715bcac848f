//! The store capability contract
//!
//! Every cache backend implements [`Store`]. The trait is object safe so a
//! cascade can hold `Arc<dyn Store>` tiers of different kinds side by side.
//! [`StoreExt`] layers the value-level API (read/write/fetch) over the
//! entry-level contract for every store, including cascades.

use bytes::Bytes;
use regex::Regex;

use crate::entry::Entry;
use crate::error::Result;
use crate::options::Options;

/// Entry-level operations every cache store provides
///
/// Stores own key encoding, value representation and expiry. Callers hand
/// them keys and [`Entry`] values and get entries back.
pub trait Store: Send + Sync {
    /// Registry identifier of this store, e.g. `memory_store`
    fn kind(&self) -> &str;

    /// Defaults this store was constructed with
    fn options(&self) -> &Options;

    /// Read the live entry for `key`
    fn read_entry(&self, key: &str, options: &Options) -> Result<Option<Entry>>;

    /// Store `entry` under `key`
    fn write_entry(&self, key: &str, entry: &Entry, options: &Options) -> Result<bool>;

    /// Remove `key`, returning whether it was present
    fn delete_entry(&self, key: &str, options: &Options) -> Result<bool>;

    /// Add `amount` to an existing integer value
    ///
    /// Returns `Ok(None)` if the key is absent.
    fn increment(&self, key: &str, amount: i64, options: &Options) -> Result<Option<i64>>;

    /// Subtract `amount` from an existing integer value
    ///
    /// Returns `Ok(None)` if the key is absent.
    fn decrement(&self, key: &str, amount: i64, options: &Options) -> Result<Option<i64>>;

    /// Remove every key matching `pattern`, returning how many were removed
    fn delete_matched(&self, pattern: &Regex, options: &Options) -> Result<usize>;

    /// Remove every entry
    fn clear(&self, options: &Options) -> Result<()>;

    /// Prune expired entries, returning how many were removed
    fn cleanup(&self, options: &Options) -> Result<usize>;
}

/// Value-level operations available on every [`Store`]
///
/// Per-call options are merged over the store's own defaults before the
/// entry-level call is made.
pub trait StoreExt: Store {
    /// Read the value for `key`
    fn read_value(&self, key: &str, options: &Options) -> Result<Option<Bytes>> {
        let options = self.options().merged(options);
        Ok(self.read_entry(key, &options)?.map(Entry::into_value))
    }

    /// Write `value` under `key`, honouring `expires_in`
    fn write_value(&self, key: &str, value: impl Into<Bytes>, options: &Options) -> Result<bool> {
        let options = self.options().merged(options);
        let entry = match options.expires_in {
            Some(ttl) => Entry::with_expires_in(value, ttl),
            None => Entry::new(value),
        };
        self.write_entry(key, &entry, &options)
    }

    /// Delete `key`
    fn delete(&self, key: &str, options: &Options) -> Result<bool> {
        let options = self.options().merged(options);
        self.delete_entry(key, &options)
    }

    /// Whether a live entry exists for `key`
    fn exist(&self, key: &str, options: &Options) -> Result<bool> {
        let options = self.options().merged(options);
        Ok(self.read_entry(key, &options)?.is_some())
    }

    /// Read several keys, returning the hits in request order
    fn read_multi<'k, I>(&self, keys: I, options: &Options) -> Result<Vec<(String, Bytes)>>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let options = self.options().merged(options);
        let mut hits = Vec::new();
        for key in keys {
            if let Some(entry) = self.read_entry(key, &options)? {
                hits.push((key.to_string(), entry.into_value()));
            }
        }
        Ok(hits)
    }

    /// Read `key`, or compute, store and return the value on a miss
    ///
    /// With `force` set the read is skipped and the value always recomputed.
    fn fetch<F, V>(&self, key: &str, options: &Options, compute: F) -> Result<Bytes>
    where
        F: FnOnce() -> V,
        V: Into<Bytes>,
    {
        if !self.options().merged(options).is_forced() {
            if let Some(value) = self.read_value(key, options)? {
                return Ok(value);
            }
        }

        let value: Bytes = compute().into();
        self.write_value(key, value.clone(), options)?;
        Ok(value)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn store() -> MemoryStore {
        MemoryStore::new(Options::new(), 16)
    }

    #[test]
    fn test_read_and_write() {
        let store = store();
        assert!(store.write_value("foo", "bar", &Options::new()).unwrap());
        assert_eq!(store.read_value("foo", &Options::new()).unwrap().unwrap(), "bar");
    }

    #[test]
    fn test_overwrite() {
        let store = store();
        store.write_value("foo", "bar", &Options::new()).unwrap();
        store.write_value("foo", "baz", &Options::new()).unwrap();
        assert_eq!(store.read_value("foo", &Options::new()).unwrap().unwrap(), "baz");
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let store = store();
        store.write_value("foo", "bar", &Options::new()).unwrap();
        assert!(store.read_value("FOO", &Options::new()).unwrap().is_none());
    }

    #[test]
    fn test_write_uses_default_expiry() {
        let store = MemoryStore::new(Options::new().expires_in(Duration::from_secs(60)), 16);
        store.write_value("foo", "bar", &Options::new()).unwrap();

        let entry = store.read_entry("foo", &Options::new()).unwrap().unwrap();
        assert!(entry.expires_at().is_some());
    }

    #[test]
    fn test_write_with_huge_expiry() {
        let store = store();
        let options: Options = serde_json::from_str(r#"{"expires_in": 1e19}"#).unwrap();

        assert!(store.write_value("foo", "bar", &options).unwrap());
        let entry = store.read_entry("foo", &Options::new()).unwrap().unwrap();
        assert!(entry.expires_at().is_none());
        assert_eq!(entry.value().as_ref(), b"bar");
    }

    #[test]
    fn test_exist_and_delete() {
        let store = store();
        store.write_value("foo", "bar", &Options::new()).unwrap();

        assert!(store.exist("foo", &Options::new()).unwrap());
        assert!(!store.exist("bar", &Options::new()).unwrap());
        assert!(store.delete("foo", &Options::new()).unwrap());
        assert!(!store.exist("foo", &Options::new()).unwrap());
    }

    #[test]
    fn test_read_multi() {
        let store = store();
        store.write_value("foo", "bar", &Options::new()).unwrap();
        store.write_value("fu", "baz", &Options::new()).unwrap();
        store.write_value("fud", "biz", &Options::new()).unwrap();

        let hits = store.read_multi(["foo", "nope", "fu"], &Options::new()).unwrap();
        assert_eq!(
            hits,
            vec![
                ("foo".to_string(), Bytes::from("bar")),
                ("fu".to_string(), Bytes::from("baz")),
            ]
        );
    }

    #[test]
    fn test_fetch_hit_and_miss() {
        let store = store();
        store.write_value("foo", "bar", &Options::new()).unwrap();

        let hit = store.fetch("foo", &Options::new(), || -> &'static str { panic!("computed") });
        assert_eq!(hit.unwrap(), "bar");

        let miss = store.fetch("fu", &Options::new(), || "baz").unwrap();
        assert_eq!(miss, "baz");
        assert_eq!(store.read_value("fu", &Options::new()).unwrap().unwrap(), "baz");
    }

    #[test]
    fn test_fetch_forced() {
        let store = store();
        store.write_value("foo", "bar", &Options::new()).unwrap();

        let value = store.fetch("foo", &Options::new().force(true), || "baz").unwrap();
        assert_eq!(value, "baz");
        assert_eq!(store.read_value("foo", &Options::new()).unwrap().unwrap(), "baz");
    }

    #[test]
    fn test_ext_on_trait_object() {
        let store: Arc<dyn Store> = Arc::new(store());
        store.write_value("foo", "bar", &Options::new()).unwrap();
        assert_eq!(store.read_value("foo", &Options::new()).unwrap().unwrap(), "bar");
    }
}
