//! Store constructors keyed by kind
//!
//! The registry is passed to [`CascadeStore::from_config`](crate::CascadeStore::from_config)
//! explicitly; there is no process-wide lookup table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tierstore::{Error, FileStore, MemoryStore, Result, Store, DEFAULT_CAPACITY};

use crate::config::StoreConfig;

/// Builds a store from its settings
pub type StoreConstructor = dyn Fn(&StoreConfig) -> Result<Arc<dyn Store>> + Send + Sync;

/// Map from store kind identifiers to constructors
pub struct StoreRegistry {
    constructors: BTreeMap<String, Box<StoreConstructor>>,
}

impl StoreRegistry {
    /// Registry with no kinds
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry knowing `memory_store` and `file_store`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("memory_store", build_memory_store)
            .register("file_store", build_file_store);
        registry
    }

    /// Add or replace the constructor for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&StoreConfig) -> Result<Arc<dyn Store>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
        self
    }

    /// Whether `kind` has a constructor
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Construct a store of `kind`
    pub fn build(&self, kind: &str, config: &StoreConfig) -> Result<Arc<dyn Store>> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| Error::UnknownStore(kind.to_string()))?;
        constructor(config)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}

fn build_memory_store(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    let capacity = config.capacity.unwrap_or(DEFAULT_CAPACITY);
    if capacity == 0 {
        return Err(Error::Config(
            "memory_store capacity must be greater than 0".to_string(),
        ));
    }
    Ok(Arc::new(MemoryStore::new(config.options.clone(), capacity)))
}

fn build_file_store(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    let path = config
        .path
        .as_ref()
        .ok_or_else(|| Error::Config("file_store requires a path".to_string()))?;
    let store = FileStore::open(path, config.options.clone()).map_err(|e| {
        Error::Config(format!("file_store at {}: {}", path.display(), e))
    })?;
    Ok(Arc::new(store))
}
