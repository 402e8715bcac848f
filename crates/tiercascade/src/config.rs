//! Cascade configuration
//!
//! ```toml
//! expires_in = 60
//! stores = [
//!     "memory_store",
//!     ["file_store", { path = "/var/cache/app", expires_in = 300 }],
//! ]
//! ```
//!
//! A bare kind reuses the top-level settings; a `[kind, { ... }]` pair
//! is used verbatim for that tier.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tierstore::{Error, Options, Result};

/// Settings used to construct one store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of entries, for bounded stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,

    /// Root directory, for filesystem stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Default per-call options for the store
    #[serde(flatten)]
    pub options: Options,
}

/// One entry of the `stores` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TierSpec {
    /// Store kind constructed with the cascade's own settings
    Kind(String),
    /// Store kind with its own settings
    Configured(String, StoreConfig),
}

impl TierSpec {
    /// Store kind identifier
    pub fn kind(&self) -> &str {
        match self {
            TierSpec::Kind(kind) | TierSpec::Configured(kind, _) => kind.as_str(),
        }
    }

    /// Kind and construction settings, falling back to `inherited`
    pub fn resolve<'a>(&'a self, inherited: &'a StoreConfig) -> (&'a str, &'a StoreConfig) {
        match self {
            TierSpec::Kind(kind) => (kind.as_str(), inherited),
            TierSpec::Configured(kind, config) => (kind.as_str(), config),
        }
    }
}

/// Top-level cascade configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Tiers, fastest first
    #[serde(default)]
    pub stores: Vec<TierSpec>,

    /// Settings of the cascade itself, inherited by bare tiers
    #[serde(flatten)]
    pub store: StoreConfig,
}

impl CascadeConfig {
    /// Parse a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let input = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&input)
    }
}
