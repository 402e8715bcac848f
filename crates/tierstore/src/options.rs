//! Per-call options
//!
//! Only `last_store` and `force` change what the cascade and the convenience
//! layer do. Everything else travels unchanged to each store, which decides
//! for itself what `compress` or `race_condition_ttl` mean.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options for one store call, or a store's construction-time defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Bypass the cascade and target only its last store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_store: Option<bool>,

    /// Relative lifetime for newly written entries
    #[serde(with = "secs", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<Duration>,

    /// Store-defined value compression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,

    /// Minimum value size before `compress` applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress_threshold: Option<usize>,

    /// Grace period during which a store may serve a stale entry
    #[serde(with = "secs", skip_serializing_if = "Option::is_none")]
    pub race_condition_ttl: Option<Duration>,

    /// Store the value without store-side serialization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,

    /// Treat every read as a miss in `fetch`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,

    /// Any other option, forwarded untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Options {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `last_store`
    pub fn last_store(mut self, on: bool) -> Self {
        self.last_store = Some(on);
        self
    }

    /// Set `expires_in`
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.expires_in = Some(ttl);
        self
    }

    /// Set `force`
    pub fn force(mut self, on: bool) -> Self {
        self.force = Some(on);
        self
    }

    /// Set `raw`
    pub fn raw(mut self, on: bool) -> Self {
        self.raw = Some(on);
        self
    }

    /// Set an option this crate does not know about
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether `last_store` is set
    pub fn is_last_store(&self) -> bool {
        self.last_store.unwrap_or(false)
    }

    /// Whether `force` is set
    pub fn is_forced(&self) -> bool {
        self.force.unwrap_or(false)
    }

    /// Layer `overrides` on top of these options, field by field
    pub fn merged(&self, overrides: &Options) -> Options {
        let mut extra = self.extra.clone();
        extra.extend(overrides.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        Options {
            last_store: overrides.last_store.or(self.last_store),
            expires_in: overrides.expires_in.or(self.expires_in),
            compress: overrides.compress.or(self.compress),
            compress_threshold: overrides.compress_threshold.or(self.compress_threshold),
            race_condition_ttl: overrides.race_condition_ttl.or(self.race_condition_ttl),
            raw: overrides.raw.or(self.raw),
            force: overrides.force.or(self.force),
            extra,
        }
    }
}

/// Durations as (possibly fractional) seconds
mod secs {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(d)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}
