//! Cache entries exchanged between stores

use std::time::{Duration, SystemTime};

use bytes::Bytes;

/// A cached value plus its optional absolute expiry
///
/// Cloning is cheap: the value is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    value: Bytes,
    expires_at: Option<SystemTime>,
}

impl Entry {
    /// Create an entry that never expires
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Create an entry that expires `ttl` from now
    ///
    /// A `ttl` too large to represent as an instant never expires.
    pub fn with_expires_in(value: impl Into<Bytes>, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: SystemTime::now().checked_add(ttl),
        }
    }

    /// Create an entry that expires at the given instant
    pub fn with_expires_at(value: impl Into<Bytes>, expires_at: SystemTime) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    /// The stored value
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Consume the entry and return the value
    pub fn into_value(self) -> Bytes {
        self.value
    }

    /// Absolute expiry, if any
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Whether the entry has expired as of now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    /// Whether the entry has expired as of `now`
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }

    /// A new entry holding `value` with this entry's expiry
    pub fn replace_value(&self, value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
            expires_at: self.expires_at,
        }
    }

    /// Interpret the value as a decimal integer
    pub(crate) fn as_integer(&self) -> Option<i64> {
        std::str::from_utf8(&self.value).ok()?.trim().parse().ok()
    }
}
