//! # tierstore
//!
//! Cache store contract and the stores that ship with it.
//!
//! ## Architecture
//! - **Store**: object-safe, entry-level capability trait every backend implements
//! - **StoreExt**: value-level read/write/fetch layered over any `Store`
//! - **MemoryStore**: bounded LRU map (AHash, O(1) eviction) behind a mutex
//! - **FileStore**: one file per key with a small binary header

#![warn(missing_docs)]

mod codec;
mod entry;
mod error;
mod file;
mod lru;
mod memory;
mod options;
mod store;

pub use entry::Entry;
pub use error::{Error, Result};
pub use file::FileStore;
pub use memory::{MemoryStore, DEFAULT_CAPACITY};
pub use options::Options;
pub use store::{Store, StoreExt};

pub use bytes::Bytes;
pub use regex::Regex;
