//! # tiercascade
//!
//! Cascading cache store built from ordered tiers.
//!
//! ## Architecture
//! - **CascadeStore**: reads stop at the first hit and backfill faster tiers;
//!   writes, deletes and maintenance fan out to every tier
//! - **Isolation**: a failing tier is logged and skipped, never surfaced
//! - **Guard**: one mutex per cascade serializes scan-then-promote and fan-outs
//! - **StoreRegistry**: kind identifiers mapped to store constructors
//! - **CascadeConfig**: TOML description of the tier list
//!
//! `CascadeStore` implements [`Store`] itself, so a cascade can be a tier of
//! another cascade and gets the value-level [`StoreExt`] helpers for free.

#![warn(missing_docs)]

mod cascade;
mod config;
mod registry;
mod stats;

pub use cascade::CascadeStore;
pub use config::{CascadeConfig, StoreConfig, TierSpec};
pub use registry::{StoreConstructor, StoreRegistry};
pub use stats::CascadeStats;

pub use tierstore::{
    Bytes, Entry, Error, FileStore, MemoryStore, Options, Regex, Result, Store, StoreExt,
};
