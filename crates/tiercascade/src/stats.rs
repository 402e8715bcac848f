//! Cascade statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing how reads are served across tiers
#[derive(Debug)]
pub struct CascadeStats {
    tier_hits: Box<[AtomicU64]>,
    misses: AtomicU64,
    promotions: AtomicU64,
    tier_failures: AtomicU64,
}

impl CascadeStats {
    /// Create a tracker for a cascade of `tiers` tiers
    pub fn new(tiers: usize) -> Self {
        Self {
            tier_hits: (0..tiers).map(|_| AtomicU64::new(0)).collect(),
            misses: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
            tier_failures: AtomicU64::new(0),
        }
    }

    /// Record a read served by `tier`
    pub fn record_hit(&self, tier: usize) {
        if let Some(counter) = self.tier_hits.get(tier) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a read no tier could serve
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a hit copied into faster tiers
    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tier call that failed and was skipped
    pub fn record_failure(&self) {
        self.tier_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Total hits across all tiers
    pub fn hits(&self) -> u64 {
        self.tier_hits
            .iter()
            .map(|counter| counter.load(Ordering::Relaxed))
            .sum()
    }

    /// Hits served by `tier`
    pub fn hits_at(&self, tier: usize) -> u64 {
        self.tier_hits
            .get(tier)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Total misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Reads that backfilled faster tiers
    pub fn promotions(&self) -> u64 {
        self.promotions.load(Ordering::Relaxed)
    }

    /// Tier calls that failed
    pub fn tier_failures(&self) -> u64 {
        self.tier_failures.load(Ordering::Relaxed)
    }

    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Reset all statistics
    pub fn reset(&self) {
        for counter in self.tier_hits.iter() {
            counter.store(0, Ordering::Relaxed);
        }
        self.misses.store(0, Ordering::Relaxed);
        self.promotions.store(0, Ordering::Relaxed);
        self.tier_failures.store(0, Ordering::Relaxed);
    }
}
