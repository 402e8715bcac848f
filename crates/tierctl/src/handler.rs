//! Command handler for tierctl

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tiercascade::{CascadeStore, Options, Regex, Store, StoreExt};

/// Operations runnable against a cascade
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Read a key, promoting it into faster tiers
    Get {
        /// Key to read
        key: String,
        /// Read only the last tier
        #[arg(long)]
        last_store: bool,
    },
    /// Write a key to every tier
    Set {
        /// Key to write
        key: String,
        /// Value to store
        value: String,
        /// Expire after this many seconds
        #[arg(long, value_name = "SECS")]
        expires_in: Option<f64>,
        /// Write only the last tier
        #[arg(long)]
        last_store: bool,
    },
    /// Delete a key from every tier
    Del {
        /// Key to delete
        key: String,
    },
    /// Increment a numeric value
    Incr {
        /// Key holding the number
        key: String,
        /// Amount to add
        #[arg(default_value_t = 1, allow_negative_numbers = true)]
        by: i64,
    },
    /// Decrement a numeric value
    Decr {
        /// Key holding the number
        key: String,
        /// Amount to subtract
        #[arg(default_value_t = 1, allow_negative_numbers = true)]
        by: i64,
    },
    /// Delete every key matching a regular expression
    DeleteMatched {
        /// Regular expression matched against keys
        pattern: String,
    },
    /// Remove every entry from every tier
    Clear,
    /// Prune expired entries from every tier
    Cleanup,
    /// Print tier layout and read statistics
    Stats,
}

pub struct CommandHandler {
    cache: Arc<CascadeStore>,
}

impl CommandHandler {
    pub fn new(cache: Arc<CascadeStore>) -> Self {
        Self { cache }
    }

    /// Run `command`, returning the text to print
    pub fn handle(&self, command: &Command) -> Result<String> {
        match command {
            Command::Get { key, last_store } => Ok(self.handle_get(key, *last_store)),
            Command::Set {
                key,
                value,
                expires_in,
                last_store,
            } => self.handle_set(key, value, *expires_in, *last_store),
            Command::Del { key } => {
                self.cache.delete(key, &Options::new());
                Ok("OK".to_string())
            }
            Command::Incr { key, by } => Ok(number(self.cache.increment(key, *by, &Options::new()))),
            Command::Decr { key, by } => Ok(number(self.cache.decrement(key, *by, &Options::new()))),
            Command::DeleteMatched { pattern } => {
                let pattern = Regex::new(pattern)
                    .with_context(|| format!("invalid pattern '{}'", pattern))?;
                self.cache.delete_matched(&pattern, &Options::new());
                Ok("OK".to_string())
            }
            Command::Clear => {
                let results = self.cache.clear(&Options::new());
                Ok(self.per_tier(&results, |_| "ok".to_string()))
            }
            Command::Cleanup => {
                let results = self.cache.cleanup(&Options::new());
                Ok(self.per_tier(&results, |removed| format!("{} removed", removed)))
            }
            Command::Stats => Ok(self.handle_stats()),
        }
    }

    fn handle_get(&self, key: &str, last_store: bool) -> String {
        let options = Options::new().last_store(last_store);
        match self.cache.read(key, &options) {
            Some(entry) => String::from_utf8_lossy(entry.value()).into_owned(),
            None => "(nil)".to_string(),
        }
    }

    fn handle_set(
        &self,
        key: &str,
        value: &str,
        expires_in: Option<f64>,
        last_store: bool,
    ) -> Result<String> {
        // without --expires-in the cascade's configured expiry applies
        let mut options = Options::new().last_store(last_store);
        if let Some(secs) = expires_in {
            let ttl = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid expiry '{}'", secs))?;
            if ttl.is_zero() {
                bail!("expiry must be greater than 0");
            }
            options = options.expires_in(ttl);
        }

        self.cache.write_value(key, value.to_string(), &options)?;
        Ok("OK".to_string())
    }

    fn handle_stats(&self) -> String {
        let stats = self.cache.stats();

        let mut lines: Vec<String> = self
            .cache
            .tiers()
            .iter()
            .enumerate()
            .map(|(index, tier)| {
                format!("tier {} ({}): {} hits", index, tier.kind(), stats.hits_at(index))
            })
            .collect();
        lines.push(format!("misses: {}", stats.misses()));
        lines.push(format!("promotions: {}", stats.promotions()));
        lines.push(format!("tier_failures: {}", stats.tier_failures()));
        lines.push(format!("hit_ratio: {:.2}", stats.hit_ratio()));
        lines.join("\n")
    }

    fn per_tier<T>(&self, results: &[Option<T>], describe: impl Fn(&T) -> String) -> String {
        if results.is_empty() {
            return "(no tiers)".to_string();
        }

        results
            .iter()
            .zip(self.cache.tiers())
            .enumerate()
            .map(|(index, (result, tier))| {
                let outcome = match result {
                    Some(value) => describe(value),
                    None => "failed".to_string(),
                };
                format!("tier {} ({}): {}", index, tier.kind(), outcome)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn number(value: Option<i64>) -> String {
    match value {
        Some(n) => n.to_string(),
        None => "(nil)".to_string(),
    }
}
