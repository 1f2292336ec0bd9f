// Typed Store
// One keyed in-memory partition with TTL expiry and a background sweep task

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::classifier::StoreKind;
use super::ttl::RefreshStrategy;
use crate::config::StoreSettings;

/// Cached value envelope. TTL and refresh strategy are resolved once at
/// write time and never change for the lifetime of the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload (arbitrary JSON)
    pub value: serde_json::Value,
    /// Write timestamp
    pub cached_at: DateTime<Utc>,
    /// Effective expiry in seconds
    pub ttl_seconds: u64,
    /// Refresh strategy resolved from the key at write time
    pub refresh_strategy: RefreshStrategy,
}

impl CacheEntry {
    /// Entry age in fractional seconds
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        now.signed_duration_since(self.cached_at).num_milliseconds() as f64 / 1000.0
    }

    /// Whether the entry has outlived its TTL
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age_seconds(now) > self.ttl_seconds as f64
    }

    /// Whether a continuous-strategy entry has crossed the given fraction of
    /// its TTL and should be flagged for ahead-of-expiry refresh
    pub fn is_refresh_due(&self, now: DateTime<Utc>, threshold: f64) -> bool {
        self.refresh_strategy.is_continuous()
            && self.ttl_seconds > 0
            && self.age_seconds(now) > self.ttl_seconds as f64 * threshold
    }
}

/// Internal per-store statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Store-level hits
    pub hits: u64,
    /// Store-level misses
    pub misses: u64,
    /// Entries removed by expiry (lazy or swept)
    pub expired_entries: u64,
    /// Current live entry count
    pub entry_count: usize,
    /// Last background sweep timestamp
    pub last_sweep: Option<DateTime<Utc>>,
}

/// One semantic store partition. Structurally identical across kinds; each
/// carries its own default TTL and sweep cadence.
pub struct TypedStore {
    kind: StoreKind,
    settings: StoreSettings,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    stats: Arc<RwLock<StoreStats>>,
}

impl TypedStore {
    /// Create a new store partition
    pub fn new(kind: StoreKind, settings: StoreSettings) -> Self {
        Self {
            kind,
            settings,
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(StoreStats::default())),
        }
    }

    /// Store kind for this partition
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Default TTL for this partition in seconds
    pub fn default_ttl(&self) -> u64 {
        self.settings.default_ttl
    }

    /// Get a live entry. An expired-but-not-yet-swept entry is removed here
    /// and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                stats.expired_entries += 1;
                stats.entry_count = entries.len();
                stats.misses += 1;
                None
            }
            Some(entry) => {
                stats.hits += 1;
                Some(entry.clone())
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite an entry
    pub async fn set(&self, key: &str, entry: CacheEntry) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);

        let mut stats = self.stats.write().await;
        stats.entry_count = entries.len();
    }

    /// Remove an entry. Idempotent; returns whether something was removed.
    pub async fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(key).is_some();

        if removed {
            let mut stats = self.stats.write().await;
            stats.entry_count = entries.len();
        }
        removed
    }

    /// All live (non-expired) keys, optionally filtered by substring
    pub async fn keys(&self, substring_filter: Option<&str>) -> Vec<String> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .filter(|key| substring_filter.map_or(true, |needle| key.contains(needle)))
            .collect()
    }

    /// Remove every expired entry now; returns the number removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        let mut stats = self.stats.write().await;
        stats.expired_entries += removed as u64;
        stats.entry_count = entries.len();
        stats.last_sweep = Some(now);

        if removed > 0 {
            debug!("Purged {} expired entries from {} store", removed, self.kind);
        }
        removed
    }

    /// Clear every entry in this store unconditionally
    pub async fn flush_all(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();

        let mut stats = self.stats.write().await;
        stats.entry_count = 0;
    }

    /// Snapshot of internal statistics
    pub async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }

    /// Spawn the recurring expiry sweep for this store. Each store sweeps on
    /// its own cadence, independently of the others.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let entries = Arc::clone(&self.entries);
        let stats = Arc::clone(&self.stats);
        let interval = self.settings.sweep_interval;
        let kind = self.kind;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(interval));
            // The first tick fires immediately; skip it so a fresh store
            // isn't swept at startup.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let now = Utc::now();

                let (removed, remaining) = {
                    let mut entries_guard = entries.write().await;
                    let before = entries_guard.len();
                    entries_guard.retain(|_, entry| !entry.is_expired(now));
                    (before - entries_guard.len(), entries_guard.len())
                };

                let mut stats_guard = stats.write().await;
                stats_guard.expired_entries += removed as u64;
                stats_guard.last_sweep = Some(now);
                stats_guard.entry_count = remaining;
                drop(stats_guard);

                if removed > 0 {
                    debug!("Sweep removed {} expired entries from {} store", removed, kind);
                }
            }
        })
    }
}
