// GEO Pattern Cache
// Type-routed multi-store cache with per-key adaptive TTL and smart-refresh
// bookkeeping. Keys are partitioned by semantic data type, not by hash.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::CacheSettings;
use crate::utils::error::{GeoError, Result};

pub mod classifier;
pub mod store;
pub mod ttl;

#[cfg(test)]
mod tests;

pub use classifier::{classify, StoreKind};
pub use store::{CacheEntry, StoreStats, TypedStore};
pub use ttl::{resolve_refresh_strategy, resolve_ttl, Priority, RefreshStrategy};

/// Operation counters tracked at the manager level
#[derive(Debug, Clone, Default)]
struct CacheCounters {
    hits: u64,
    misses: u64,
    sets: u64,
    deletes: u64,
}

/// Request-level statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStats {
    /// Total get requests
    pub total: u64,
    /// Requests served from cache
    pub hits: u64,
    /// Requests that missed
    pub misses: u64,
    /// Hit rate as a percentage
    pub hit_rate: f64,
}

/// Write/delete operation statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationStats {
    /// Total set operations
    pub sets: u64,
    /// Total delete operations
    pub deletes: u64,
}

/// Derived performance statistics.
///
/// `efficiency` penalizes write-heavy, low-reuse access patterns:
/// `hit_rate_percent - (sets / total_requests) * 10`. Diagnostic only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Hit rate as a percentage
    pub hit_rate: f64,
    /// Efficiency heuristic
    pub efficiency: f64,
}

/// Full statistics snapshot returned by [`CacheManager::get_stats`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Request accounting
    pub requests: RequestStats,
    /// Write/delete accounting
    pub operations: OperationStats,
    /// Per-store key counts and internal stats
    pub caches: HashMap<String, StoreStats>,
    /// Derived performance metrics
    pub performance: PerformanceStats,
}

/// Result of a maintenance pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeReport {
    /// Whether the pass completed
    pub optimized: bool,
    /// Expired entries force-cleared across all stores
    pub cleared_entries: usize,
    /// Pass timestamp
    pub timestamp: DateTime<Utc>,
    /// Error description when the pass failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Observable entry metadata (the envelope minus the payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Write timestamp
    pub cached_at: DateTime<Utc>,
    /// Effective TTL in seconds
    pub ttl_seconds: u64,
    /// Refresh strategy frozen at write time
    pub refresh_strategy: RefreshStrategy,
}

/// Cache orchestrator: composes the key classifier, the TTL policy, and the
/// four typed stores.
///
/// Construct one instance per host process and pass it by reference into
/// whatever serves tool calls; there is no hidden global. Every public
/// operation degrades to a safe default instead of propagating internal
/// errors, so the cache can only ever cost the caller a miss, never a crash.
pub struct CacheManager {
    biomarker: TypedStore,
    pattern: TypedStore,
    resource: TypedStore,
    insight: TypedStore,
    counters: Arc<RwLock<CacheCounters>>,
    /// Keys flagged for ahead-of-expiry refresh. A side-channel signal only;
    /// nothing here triggers a refetch.
    refresh_flags: Arc<RwLock<HashSet<String>>>,
    refresh_threshold: f64,
    warm_on_start: bool,
}

impl CacheManager {
    /// Create a new cache manager from settings
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            biomarker: TypedStore::new(StoreKind::Biomarker, settings.biomarker.clone()),
            pattern: TypedStore::new(StoreKind::Pattern, settings.pattern.clone()),
            resource: TypedStore::new(StoreKind::Resource, settings.resource.clone()),
            insight: TypedStore::new(StoreKind::Insight, settings.insight.clone()),
            counters: Arc::new(RwLock::new(CacheCounters::default())),
            refresh_flags: Arc::new(RwLock::new(HashSet::new())),
            refresh_threshold: settings.refresh_threshold,
            warm_on_start: settings.warm_on_start,
        }
    }

    /// Create with default settings
    pub fn with_defaults() -> Self {
        Self::new(CacheSettings::default())
    }

    /// Spawn the per-store background expiry sweeps
    pub fn start_sweepers(&self) -> Vec<tokio::task::JoinHandle<()>> {
        let handles = self
            .stores()
            .into_iter()
            .map(|store| store.spawn_sweeper())
            .collect();
        info!("Started expiry sweep tasks for {} stores", StoreKind::ALL.len());
        handles
    }

    fn stores(&self) -> [&TypedStore; 4] {
        [&self.biomarker, &self.pattern, &self.resource, &self.insight]
    }

    fn store_for(&self, key: &str) -> &TypedStore {
        match classifier::classify(key) {
            StoreKind::Biomarker => &self.biomarker,
            StoreKind::Pattern => &self.pattern,
            StoreKind::Resource => &self.resource,
            StoreKind::Insight => &self.insight,
        }
    }

    /// Get a cached value. Returns `None` on miss, expiry, or internal error.
    ///
    /// When the stored envelope carries a continuous refresh strategy and the
    /// entry's age exceeds the refresh threshold share of its TTL, the key is
    /// flagged for smart refresh (observable via [`take_refresh_flags`]); the
    /// entry is still returned.
    ///
    /// [`take_refresh_flags`]: CacheManager::take_refresh_flags
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entry = self.store_for(key).get(key).await;

        let mut counters = self.counters.write().await;
        match entry {
            Some(entry) => {
                counters.hits += 1;
                drop(counters);

                if entry.is_refresh_due(Utc::now(), self.refresh_threshold) {
                    let mut flags = self.refresh_flags.write().await;
                    if flags.insert(key.to_string()) {
                        debug!("Flagged entry for smart refresh: {}", key);
                    }
                }
                Some(entry.value)
            }
            None => {
                counters.misses += 1;
                None
            }
        }
    }

    /// Get a cached value deserialized into `T`. A payload that fails to
    /// deserialize is treated as a miss (logged, not propagated).
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!("Cached value for {} failed to deserialize: {}", key, e);
                None
            }
        }
    }

    /// Store a value. The TTL is the explicit override when supplied,
    /// otherwise policy-derived from the key. Returns whether the write
    /// succeeded; failures are logged and reported as `false`.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        explicit_ttl: Option<u64>,
    ) -> bool {
        match self.try_set(key, value, explicit_ttl).await {
            Ok(()) => {
                let mut counters = self.counters.write().await;
                counters.sets += 1;
                true
            }
            Err(e) => {
                warn!("Cache set failed for {}: {}", key, e);
                false
            }
        }
    }

    async fn try_set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        explicit_ttl: Option<u64>,
    ) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| GeoError::cache(format!("Serialization failed: {}", e)))?;

        let ttl_seconds = ttl::resolve_ttl(key, explicit_ttl);
        let refresh_strategy = ttl::resolve_refresh_strategy(key);

        let entry = CacheEntry {
            value,
            cached_at: Utc::now(),
            ttl_seconds,
            refresh_strategy,
        };

        self.store_for(key).set(key, entry).await;
        debug!("Cached entry: {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    /// Delete a cached value. Idempotent; returns whether something was
    /// removed.
    pub async fn delete(&self, key: &str) -> bool {
        let removed = self.store_for(key).delete(key).await;

        let mut counters = self.counters.write().await;
        counters.deletes += 1;
        drop(counters);

        if removed {
            debug!("Deleted cache entry: {}", key);
        }
        removed
    }

    /// Delete every entry whose key contains `fragment`, across all stores.
    /// Returns per-store removal counts. On internal error returns an empty
    /// map.
    pub async fn clear_pattern(&self, fragment: &str) -> HashMap<StoreKind, u64> {
        let mut cleared = HashMap::new();

        for store in self.stores() {
            let keys = store.keys(Some(fragment)).await;
            let mut count = 0u64;
            for key in keys {
                if store.delete(&key).await {
                    count += 1;
                }
            }
            cleared.insert(store.kind(), count);
        }

        let total: u64 = cleared.values().sum();
        if total > 0 {
            info!("Cleared {} entries matching '{}'", total, fragment);
        }
        cleared
    }

    /// Invalidate every cached entry for a profile
    pub async fn invalidate_profile(&self, profile_id: &str) -> HashMap<StoreKind, u64> {
        self.clear_pattern(&format!(":{}:", profile_id)).await
    }

    /// Invalidate biomarker data for a profile
    pub async fn invalidate_biomarker(&self, profile_id: &str) -> HashMap<StoreKind, u64> {
        self.clear_pattern(&format!("biomarker:{}", profile_id)).await
    }

    /// Invalidate cached results for a named pattern
    pub async fn invalidate_pattern(&self, pattern_id: &str) -> HashMap<StoreKind, u64> {
        self.clear_pattern(pattern_id).await
    }

    /// Pre-populate well-known keys with placeholder markers. Best-effort:
    /// failures are logged and swallowed, never fatal.
    pub async fn warm_cache(&self) {
        if !self.warm_on_start {
            return;
        }

        info!("Starting cache warming");

        let warm_patterns = [
            "morning_health_check",
            "workout_readiness",
            "sleep_optimization",
            "stress_management",
        ];

        for pattern_id in warm_patterns {
            let key = format!("pattern:warm:{}", pattern_id);
            let marker = serde_json::json!({
                "warmed": true,
                "pattern": pattern_id,
                "warmed_at": Utc::now().to_rfc3339(),
            });
            if !self.set(&key, &marker, None).await {
                warn!("Cache warming failed for pattern: {}", pattern_id);
            }
        }

        let metadata_marker = serde_json::json!({
            "warmed": true,
            "catalog": "biomarker_metadata",
            "warmed_at": Utc::now().to_rfc3339(),
        });
        if !self
            .set("biomarker:metadata:catalog", &metadata_marker, None)
            .await
        {
            warn!("Cache warming failed for biomarker metadata");
        }

        info!("Cache warming completed");
    }

    /// Statistics snapshot across all stores
    pub async fn get_stats(&self) -> CacheStats {
        let counters = self.counters.read().await.clone();
        let total = counters.hits + counters.misses;
        let hit_rate = if total > 0 {
            counters.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let efficiency = if total > 0 {
            hit_rate - (counters.sets as f64 / total as f64) * 10.0
        } else {
            0.0
        };

        let mut caches = HashMap::new();
        for store in self.stores() {
            caches.insert(store.kind().as_str().to_string(), store.stats().await);
        }

        CacheStats {
            requests: RequestStats {
                total,
                hits: counters.hits,
                misses: counters.misses,
                hit_rate,
            },
            operations: OperationStats {
                sets: counters.sets,
                deletes: counters.deletes,
            },
            caches,
            performance: PerformanceStats {
                hit_rate,
                efficiency,
            },
        }
    }

    /// Best-effort maintenance pass: force-clear expired entries in every
    /// store. Never throws; an internal failure is reported in the result.
    pub async fn optimize(&self) -> OptimizeReport {
        let mut cleared = 0usize;
        for store in self.stores() {
            cleared += store.purge_expired().await;
        }

        info!("Cache optimization cleared {} expired entries", cleared);
        OptimizeReport {
            optimized: true,
            cleared_entries: cleared,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Fan-out get over several keys. No atomicity across keys.
    pub async fn get_bulk(&self, keys: &[&str]) -> HashMap<String, Option<serde_json::Value>> {
        let mut results = HashMap::new();
        for key in keys {
            results.insert(key.to_string(), self.get(key).await);
        }
        results
    }

    /// Fan-out set over several key/value pairs. No atomicity across keys.
    pub async fn set_bulk(
        &self,
        values: &HashMap<String, serde_json::Value>,
    ) -> HashMap<String, bool> {
        let mut results = HashMap::new();
        for (key, value) in values {
            results.insert(key.clone(), self.set(key, value, None).await);
        }
        results
    }

    /// Drain the set of keys flagged for smart refresh. Callers that want
    /// refresh-ahead behavior poll this and refetch on their own schedule.
    pub async fn take_refresh_flags(&self) -> Vec<String> {
        let mut flags = self.refresh_flags.write().await;
        flags.drain().collect()
    }

    /// Envelope metadata for a live entry, without touching hit/miss
    /// accounting semantics beyond a normal store read
    pub async fn entry_metadata(&self, key: &str) -> Option<EntryMetadata> {
        let entry = self.store_for(key).get(key).await?;
        Some(EntryMetadata {
            cached_at: entry.cached_at,
            ttl_seconds: entry.ttl_seconds,
            refresh_strategy: entry.refresh_strategy,
        })
    }

    /// Live keys across every store, optionally filtered by substring
    pub async fn keys(&self, substring_filter: Option<&str>) -> Vec<String> {
        let mut all = Vec::new();
        for store in self.stores() {
            all.extend(store.keys(substring_filter).await);
        }
        all
    }

    /// Clear every entry in every store
    pub async fn flush_all(&self) {
        for store in self.stores() {
            store.flush_all().await;
        }
        info!("Flushed all cache stores");
    }
}
