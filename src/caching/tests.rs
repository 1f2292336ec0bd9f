// Cache Manager Tests
// Exercises classification routing, TTL resolution, expiry, counters, and
// the maintenance surface through the public API

use super::{CacheManager, StoreKind};
use crate::config::CacheSettings;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TestPayload {
    id: u32,
    name: String,
    values: Vec<f64>,
}

fn payload() -> TestPayload {
    TestPayload {
        id: 7,
        name: "sleep batch".to_string(),
        values: vec![7.5, 6.8, 8.1],
    }
}

#[tokio::test]
async fn test_round_trip() {
    let cache = CacheManager::with_defaults();
    let original = payload();

    assert!(cache.set("biomarker:p1:sleep", &original, None).await);
    let cached: TestPayload = cache.get_as("biomarker:p1:sleep").await.unwrap();
    assert_eq!(cached, original);
}

#[tokio::test]
async fn test_miss_on_absent_key() {
    let cache = CacheManager::with_defaults();
    assert!(cache.get("biomarker:p1:absent").await.is_none());
}

#[tokio::test]
async fn test_miss_after_expiry() {
    let cache = CacheManager::with_defaults();
    assert!(cache.set("biomarker:p1:shortlived", &payload(), Some(1)).await);
    assert!(cache.get("biomarker:p1:shortlived").await.is_some());

    sleep(Duration::from_millis(1200)).await;
    // Expired but not yet swept: must still report a miss
    assert!(cache.get("biomarker:p1:shortlived").await.is_none());
}

#[tokio::test]
async fn test_explicit_ttl_override_wins() {
    let cache = CacheManager::with_defaults();
    // Policy would derive 14400s from the key; the override must win
    assert!(
        cache
            .set("pattern:p1:morning_health_check", &payload(), Some(42))
            .await
    );
    let metadata = cache
        .entry_metadata("pattern:p1:morning_health_check")
        .await
        .unwrap();
    assert_eq!(metadata.ttl_seconds, 42);
    // The refresh strategy still reflects the key, independent of the TTL
    assert_eq!(metadata.refresh_strategy.refresh_time, "06:00");
}

#[tokio::test]
async fn test_policy_ttl_applied_without_override() {
    let cache = CacheManager::with_defaults();
    assert!(cache.set("resource:api:docs", &json!({"doc": true}), None).await);
    let metadata = cache.entry_metadata("resource:api:docs").await.unwrap();
    assert_eq!(metadata.ttl_seconds, 900);
}

#[tokio::test]
async fn test_idempotent_delete() {
    let cache = CacheManager::with_defaults();
    assert!(cache.set("insight:p1:weekly", &payload(), None).await);

    assert!(cache.delete("insight:p1:weekly").await);
    // Second delete finds nothing and must not error
    assert!(!cache.delete("insight:p1:weekly").await);
}

#[tokio::test]
async fn test_overwrite_replaces_value() {
    let cache = CacheManager::with_defaults();
    assert!(cache.set("biomarker:p1:steps", &json!(4000), None).await);
    assert!(cache.set("biomarker:p1:steps", &json!(9000), None).await);
    assert_eq!(cache.get("biomarker:p1:steps").await.unwrap(), json!(9000));
}

#[tokio::test]
async fn test_clear_pattern_scoping() {
    let cache = CacheManager::with_defaults();
    cache.set("biomarker:p1:sleep", &json!(1), None).await;
    cache.set("biomarker:p2:sleep", &json!(2), None).await;
    cache.set("pattern:p1:workout", &json!(3), None).await;
    cache.set("resource:docs:index", &json!(4), None).await;

    let cleared = cache.clear_pattern(":p1:").await;
    let total: u64 = cleared.values().sum();
    assert_eq!(total, 2);

    // Entries whose key does not contain the fragment are untouched
    assert!(cache.get("biomarker:p2:sleep").await.is_some());
    assert!(cache.get("resource:docs:index").await.is_some());
    assert!(cache.get("biomarker:p1:sleep").await.is_none());
    assert!(cache.get("pattern:p1:workout").await.is_none());
}

#[tokio::test]
async fn test_invalidate_profile_wrapper() {
    let cache = CacheManager::with_defaults();
    cache.set("biomarker:p9:sleep", &json!(1), None).await;
    cache.set("insight:p9:weekly", &json!(2), None).await;
    cache.set("biomarker:p10:sleep", &json!(3), None).await;

    let cleared = cache.invalidate_profile("p9").await;
    let total: u64 = cleared.values().sum();
    assert_eq!(total, 2);
    assert!(cache.get("biomarker:p10:sleep").await.is_some());
}

#[tokio::test]
async fn test_stats_accounting() {
    let cache = CacheManager::with_defaults();
    assert!(cache.set("biomarker:p1:sleep", &payload(), None).await);

    // 2 hits, 1 miss
    assert!(cache.get("biomarker:p1:sleep").await.is_some());
    assert!(cache.get("biomarker:p1:sleep").await.is_some());
    assert!(cache.get("biomarker:p1:missing").await.is_none());

    let stats = cache.get_stats().await;
    assert_eq!(stats.requests.total, 3);
    assert_eq!(stats.requests.hits, 2);
    assert_eq!(stats.requests.misses, 1);
    assert_eq!(stats.operations.sets, 1);
    assert_eq!(stats.operations.deletes, 0);
    assert!((stats.requests.hit_rate - 66.666).abs() < 0.01);

    // efficiency = hit% - (sets/total)*10
    let expected = stats.requests.hit_rate - (1.0 / 3.0) * 10.0;
    assert!((stats.performance.efficiency - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_stats_empty_cache() {
    let cache = CacheManager::with_defaults();
    let stats = cache.get_stats().await;
    assert_eq!(stats.requests.total, 0);
    assert_eq!(stats.requests.hit_rate, 0.0);
    assert_eq!(stats.performance.efficiency, 0.0);
    assert_eq!(stats.caches.len(), 4);
}

#[tokio::test]
async fn test_per_store_stats_reflect_routing() {
    let cache = CacheManager::with_defaults();
    cache.set("biomarker:p1:sleep", &json!(1), None).await;
    cache.set("pattern:p1:workout", &json!(2), None).await;
    cache.set("unmatched_key", &json!(3), None).await;

    let stats = cache.get_stats().await;
    // Unmatched keys land in the biomarker partition
    assert_eq!(stats.caches["biomarker"].entry_count, 2);
    assert_eq!(stats.caches["pattern"].entry_count, 1);
    assert_eq!(stats.caches["resource"].entry_count, 0);
    assert_eq!(stats.caches["insight"].entry_count, 0);
}

#[tokio::test]
async fn test_smart_refresh_flagging() {
    let cache = CacheManager::with_defaults();
    // Continuous strategy from the key, short TTL from the override
    assert!(
        cache
            .set("pattern:p1:workout_readiness", &payload(), Some(2))
            .await
    );

    // Before 80% of TTL: read must not flag
    assert!(cache.get("pattern:p1:workout_readiness").await.is_some());
    assert!(cache.take_refresh_flags().await.is_empty());

    sleep(Duration::from_millis(1700)).await;
    // Past 80% of TTL but not expired: entry still served, key flagged
    assert!(cache.get("pattern:p1:workout_readiness").await.is_some());
    let flags = cache.take_refresh_flags().await;
    assert_eq!(flags, vec!["pattern:p1:workout_readiness".to_string()]);

    // Flags are drained on read
    assert!(cache.take_refresh_flags().await.is_empty());
}

#[tokio::test]
async fn test_non_continuous_entries_never_flagged() {
    let cache = CacheManager::with_defaults();
    assert!(
        cache
            .set("pattern:p1:morning_health_check", &payload(), Some(2))
            .await
    );

    sleep(Duration::from_millis(1700)).await;
    assert!(cache.get("pattern:p1:morning_health_check").await.is_some());
    assert!(cache.take_refresh_flags().await.is_empty());
}

#[tokio::test]
async fn test_warm_cache_populates_markers() {
    let cache = CacheManager::with_defaults();
    cache.warm_cache().await;

    let warmed = cache.get("pattern:warm:workout_readiness").await.unwrap();
    assert_eq!(warmed["warmed"], json!(true));
    assert!(cache.get("biomarker:metadata:catalog").await.is_some());

    let stats = cache.get_stats().await;
    assert_eq!(stats.operations.sets, 5);
}

#[tokio::test]
async fn test_warm_cache_respects_disable() {
    let settings = CacheSettings {
        warm_on_start: false,
        ..CacheSettings::default()
    };
    let cache = CacheManager::new(settings);
    cache.warm_cache().await;
    assert!(cache.get("pattern:warm:workout_readiness").await.is_none());
}

#[tokio::test]
async fn test_optimize_clears_expired_entries() {
    let cache = CacheManager::with_defaults();
    cache.set("biomarker:p1:short", &json!(1), Some(1)).await;
    cache.set("biomarker:p1:long", &json!(2), None).await;

    sleep(Duration::from_millis(1200)).await;
    let report = cache.optimize().await;
    assert!(report.optimized);
    assert_eq!(report.cleared_entries, 1);
    assert!(report.error.is_none());

    assert!(cache.get("biomarker:p1:long").await.is_some());
}

#[tokio::test]
async fn test_bulk_operations() {
    let cache = CacheManager::with_defaults();

    let mut values = HashMap::new();
    values.insert("biomarker:p1:sleep".to_string(), json!(7.5));
    values.insert("insight:p1:weekly".to_string(), json!("rest more"));

    let set_results = cache.set_bulk(&values).await;
    assert_eq!(set_results.len(), 2);
    assert!(set_results.values().all(|ok| *ok));

    let got = cache
        .get_bulk(&["biomarker:p1:sleep", "insight:p1:weekly", "missing_key"])
        .await;
    assert_eq!(got["biomarker:p1:sleep"], Some(json!(7.5)));
    assert_eq!(got["insight:p1:weekly"], Some(json!("rest more")));
    assert_eq!(got["missing_key"], None);
}

#[tokio::test]
async fn test_keys_filtering() {
    let cache = CacheManager::with_defaults();
    cache.set("biomarker:p1:sleep", &json!(1), None).await;
    cache.set("pattern:p1:workout", &json!(2), None).await;
    cache.set("resource:docs:index", &json!(3), None).await;

    let all = cache.keys(None).await;
    assert_eq!(all.len(), 3);

    let p1_keys = cache.keys(Some(":p1:")).await;
    assert_eq!(p1_keys.len(), 2);
}

#[tokio::test]
async fn test_flush_all() {
    let cache = CacheManager::with_defaults();
    cache.set("biomarker:p1:sleep", &json!(1), None).await;
    cache.set("pattern:p1:workout", &json!(2), None).await;
    cache.set("insight:p1:weekly", &json!(3), None).await;

    cache.flush_all().await;
    assert!(cache.keys(None).await.is_empty());
}

#[tokio::test]
async fn test_same_key_same_store_for_process_lifetime() {
    let cache = CacheManager::with_defaults();
    // Write routed through classification; read must find it again through
    // the same classification
    for key in ["geo:catalog", "documentation:tools", "recommendation:p1:x"] {
        assert!(cache.set(key, &json!("v"), None).await);
        assert!(cache.get(key).await.is_some(), "lost key {}", key);
    }
    let stats = cache.get_stats().await;
    assert_eq!(stats.caches["pattern"].entry_count, 1);
    assert_eq!(stats.caches["resource"].entry_count, 1);
    assert_eq!(stats.caches["insight"].entry_count, 1);
}

#[tokio::test]
async fn test_sweeper_removes_expired_entries() {
    let settings = CacheSettings {
        biomarker: crate::config::StoreSettings {
            default_ttl: 1800,
            sweep_interval: 1,
        },
        ..CacheSettings::default()
    };
    let cache = CacheManager::new(settings);
    let handles = cache.start_sweepers();
    assert_eq!(handles.len(), 4);

    cache.set("biomarker:p1:short", &json!(1), Some(1)).await;
    sleep(Duration::from_millis(2500)).await;

    // Swept in the background; the key listing no longer includes it
    assert!(cache.keys(Some("short")).await.is_empty());
    for handle in handles {
        handle.abort();
    }
}

#[test]
fn test_store_kind_labels() {
    assert_eq!(StoreKind::Biomarker.as_str(), "biomarker");
    assert_eq!(StoreKind::Pattern.to_string(), "pattern");
    assert_eq!(StoreKind::ALL.len(), 4);
}
