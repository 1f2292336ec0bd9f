// Engine Integration Tests
// End-to-end cache-aside flow: pattern lookup, fetch-on-miss, scoring,
// write-back, and hit-avoids-refetch behavior

use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sahha_geo_cache::{
    Biomarker, BiomarkerSource, CacheManager, GeoEngine, GeoError, ReadinessBand, Result,
};

/// Fetch collaborator spy: serves canned biomarkers and counts calls
struct SpySource {
    calls: AtomicUsize,
    fail: bool,
}

impl SpySource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BiomarkerSource for SpySource {
    async fn fetch_biomarkers(
        &self,
        _profile_id: &str,
        fields: &[String],
    ) -> Result<Vec<Biomarker>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GeoError::fetch("upstream unavailable"));
        }

        let now = Utc::now();
        Ok(fields
            .iter()
            .map(|field| Biomarker {
                biomarker_type: field.clone(),
                value: canned_value(field),
                unit: "count".to_string(),
                start_at: now,
                end_at: now,
            })
            .collect())
    }
}

fn canned_value(field: &str) -> f64 {
    match field {
        "recovery_heart_rate" => 45.0,
        "heart_rate_variability" => 80.0,
        "sleep_duration" => 8.0,
        "active_energy_burned" => 600.0,
        "resting_heart_rate" => 52.0,
        "sleep_efficiency" => 90.0,
        "sleep_debt" => 0.0,
        _ => 50.0,
    }
}

fn engine_with(source: Arc<SpySource>) -> GeoEngine {
    GeoEngine::new(Arc::new(CacheManager::with_defaults()), source)
}

#[tokio::test]
async fn test_cache_hit_avoids_refetch() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(Arc::clone(&source));

    let first = engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();
    assert_eq!(source.call_count(), 1);

    let second = engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();
    // Served from cache: the collaborator is not called again
    assert_eq!(source.call_count(), 1);
    assert_eq!(second.pattern_id, first.pattern_id);
    assert_eq!(second.score, first.score);
}

#[tokio::test]
async fn test_distinct_qualifiers_fetch_separately() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(Arc::clone(&source));

    engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();
    engine
        .evaluate("profile123", "workout_readiness", "yesterday")
        .await
        .unwrap();
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn test_scoring_through_engine() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(source);

    let result = engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();
    // Canned values sit at the optimal points of the clinical ranges
    assert_eq!(result.band, ReadinessBand::Exceptional);
    assert!(result.missing.is_empty());
    assert!(!result.insights.is_empty());
}

#[tokio::test]
async fn test_unknown_pattern_is_error_and_no_fetch() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(Arc::clone(&source));

    let result = engine.evaluate("profile123", "nonexistent", "today").await;
    assert!(matches!(result, Err(GeoError::Pattern { .. })));
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn test_fetch_failure_leaves_no_cache_entry() {
    let source = Arc::new(SpySource::failing());
    let engine = engine_with(Arc::clone(&source));

    let result = engine
        .evaluate("profile123", "workout_readiness", "today")
        .await;
    assert!(matches!(result, Err(GeoError::Fetch { .. })));
    assert_eq!(source.call_count(), 1);

    // Nothing was cached, so the next request retries the fetch
    let retry = engine
        .evaluate("profile123", "workout_readiness", "today")
        .await;
    assert!(retry.is_err());
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn test_engine_keys_route_to_biomarker_store() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(source);

    engine
        .evaluate("profile123", "morning_health_check", "today")
        .await
        .unwrap();

    let stats = engine.cache().get_stats().await;
    // "optimized_biomarkers:..." keys classify into the biomarker partition
    assert_eq!(stats.caches["biomarker"].entry_count, 1);
}

#[tokio::test]
async fn test_engine_stats_accounting() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(source);

    // Miss + fetch + set, then two hits
    engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();
    engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();
    engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();

    let stats = engine.cache().get_stats().await;
    assert_eq!(stats.requests.total, 3);
    assert_eq!(stats.requests.hits, 2);
    assert_eq!(stats.requests.misses, 1);
    assert_eq!(stats.operations.sets, 1);
}

#[tokio::test]
async fn test_execution_metrics_recorded_through_engine() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(source);

    engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();
    // Second call is a cache hit: the executor does not run again
    engine
        .evaluate("profile123", "workout_readiness", "today")
        .await
        .unwrap();

    let report = engine
        .executor()
        .metrics_for("workout_readiness")
        .await
        .unwrap();
    assert_eq!(report.usage_count, 1);
    assert_eq!(report.success_rate_percent, 100.0);
}

#[tokio::test]
async fn test_pattern_lookup_surface() {
    let source = Arc::new(SpySource::new());
    let engine = engine_with(source);

    let pattern = engine.registry().get_pattern("workout_readiness").unwrap();
    assert!(pattern
        .biomarkers
        .contains(&"recovery_heart_rate".to_string()));
    assert!(pattern
        .biomarkers
        .contains(&"heart_rate_variability".to_string()));

    let summaries = engine.registry().all_patterns();
    assert_eq!(summaries.len(), 20);
}
