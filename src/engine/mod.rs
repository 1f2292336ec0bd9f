// GEO Engine
// Cache-aside orchestration of one tool invocation: pattern lookup, cache
// probe, upstream fetch on miss, scoring, write-back.

use std::sync::Arc;
use tracing::{debug, info};

use crate::caching::CacheManager;
use crate::patterns::{Biomarker, PatternExecutor, PatternRegistry, ScoredResult};
use crate::utils::error::{GeoError, Result};

/// The upstream biomarker fetch collaborator: an opaque, possibly-slow,
/// possibly-failing remote call. The engine never retries it; a failed fetch
/// just leaves no cache entry, so the next request retries naturally.
#[async_trait::async_trait]
pub trait BiomarkerSource: Send + Sync {
    /// Fetch the named biomarker fields for a profile
    async fn fetch_biomarkers(&self, profile_id: &str, fields: &[String])
        -> Result<Vec<Biomarker>>;
}

/// Orchestrator wiring the pattern registry, cache, executor, and the
/// injected fetch collaborator together
pub struct GeoEngine {
    cache: Arc<CacheManager>,
    registry: PatternRegistry,
    executor: PatternExecutor,
    source: Arc<dyn BiomarkerSource>,
}

impl GeoEngine {
    /// Create a new engine
    pub fn new(cache: Arc<CacheManager>, source: Arc<dyn BiomarkerSource>) -> Self {
        Self {
            cache,
            registry: PatternRegistry::new(),
            executor: PatternExecutor::new(),
            source,
        }
    }

    /// The cache manager in use
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// The pattern registry in use
    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// The pattern executor in use
    pub fn executor(&self) -> &PatternExecutor {
        &self.executor
    }

    /// Cache key convention shared with the classifier and TTL policy; an
    /// inconsistent key format silently changes store and TTL routing
    pub fn cache_key(profile_id: &str, pattern_id: &str, qualifier: &str) -> String {
        format!(
            "optimized_biomarkers:{}:{}:{}",
            profile_id, pattern_id, qualifier
        )
    }

    /// Evaluate a pattern for a profile. Cache hit short-circuits the fetch;
    /// on miss the reduced biomarker set is fetched, scored, and written back
    /// with a policy-derived TTL.
    pub async fn evaluate(
        &self,
        profile_id: &str,
        pattern_id: &str,
        qualifier: &str,
    ) -> Result<ScoredResult> {
        let key = Self::cache_key(profile_id, pattern_id, qualifier);

        if let Some(cached) = self.cache.get_as::<ScoredResult>(&key).await {
            debug!("Serving cached result for {}", key);
            return Ok(cached);
        }

        let pattern = self
            .registry
            .get_pattern(pattern_id)
            .ok_or_else(|| GeoError::pattern(format!("Unknown pattern id: {}", pattern_id)))?;

        let fetched = self
            .source
            .fetch_biomarkers(profile_id, &pattern.biomarkers)
            .await?;
        info!(
            "Fetched {} biomarkers for {} ({})",
            fetched.len(),
            profile_id,
            pattern_id
        );

        let result = self.executor.execute_pattern(&pattern, &fetched).await?;
        self.cache.set(&key, &result, None).await;
        Ok(result)
    }
}
