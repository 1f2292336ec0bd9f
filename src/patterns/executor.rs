// Pattern Execution
// Computes weighted health sub-scores from fetched biomarkers and tracks
// per-pattern performance counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::ranges::{normalize, NEUTRAL_SCORE};
use super::{Biomarker, OptimizationPattern};
use crate::utils::error::{GeoError, Result};

/// Qualitative readiness band derived from a 0-100 composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessBand {
    Exceptional,
    Optimal,
    Good,
    Fair,
    NeedsAttention,
}

impl ReadinessBand {
    /// Band for a composite score
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Exceptional
        } else if score >= 80.0 {
            Self::Optimal
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else {
            Self::NeedsAttention
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exceptional => "Exceptional",
            Self::Optimal => "Optimal",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsAttention => "Needs Attention",
        }
    }
}

/// Structured output of one pattern execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Pattern that produced this result
    pub pattern_id: String,
    /// Weighted composite score, 0-100
    pub score: f64,
    /// Qualitative band for the score
    pub band: ReadinessBand,
    /// Normalized per-biomarker scores
    pub biomarker_scores: HashMap<String, f64>,
    /// Biomarkers absent from the fetched data (scored neutrally)
    pub missing: Vec<String>,
    /// Use-case insights for the score
    pub insights: Vec<String>,
    /// Suggested actions for low-scoring biomarkers
    pub recommendations: Vec<String>,
    /// Computation timestamp
    pub computed_at: DateTime<Utc>,
}

/// Monotonic per-pattern execution counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub usage_count: u64,
    pub total_time_ms: u64,
    pub success_count: u64,
}

/// Derived per-pattern performance view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub usage_count: u64,
    pub avg_response_time_ms: f64,
    pub success_rate_percent: f64,
}

impl PerformanceMetric {
    fn report(&self) -> PerformanceReport {
        let (avg, rate) = if self.usage_count > 0 {
            (
                self.total_time_ms as f64 / self.usage_count as f64,
                self.success_count as f64 / self.usage_count as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };
        PerformanceReport {
            usage_count: self.usage_count,
            avg_response_time_ms: avg,
            success_rate_percent: rate,
        }
    }
}

/// Executes optimization patterns against fetched biomarker data.
///
/// Missing data degrades the result gracefully (neutral scores) rather than
/// aborting; only a malformed pattern (empty weight table) is an error.
pub struct PatternExecutor {
    metrics: Arc<RwLock<HashMap<String, PerformanceMetric>>>,
}

impl PatternExecutor {
    /// Create a new executor with empty performance counters
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Execute a pattern against fetched biomarkers.
    ///
    /// Every call is counted in the pattern's [`PerformanceMetric`], success
    /// or failure; failures are counted before the error is returned.
    pub async fn execute_pattern(
        &self,
        pattern: &OptimizationPattern,
        fetched: &[Biomarker],
    ) -> Result<ScoredResult> {
        let start = Instant::now();
        let outcome = Self::compute(pattern, fetched);
        self.record(&pattern.id, start.elapsed().as_millis() as u64, outcome.is_ok())
            .await;
        outcome
    }

    fn compute(pattern: &OptimizationPattern, fetched: &[Biomarker]) -> Result<ScoredResult> {
        if pattern.scoring_weights.is_empty() {
            return Err(GeoError::scoring(format!(
                "Pattern '{}' has an empty scoring table",
                pattern.id
            )));
        }

        let by_type: HashMap<&str, f64> = fetched
            .iter()
            .map(|b| (b.biomarker_type.as_str(), b.value))
            .collect();

        let mut biomarker_scores = HashMap::new();
        let mut missing = Vec::new();
        let mut weighted_sum = 0.0;
        let mut weight_mass = 0.0;

        // Iterate the declared field order so `missing` stays deterministic
        for name in &pattern.biomarkers {
            let weight = match pattern.scoring_weights.get(name) {
                Some(weight) => *weight,
                None => continue,
            };
            let normalized = match by_type.get(name.as_str()) {
                Some(value) => normalize(name, *value),
                None => {
                    missing.push(name.clone());
                    NEUTRAL_SCORE
                }
            };
            biomarker_scores.insert(name.clone(), normalized);
            weighted_sum += normalized * weight;
            weight_mass += weight;
        }

        // Zero weight mass would divide by zero; fall back to neutral
        let score = if weight_mass > 0.0 {
            weighted_sum / weight_mass
        } else {
            warn!(
                "Pattern '{}' has zero weight mass; returning neutral score",
                pattern.id
            );
            NEUTRAL_SCORE
        };

        let band = ReadinessBand::from_score(score);
        let insights = build_insights(pattern, band, &missing);
        let recommendations = build_recommendations(&biomarker_scores);

        debug!(
            "Executed pattern '{}': score {:.1} ({})",
            pattern.id,
            score,
            band.label()
        );

        Ok(ScoredResult {
            pattern_id: pattern.id.clone(),
            score,
            band,
            biomarker_scores,
            missing,
            insights,
            recommendations,
            computed_at: Utc::now(),
        })
    }

    async fn record(&self, pattern_id: &str, elapsed_ms: u64, success: bool) {
        let mut metrics = self.metrics.write().await;
        let metric = metrics.entry(pattern_id.to_string()).or_default();
        metric.usage_count += 1;
        metric.total_time_ms += elapsed_ms;
        if success {
            metric.success_count += 1;
        }
    }

    /// Derived performance view for one pattern
    pub async fn metrics_for(&self, pattern_id: &str) -> Option<PerformanceReport> {
        let metrics = self.metrics.read().await;
        metrics.get(pattern_id).map(|m| m.report())
    }

    /// Derived performance view for every executed pattern
    pub async fn all_metrics(&self) -> HashMap<String, PerformanceReport> {
        let metrics = self.metrics.read().await;
        metrics
            .iter()
            .map(|(id, m)| (id.clone(), m.report()))
            .collect()
    }
}

impl Default for PatternExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn build_insights(
    pattern: &OptimizationPattern,
    band: ReadinessBand,
    missing: &[String],
) -> Vec<String> {
    let mut insights = Vec::new();

    insights.push(match band {
        ReadinessBand::Exceptional => {
            format!("{}: all tracked markers are in top form", pattern.name)
        }
        ReadinessBand::Optimal => {
            format!("{}: markers are solidly in the optimal zone", pattern.name)
        }
        ReadinessBand::Good => format!("{}: on track with minor room to improve", pattern.name),
        ReadinessBand::Fair => {
            format!("{}: a few markers are dragging the score down", pattern.name)
        }
        ReadinessBand::NeedsAttention => {
            format!("{}: several markers need attention today", pattern.name)
        }
    });

    if !missing.is_empty() {
        insights.push(format!(
            "Partial data: {} of {} biomarkers unavailable, scored neutrally",
            missing.len(),
            pattern.biomarkers.len()
        ));
    }

    insights
}

fn build_recommendations(biomarker_scores: &HashMap<String, f64>) -> Vec<String> {
    let mut weak: Vec<(&str, f64)> = biomarker_scores
        .iter()
        .filter(|(_, score)| **score < 60.0)
        .map(|(name, score)| (name.as_str(), *score))
        .collect();
    weak.sort_by(|a, b| a.1.total_cmp(&b.1));

    weak.into_iter()
        .take(3)
        .map(|(name, _)| match name {
            "sleep_duration" | "sleep_debt" => {
                "Prioritize an earlier bedtime to rebuild sleep reserves".to_string()
            }
            "sleep_efficiency" | "sleep_latency" | "sleep_regularity" => {
                "Keep a consistent wind-down routine to improve sleep quality".to_string()
            }
            "heart_rate_variability" | "resting_heart_rate" | "recovery_heart_rate" => {
                "Favor light recovery activity until cardiac markers rebound".to_string()
            }
            "stress_level" => {
                "Schedule short breaks or breathing exercises to lower stress load".to_string()
            }
            "steps" | "activity_duration" | "active_hours" | "floors_climbed" => {
                "Add short walks through the day to lift activity volume".to_string()
            }
            "sedentary_duration" => {
                "Break up long sitting blocks with movement every hour".to_string()
            }
            other => format!("Review {} against recent trends", other),
        })
        .collect()
}
