// GEO Optimization Patterns
// Static catalog of named biomarker subsets with scoring-weight tables.
// Each pattern answers one health question against a reduced field list
// instead of the full ~184-field biomarker catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub mod executor;
pub mod ranges;

pub use executor::{
    PatternExecutor, PerformanceMetric, PerformanceReport, ReadinessBand, ScoredResult,
};
pub use ranges::{normalize, range_for, ClinicalRange, NEUTRAL_SCORE};

/// A single named, timestamped health measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Biomarker {
    /// Biomarker type name (e.g. "sleep_duration")
    #[serde(rename = "type")]
    pub biomarker_type: String,
    /// Measured value
    pub value: f64,
    /// Unit of measure
    pub unit: String,
    /// Measurement window start
    pub start_at: DateTime<Utc>,
    /// Measurement window end
    pub end_at: DateTime<Utc>,
}

/// One optimization pattern: a curated biomarker subset plus scoring weights.
///
/// Immutable after registry load. Weights are designed to sum to ~1.0 per
/// pattern but this is not enforced; the executor divides by the weight mass
/// it actually finds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationPattern {
    /// Stable pattern id, used in cache keys and lookups
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What question this pattern answers
    pub description: String,
    /// Required biomarker field names, in query order
    pub biomarkers: Vec<String>,
    /// Biomarker name -> weight in [0, 1]
    pub scoring_weights: HashMap<String, f64>,
}

/// Catalog listing entry with derived metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub biomarker_count: usize,
    pub category: String,
}

/// Ordered category routes, first id-substring match wins (same style as the
/// cache key classifier)
const CATEGORY_ROUTES: &[(&[&str], &str)] = &[
    (&["sleep", "circadian"], "sleep"),
    (&["cardio", "heart", "hrv", "respiratory", "endurance"], "cardiovascular"),
    (&["stress", "wellbeing"], "wellbeing"),
    (
        &["workout", "training", "activity", "active", "sedentary", "overtraining"],
        "fitness",
    ),
];

fn category_for(pattern_id: &str) -> &'static str {
    for (needles, category) in CATEGORY_ROUTES {
        if needles.iter().any(|needle| pattern_id.contains(needle)) {
            return category;
        }
    }
    "general"
}

fn pattern(
    id: &str,
    name: &str,
    description: &str,
    weights: &[(&str, f64)],
) -> OptimizationPattern {
    OptimizationPattern {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        biomarkers: weights.iter().map(|(field, _)| field.to_string()).collect(),
        scoring_weights: weights
            .iter()
            .map(|(field, weight)| (field.to_string(), *weight))
            .collect(),
    }
}

fn catalog() -> Vec<OptimizationPattern> {
    vec![
        pattern(
            "workout_readiness",
            "Workout Readiness",
            "Is the body recovered enough for a hard session today?",
            &[
                ("recovery_heart_rate", 0.3),
                ("heart_rate_variability", 0.3),
                ("sleep_duration", 0.2),
                ("active_energy_burned", 0.2),
            ],
        ),
        pattern(
            "morning_health_check",
            "Morning Health Check",
            "Overnight recovery snapshot for the start of the day",
            &[
                ("sleep_duration", 0.3),
                ("sleep_efficiency", 0.2),
                ("heart_rate_variability", 0.2),
                ("resting_heart_rate", 0.2),
                ("sleep_debt", 0.1),
            ],
        ),
        pattern(
            "sleep_optimization",
            "Sleep Optimization",
            "Sleep quantity and quality against personal targets",
            &[
                ("sleep_duration", 0.3),
                ("sleep_efficiency", 0.25),
                ("sleep_regularity", 0.2),
                ("sleep_latency", 0.15),
                ("sleep_debt", 0.1),
            ],
        ),
        pattern(
            "stress_management",
            "Stress Management",
            "Current physiological stress load and buffers",
            &[
                ("stress_level", 0.35),
                ("heart_rate_variability", 0.25),
                ("resting_heart_rate", 0.2),
                ("sleep_duration", 0.2),
            ],
        ),
        pattern(
            "recovery_tracking",
            "Recovery Tracking",
            "Day-over-day recovery trend after training load",
            &[
                ("heart_rate_variability", 0.3),
                ("resting_heart_rate", 0.25),
                ("sleep_duration", 0.25),
                ("sedentary_duration", 0.2),
            ],
        ),
        pattern(
            "energy_management",
            "Energy Management",
            "Available energy budget for the rest of the day",
            &[
                ("sleep_duration", 0.25),
                ("active_energy_burned", 0.25),
                ("steps", 0.2),
                ("stress_level", 0.15),
                ("sleep_debt", 0.15),
            ],
        ),
        pattern(
            "cardiovascular_fitness",
            "Cardiovascular Fitness",
            "Aerobic capacity and cardiac efficiency markers",
            &[
                ("vo2_max", 0.35),
                ("resting_heart_rate", 0.25),
                ("recovery_heart_rate", 0.2),
                ("exercise_duration", 0.2),
            ],
        ),
        pattern(
            "training_load_balance",
            "Training Load Balance",
            "Is training volume matched by recovery capacity?",
            &[
                ("exercise_duration", 0.3),
                ("active_energy_burned", 0.25),
                ("heart_rate_variability", 0.25),
                ("sleep_duration", 0.2),
            ],
        ),
        pattern(
            "circadian_alignment",
            "Circadian Alignment",
            "Consistency of the sleep-wake schedule",
            &[
                ("sleep_regularity", 0.4),
                ("sleep_latency", 0.2),
                ("sleep_duration", 0.2),
                ("sleep_efficiency", 0.2),
            ],
        ),
        pattern(
            "daily_activity_summary",
            "Daily Activity Summary",
            "Movement volume across the day",
            &[
                ("steps", 0.3),
                ("activity_duration", 0.25),
                ("active_energy_burned", 0.25),
                ("floors_climbed", 0.2),
            ],
        ),
        pattern(
            "sedentary_risk_alert",
            "Sedentary Risk Alert",
            "Prolonged sitting against movement breaks",
            &[
                ("sedentary_duration", 0.4),
                ("steps", 0.3),
                ("activity_duration", 0.3),
            ],
        ),
        pattern(
            "sleep_debt_recovery",
            "Sleep Debt Recovery",
            "Accumulated sleep debt and repayment progress",
            &[
                ("sleep_debt", 0.4),
                ("sleep_duration", 0.3),
                ("sleep_efficiency", 0.3),
            ],
        ),
        pattern(
            "hrv_trend_watch",
            "HRV Trend Watch",
            "Autonomic balance via heart rate variability",
            &[
                ("heart_rate_variability", 0.6),
                ("resting_heart_rate", 0.2),
                ("stress_level", 0.2),
            ],
        ),
        pattern(
            "resting_heart_trend",
            "Resting Heart Trend",
            "Resting and sleeping heart rate drift",
            &[
                ("resting_heart_rate", 0.5),
                ("heart_rate_sleep", 0.3),
                ("heart_rate_variability", 0.2),
            ],
        ),
        pattern(
            "mental_wellbeing_check",
            "Mental Wellbeing Check",
            "Stress load balanced against restorative behaviors",
            &[
                ("stress_level", 0.4),
                ("sleep_duration", 0.3),
                ("activity_duration", 0.3),
            ],
        ),
        pattern(
            "respiratory_watch",
            "Respiratory Watch",
            "Overnight respiratory rate and sleep stability",
            &[
                ("respiratory_rate", 0.5),
                ("sleep_efficiency", 0.25),
                ("heart_rate_sleep", 0.25),
            ],
        ),
        pattern(
            "overtraining_guard",
            "Overtraining Guard",
            "Early-warning markers for accumulated fatigue",
            &[
                ("heart_rate_variability", 0.3),
                ("resting_heart_rate", 0.25),
                ("sleep_debt", 0.25),
                ("exercise_duration", 0.2),
            ],
        ),
        pattern(
            "active_hours_goal",
            "Active Hours Goal",
            "Hours with meaningful movement versus sitting time",
            &[
                ("active_hours", 0.4),
                ("steps", 0.3),
                ("sedentary_duration", 0.3),
            ],
        ),
        pattern(
            "endurance_base_building",
            "Endurance Base Building",
            "Aerobic base progress for endurance blocks",
            &[
                ("vo2_max", 0.3),
                ("exercise_duration", 0.3),
                ("resting_heart_rate", 0.2),
                ("heart_rate_variability", 0.2),
            ],
        ),
        pattern(
            "evening_wind_down",
            "Evening Wind Down",
            "Readiness to fall asleep at the end of the day",
            &[
                ("stress_level", 0.3),
                ("sleep_latency", 0.3),
                ("heart_rate_sleep", 0.2),
                ("sleep_duration", 0.2),
            ],
        ),
    ]
}

/// In-memory pattern catalog, loaded once at startup and never mutated
pub struct PatternRegistry {
    patterns: HashMap<String, Arc<OptimizationPattern>>,
}

impl PatternRegistry {
    /// Load the static catalog
    pub fn new() -> Self {
        let patterns: HashMap<String, Arc<OptimizationPattern>> = catalog()
            .into_iter()
            .map(|p| (p.id.clone(), Arc::new(p)))
            .collect();
        debug!("Loaded {} optimization patterns", patterns.len());
        Self { patterns }
    }

    /// Look up a pattern by id. Unknown ids return `None`; callers must
    /// check before executing.
    pub fn get_pattern(&self, id: &str) -> Option<Arc<OptimizationPattern>> {
        self.patterns.get(id).cloned()
    }

    /// Catalog listing with per-pattern biomarker counts and category tags,
    /// sorted by id for stable output
    pub fn all_patterns(&self) -> Vec<PatternSummary> {
        let mut summaries: Vec<PatternSummary> = self
            .patterns
            .values()
            .map(|p| PatternSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                biomarker_count: p.biomarkers.len(),
                category: category_for(&p.id).to_string(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Number of patterns in the catalog
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}
