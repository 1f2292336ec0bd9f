// TTL Policy and Refresh Strategies
// Computes entry expiry and refresh metadata from key-name heuristics

use serde::{Deserialize, Serialize};

/// Default TTL when no rule matches (30 minutes)
pub const DEFAULT_TTL: u64 = 1800;

/// Refresh priority attached to a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Refresh metadata resolved at write time and frozen on the entry.
///
/// `refresh_time` is either a wall-clock hint (e.g. "06:00"), "continuous"
/// for entries that should be refreshed ahead of expiry, or "standard".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshStrategy {
    /// When the entry conceptually should be refreshed
    pub refresh_time: String,
    /// Strategy-level TTL in seconds
    pub ttl: u64,
    /// Refresh priority
    pub priority: Priority,
}

impl RefreshStrategy {
    /// Whether the entry is a candidate for ahead-of-expiry refresh
    pub fn is_continuous(&self) -> bool {
        self.refresh_time == "continuous"
    }
}

impl Default for RefreshStrategy {
    fn default() -> Self {
        Self {
            refresh_time: "standard".to_string(),
            ttl: DEFAULT_TTL,
            priority: Priority::Low,
        }
    }
}

/// Ordered TTL rules: first substring match in the key wins. Use-case rules
/// come before the generic type rules so that e.g. a key containing both
/// "workout_readiness" and "biomarker" gets the use-case TTL.
const TTL_RULES: &[(&str, u64)] = &[
    ("morning_health_check", 14400),
    ("workout_readiness", 3600),
    ("sleep_optimization", 7200),
    ("stress_management", 1800),
    ("pattern", 3600),
    ("resource", 900),
    ("biomarker", 1800),
];

/// Named refresh strategies, matched by key substring in order
const STRATEGY_RULES: &[(&str, &str, u64, Priority)] = &[
    ("morning_health_check", "06:00", 14400, Priority::High),
    ("workout_readiness", "continuous", 3600, Priority::High),
    ("sleep_optimization", "22:00", 7200, Priority::Medium),
    ("stress_management", "continuous", 1800, Priority::High),
];

/// Resolve the effective TTL for a key. An explicit caller override wins
/// outright over the policy table.
pub fn resolve_ttl(key: &str, explicit_override: Option<u64>) -> u64 {
    if let Some(ttl) = explicit_override {
        return ttl;
    }
    for (needle, ttl) in TTL_RULES {
        if key.contains(needle) {
            return *ttl;
        }
    }
    DEFAULT_TTL
}

/// Resolve the refresh strategy for a key. Unmatched keys get the standard
/// low-priority strategy.
pub fn resolve_refresh_strategy(key: &str) -> RefreshStrategy {
    for (needle, refresh_time, ttl, priority) in STRATEGY_RULES {
        if key.contains(needle) {
            return RefreshStrategy {
                refresh_time: (*refresh_time).to_string(),
                ttl: *ttl,
                priority: *priority,
            };
        }
    }
    RefreshStrategy::default()
}
