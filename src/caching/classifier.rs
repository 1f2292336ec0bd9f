// Key Classification
// Routes cache keys to one of the four semantic stores by substring matching

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four semantic store partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Raw biomarker data and health scores
    Biomarker,
    /// GEO pattern results
    Pattern,
    /// Documentation and resource blobs
    Resource,
    /// Insights and recommendations
    Insight,
}

impl StoreKind {
    /// All store kinds, in routing order
    pub const ALL: [StoreKind; 4] = [
        StoreKind::Biomarker,
        StoreKind::Pattern,
        StoreKind::Resource,
        StoreKind::Insight,
    ];

    /// Store name as used in stats output
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Biomarker => "biomarker",
            StoreKind::Pattern => "pattern",
            StoreKind::Resource => "resource",
            StoreKind::Insight => "insight",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered routing table: first matching substring wins. A key containing
/// multiple trigger words resolves to whichever route is listed first, which
/// callers rely on for compatibility.
const ROUTES: &[(&[&str], StoreKind)] = &[
    (&["biomarker", "health_score"], StoreKind::Biomarker),
    (&["pattern", "geo"], StoreKind::Pattern),
    (&["resource", "documentation"], StoreKind::Resource),
    (&["insight", "recommendation"], StoreKind::Insight),
];

/// Classify a cache key into its store partition.
///
/// Total and deterministic: every key maps to exactly one store for the
/// lifetime of the process. Unrecognized keys fall back to the biomarker
/// store (matching the original behavior; see tests).
pub fn classify(key: &str) -> StoreKind {
    for (needles, kind) in ROUTES {
        if needles.iter().any(|needle| key.contains(needle)) {
            return *kind;
        }
    }
    StoreKind::Biomarker
}
