//! # Sahha GEO Cache
//!
//! Caching-policy engine and pattern optimization layer for Sahha health
//! biomarker data: a type-routed multi-store cache with per-key adaptive TTL
//! and refresh-strategy bookkeeping, plus a catalog of GEO optimization
//! patterns that score curated biomarker subsets into readiness bands.
//!
//! ## Features
//!
//! - **Type-routed cache**: keys are partitioned into biomarker, pattern,
//!   resource, and insight stores by substring classification, each with its
//!   own default TTL and expiry sweep cadence
//! - **Adaptive TTL policy**: expiry computed from key-name heuristics, with
//!   explicit caller overrides winning outright
//! - **Smart refresh signals**: continuous-strategy entries past 80% of their
//!   TTL are flagged for ahead-of-expiry refresh on read
//! - **Pattern catalog**: 20 curated optimization patterns with scoring-weight
//!   tables, clinical-range normalization, and readiness bands
//! - **Degrade, never crash**: the public cache API converts internal errors
//!   to logged safe defaults; missing biomarker data scores neutrally
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sahha_geo_cache::{CacheManager, GeoConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GeoConfig::default();
//!     let cache = CacheManager::new(config.cache);
//!     cache.start_sweepers();
//!     cache.warm_cache().await;
//!
//!     cache.set("biomarker:profile123:sleep", &vec![7.5], None).await;
//!     let cached: Option<Vec<f64>> = cache.get_as("biomarker:profile123:sleep").await;
//!     println!("{:?}", cached);
//! }
//! ```

pub mod caching;
pub mod config;
pub mod engine;
pub mod patterns;
pub mod utils;

// Re-export main types for convenience
pub use caching::{CacheManager, CacheStats, EntryMetadata, OptimizeReport, StoreKind};
pub use config::{CacheSettings, GeoConfig, PatternSettings, StoreSettings};
pub use engine::{BiomarkerSource, GeoEngine};
pub use patterns::{
    Biomarker, OptimizationPattern, PatternExecutor, PatternRegistry, ReadinessBand, ScoredResult,
};
pub use utils::error::{GeoError, Result};

/// Initialize the engine with default logging
pub fn init() -> Result<()> {
    utils::logging::init_logging()
}

/// Initialize the engine with a specific log level
pub fn init_with_level(level: tracing::Level) -> Result<()> {
    utils::logging::init_logging_with_level(level)
}
