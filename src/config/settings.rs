use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::error::{GeoError, Result};

/// Main configuration for the GEO optimization engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Cache layer configuration
    pub cache: CacheSettings,
    /// Pattern execution configuration
    pub patterns: PatternSettings,
}

/// Cache layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Biomarker store settings
    pub biomarker: StoreSettings,
    /// Pattern store settings
    pub pattern: StoreSettings,
    /// Resource store settings
    pub resource: StoreSettings,
    /// Insight store settings
    pub insight: StoreSettings,
    /// Pre-populate well-known keys at startup
    pub warm_on_start: bool,
    /// Fraction of TTL after which a continuous-strategy entry is flagged
    /// for refresh on read
    pub refresh_threshold: f64,
}

/// Per-store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Default TTL in seconds when no policy rule matches
    pub default_ttl: u64,
    /// Background expiry sweep interval in seconds
    pub sweep_interval: u64,
}

/// Pattern execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSettings {
    /// Neutral score substituted for missing biomarker data (0-100 scale)
    pub neutral_score: f64,
    /// Enable per-pattern performance tracking
    pub track_performance: bool,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            patterns: PatternSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            biomarker: StoreSettings {
                default_ttl: 1800,
                sweep_interval: 300,
            },
            pattern: StoreSettings {
                default_ttl: 3600,
                sweep_interval: 600,
            },
            resource: StoreSettings {
                default_ttl: 900,
                sweep_interval: 900,
            },
            insight: StoreSettings {
                default_ttl: 3600,
                sweep_interval: 600,
            },
            warm_on_start: true,
            refresh_threshold: 0.8,
        }
    }
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            neutral_score: 50.0,
            track_performance: true,
        }
    }
}

impl GeoConfig {
    /// Load configuration from a TOML file, with GEO_* environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("GEO").separator("__"))
            .build()
            .map_err(|e| GeoError::config(format!("Failed to load configuration: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| GeoError::config(format!("Invalid configuration: {}", e)))
    }

    /// Load configuration from environment only, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("GEO").separator("__"))
            .build()
            .map_err(|e| GeoError::config(format!("Failed to load configuration: {}", e)))?;

        match settings.try_deserialize::<GeoConfig>() {
            Ok(cfg) => Ok(cfg),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.cache.refresh_threshold) {
            return Err(GeoError::validation(
                "cache.refresh_threshold must be within [0.0, 1.0]".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.patterns.neutral_score) {
            return Err(GeoError::validation(
                "patterns.neutral_score must be within [0.0, 100.0]".to_string(),
            ));
        }
        for (name, store) in [
            ("biomarker", &self.cache.biomarker),
            ("pattern", &self.cache.pattern),
            ("resource", &self.cache.resource),
            ("insight", &self.cache.insight),
        ] {
            if store.default_ttl == 0 {
                return Err(GeoError::validation(format!(
                    "cache.{}.default_ttl must be greater than zero",
                    name
                )));
            }
            if store.sweep_interval == 0 {
                return Err(GeoError::validation(format!(
                    "cache.{}.sweep_interval must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}
