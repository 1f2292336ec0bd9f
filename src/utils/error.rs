use thiserror::Error;

/// Result type alias for the GEO optimization engine
pub type Result<T> = std::result::Result<T, GeoError>;

/// Error types for the cache and pattern layer
#[derive(Error, Debug)]
pub enum GeoError {
    /// Cache store errors (serialization, internal map state)
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Pattern registry/execution errors
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Scoring errors (malformed weight tables, bad ranges)
    #[error("Scoring error: {message}")]
    Scoring { message: String },

    /// Upstream biomarker fetch errors
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid input errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system errors
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("GEO error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl GeoError {
    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new pattern error
    pub fn pattern<S: Into<String>>(message: S) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Create a new scoring error
    pub fn scoring<S: Into<String>>(message: S) -> Self {
        Self::Scoring {
            message: message.into(),
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the error came from the upstream fetch collaborator
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
