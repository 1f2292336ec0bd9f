pub mod settings;

pub use settings::{CacheSettings, GeoConfig, PatternSettings, StoreSettings};
