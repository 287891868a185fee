//! Error types for loading and validating the region model.

use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or reading the region model.
///
/// All of these are load-time faults: they fire before the simulation
/// driver starts and are never produced mid-run.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(
        "data alignment fault: window [{start}, {end}) exceeds available series length {available}"
    )]
    DataAlignment {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid latency {value} from region {from} to region {to}")]
    InvalidLatency { from: usize, to: usize, value: f64 },

    #[error("invalid series for region {region}: {reason}")]
    InvalidSeries { region: String, reason: String },

    #[error("region {0} has no per-destination demand breakdown")]
    MissingBreakdown(String),

    #[error("duplicate region name: {0}")]
    DuplicateRegion(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
