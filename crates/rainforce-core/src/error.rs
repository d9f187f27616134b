//! Error types for Rainforce

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RainforceError {
    // Geometry / input errors
    #[error("Insufficient input for {stage}: {reason}")]
    InsufficientInput { stage: String, reason: String },

    #[error("Catchment {catchment} does not intersect any influence area")]
    NoCoverage { catchment: String },

    #[error(
        "Insufficient coverage for scenario {scenario}: {available:.3} of catchment covered, \
         {required:.3} required (excluded sites: {})",
        .excluded.join(", ")
    )]
    InsufficientCoverage {
        scenario: String,
        available: f64,
        required: f64,
        excluded: Vec<String>,
    },

    #[error("Invalid geometry at {location}: {reason}")]
    InvalidGeometry { location: String, reason: String },

    #[error("CRS mismatch: input has {input_crs}, pipeline expects {working_crs}")]
    CrsMismatch {
        input_crs: String,
        working_crs: String,
    },

    // Statistics errors
    #[error("Unit conversion failed for site {site_id}: cannot convert '{unit}' to {expected}")]
    UnitConversion {
        site_id: String,
        unit: String,
        expected: String,
    },

    #[error("Duration {duration_mins} min out of range for site {site_id}: {reason}")]
    DurationOutOfRange {
        site_id: String,
        duration_mins: f64,
        reason: String,
    },

    #[error("Upstream unavailable for site {site_id} (scenario {scenario}): {reason}")]
    UpstreamUnavailable {
        site_id: String,
        scenario: String,
        reason: String,
    },

    // Synthesis errors
    #[error("Unsupported {kind} method '{name}'. Expected one of: {expected}")]
    UnsupportedMethod {
        kind: String,
        name: String,
        expected: String,
    },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    // Output errors
    #[error("Failed to write artifact at {path}: {reason}")]
    ArtifactWrite { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RainforceError {
    /// Whether the pipeline may continue by excluding the affected site
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RainforceError::UpstreamUnavailable { .. })
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RainforceError::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    pub fn insufficient_input(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        RainforceError::InsufficientInput { stage: stage.into(), reason: reason.into() }
    }
}

impl From<serde_json::Error> for RainforceError {
    fn from(e: serde_json::Error) -> Self {
        RainforceError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RainforceError>;
