//! @ai:module:intent Define error types for scoring and metric aggregation
//! @ai:module:layer domain
//! @ai:module:public_api ScoringError, Result
//! @ai:module:stateless true

use crate::registry::ComponentKind;
use thiserror::Error;

/// @ai:intent Unified error type for registry, binding and metric operations
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("No {kind} registered under name '{name}'")]
    NotFound { kind: ComponentKind, name: String },

    #[error("Inconsistent score shapes for scorer '{scorer}': {detail}")]
    ShapeMismatch { scorer: String, detail: String },

    #[error("Metric '{metric}' cannot convert value {value} to a number")]
    Coercion { metric: String, value: String },

    #[error("Metric '{metric}' requires at least {required} {unit}, found {found}")]
    InsufficientData {
        metric: String,
        required: usize,
        found: usize,
        unit: &'static str,
    },

    #[error("Metric '{metric}' produced a non-finite value for '{output}'")]
    NonFinite { metric: String, output: String },

    #[error("Metric '{metric}' requires sample metadata field '{field}'")]
    MissingMetadata { metric: String, field: String },

    #[error("Invalid parameter for '{component}': {detail}")]
    InvalidParameter { component: String, detail: String },

    #[error("Invalid component name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScoringError {
    /// @ai:intent Stable machine-readable identifier for the error variant
    /// @ai:effects pure
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::NotFound { .. } => "not_found",
            ScoringError::ShapeMismatch { .. } => "shape_mismatch",
            ScoringError::Coercion { .. } => "coercion",
            ScoringError::InsufficientData { .. } => "insufficient_data",
            ScoringError::NonFinite { .. } => "non_finite",
            ScoringError::MissingMetadata { .. } => "missing_metadata",
            ScoringError::InvalidParameter { .. } => "invalid_parameter",
            ScoringError::InvalidName(_) => "invalid_name",
            ScoringError::Io(_) => "io",
            ScoringError::Json(_) => "json",
            ScoringError::Toml(_) => "toml",
        }
    }

    /// @ai:intent Build an insufficient sample count error
    /// @ai:effects pure
    pub fn too_few_samples(metric: &str, required: usize, found: usize) -> Self {
        ScoringError::InsufficientData {
            metric: metric.to_string(),
            required,
            found,
            unit: "samples",
        }
    }

    /// @ai:intent Build an insufficient cluster count error
    /// @ai:effects pure
    pub fn too_few_clusters(metric: &str, required: usize, found: usize) -> Self {
        ScoringError::InsufficientData {
            metric: metric.to_string(),
            required,
            found,
            unit: "clusters",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        let err = ScoringError::too_few_samples("var", 1, 0);
        assert_eq!(err.kind(), "insufficient_data");
        assert_eq!(
            err.to_string(),
            "Metric 'var' requires at least 1 samples, found 0"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ScoringError::NotFound {
            kind: ComponentKind::Metric,
            name: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "No metric registered under name 'missing'");
    }
}
