//! @ai:module:intent Named metric outputs and the result rows assembled from them
//! @ai:module:layer domain
//! @ai:module:public_api MetricEntry, MetricOutcome, MetricFailure, ResultRow
//! @ai:module:stateless true

use crate::error::ScoringError;
use crate::value::Scalar;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// @ai:intent Visible failure marker recorded in place of a metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFailure {
    pub kind: String,
    pub message: String,
}

impl From<&ScoringError> for MetricFailure {
    fn from(err: &ScoringError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// @ai:intent Computed value or failure of one metric output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricOutcome {
    Value(Scalar),
    Error(MetricFailure),
}

/// @ai:intent One named metric output within a result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub name: String,
    #[serde(flatten)]
    pub outcome: MetricOutcome,
}

impl MetricEntry {
    /// @ai:intent Successful output
    /// @ai:effects pure
    pub fn value(name: impl Into<String>, value: Scalar) -> Self {
        Self {
            name: name.into(),
            outcome: MetricOutcome::Value(value),
        }
    }

    /// @ai:intent Failed output carrying the error marker
    /// @ai:effects pure
    pub fn failed(name: impl Into<String>, err: &ScoringError) -> Self {
        Self {
            name: name.into(),
            outcome: MetricOutcome::Error(err.into()),
        }
    }

    pub fn scalar(&self) -> Option<&Scalar> {
        match &self.outcome {
            MetricOutcome::Value(value) => Some(value),
            MetricOutcome::Error(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.scalar().and_then(Scalar::as_f64)
    }

    pub fn failure(&self) -> Option<&MetricFailure> {
        match &self.outcome {
            MetricOutcome::Value(_) => None,
            MetricOutcome::Error(failure) => Some(failure),
        }
    }
}

/// @ai:intent Ordered metric outputs for one scorer or one per-key virtual scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Row name: the scorer name, or the key for per-key rows.
    pub name: String,
    /// Scorer that produced the underlying scores.
    pub scorer: String,
    pub scored_samples: usize,
    pub metrics: IndexMap<String, MetricEntry>,
}

impl ResultRow {
    /// @ai:intent Assemble a row from already-named entries
    /// @ai:effects pure
    pub fn new(
        name: impl Into<String>,
        scorer: impl Into<String>,
        scored_samples: usize,
        metrics: IndexMap<String, MetricEntry>,
    ) -> Self {
        Self {
            name: name.into(),
            scorer: scorer.into(),
            scored_samples,
            metrics,
        }
    }

    pub fn metric(&self, name: &str) -> Option<&MetricEntry> {
        self.metrics.get(name)
    }

    /// @ai:intent Numeric value of a named output, if present and successful
    /// @ai:effects pure
    pub fn value(&self, name: &str) -> Option<f64> {
        self.metric(name).and_then(MetricEntry::as_f64)
    }

    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.keys().map(String::as_str).collect()
    }

    /// @ai:intent True when any output of this row carries a failure marker
    /// @ai:effects pure
    pub fn has_failures(&self) -> bool {
        self.metrics.values().any(|entry| entry.failure().is_some())
    }
}
