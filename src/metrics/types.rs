//! @ai:module:intent Metric capability and its registered, parameterized instances
//! @ai:module:layer domain
//! @ai:module:public_api Metric, MetricSpec, MetricRef, ScoreListMetric
//! @ai:module:stateless true

use crate::error::Result;
use crate::registry::{ComponentKind, Params, RegistryInfo};
use crate::value::{SampleScore, Score, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// @ai:intent Pure reducer from per-sample scores to a result value
///
/// Implemented by metric types and, through the blanket impl below, by any
/// `Fn(&[SampleScore]) -> Result<Value>`. Invocations must be deterministic.
pub trait Metric: Send + Sync {
    /// @ai:intent Reduce the scores to one result value
    fn compute(&self, scores: &[SampleScore]) -> Result<Value>;
}

impl<F> Metric for F
where
    F: Fn(&[SampleScore]) -> Result<Value> + Send + Sync,
{
    fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        self(scores)
    }
}

/// @ai:intent Adapter for metrics written against bare scores (no sample context)
pub struct ScoreListMetric<F>(pub F);

impl<F> Metric for ScoreListMetric<F>
where
    F: Fn(&[Score]) -> Result<Value> + Send + Sync,
{
    /// @ai:effects pure
    fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        let bare: Vec<Score> = scores.iter().map(|s| s.score.clone()).collect();
        (self.0)(&bare)
    }
}

/// @ai:intent A metric instantiated from the registry under its canonical name
#[derive(Clone)]
pub struct MetricSpec {
    name: String,
    params: Params,
    metric: Arc<dyn Metric>,
}

impl MetricSpec {
    /// @ai:intent Bind a metric instance to its canonical name and parameters
    /// @ai:effects pure
    pub(crate) fn new(name: String, params: Params, metric: Arc<dyn Metric>) -> Self {
        Self {
            name,
            params,
            metric,
        }
    }

    /// Canonical registry name, including any namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// @ai:intent Registry name without the namespace prefix
    /// @ai:effects pure
    /// @ai:example ("evalscore/accuracy") -> "accuracy"
    pub fn short_name(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map(|(_, short)| short)
            .unwrap_or(&self.name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn info(&self) -> RegistryInfo {
        RegistryInfo {
            kind: ComponentKind::Metric,
            name: self.name.clone(),
        }
    }

    /// @ai:intent Run the metric over the scores
    /// @ai:effects pure
    pub fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        self.metric.compute(scores)
    }

    /// @ai:intent By-name reference that recreates this metric through the registry
    /// @ai:effects pure
    pub fn to_ref(&self) -> MetricRef {
        MetricRef {
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }
}

impl std::fmt::Debug for MetricSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// @ai:intent Serializable by-name reference to a registered metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

impl MetricRef {
    /// @ai:intent Reference a metric with default parameters
    /// @ai:effects pure
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    /// @ai:intent Attach parameters
    /// @ai:effects pure
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}
