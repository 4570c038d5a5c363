//! @ai:module:intent Built-in metrics: mean, accuracy, variance, standard deviation, standard error
//! @ai:module:layer domain
//! @ai:module:public_api Mean, Accuracy, Variance, StdDev, StdErr, register_builtins
//! @ai:module:stateless true

use crate::error::{Result, ScoringError};
use crate::metrics::stats::{self, ClusterLabel};
use crate::metrics::types::Metric;
use crate::registry::{FromParams, Params, Registry};
use crate::value::{SampleScore, Scalar, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// @ai:intent Register every built-in metric under the reserved namespace
/// @ai:effects state:write
pub fn register_builtins(registry: &Registry) {
    registry.register_builtin_metric("mean", build::<Mean>);
    registry.register_builtin_metric("accuracy", build::<Accuracy>);
    registry.register_builtin_metric("var", build::<Variance>);
    registry.register_builtin_metric("std", build::<StdDev>);
    registry.register_builtin_metric("stderr", build::<StdErr>);
}

fn build<T: Metric + FromParams + 'static>(params: &Params) -> Result<Arc<dyn Metric>> {
    Ok(Arc::new(T::from_params(params)?))
}

/// @ai:intent Optional string-to-number table applied before numeric reduction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coercion {
    table: Option<IndexMap<String, f64>>,
}

impl Coercion {
    /// @ai:intent Coercion using the given table for string values
    /// @ai:effects pure
    pub fn with_table(table: IndexMap<String, f64>) -> Self {
        Self { table: Some(table) }
    }

    fn from_config(component: &str, params: &Params) -> Result<Self> {
        Ok(Self {
            table: params.opt_number_table(component, "coerce")?,
        })
    }

    /// @ai:intent Convert one score value to a number
    /// @ai:post numbers pass through, booleans map to 1/0, strings need a table entry
    /// @ai:effects pure
    fn to_f64(&self, metric: &str, value: &Value) -> Result<f64> {
        let coerced = match value {
            Value::Scalar(Scalar::Str(s)) => self.table.as_ref().and_then(|t| t.get(s).copied()),
            Value::Scalar(scalar) => scalar.as_f64(),
            Value::Mapping(_) | Value::Sequence(_) => None,
        };

        coerced.ok_or_else(|| ScoringError::Coercion {
            metric: metric.to_string(),
            value: serde_json::to_string(value).unwrap_or_default(),
        })
    }

    /// @ai:intent Convert every sample's value, failing on the first non-numeric one
    /// @ai:effects pure
    fn values(&self, metric: &str, scores: &[SampleScore]) -> Result<Vec<f64>> {
        scores
            .iter()
            .map(|s| self.to_f64(metric, &s.score.value))
            .collect()
    }
}

/// @ai:intent Arithmetic mean of the sample values
#[derive(Debug, Clone, Default)]
pub struct Mean {
    pub coercion: Coercion,
}

impl FromParams for Mean {
    fn from_params(params: &Params) -> Result<Self> {
        params.ensure_known("mean", &["coerce"])?;
        Ok(Self {
            coercion: Coercion::from_config("mean", params)?,
        })
    }
}

impl Metric for Mean {
    /// @ai:effects pure
    fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        let values = self.coercion.values("mean", scores)?;
        if values.is_empty() {
            return Err(ScoringError::too_few_samples("mean", 1, 0));
        }

        Ok(Value::from(stats::average(values.into_iter())))
    }
}

/// @ai:intent Fraction of samples whose value counts as correct
///
/// Strings are correct when equal to the marker, booleans when true. Numbers
/// are compared with the marker when it is numeric and with 1 otherwise.
#[derive(Debug, Clone)]
pub struct Accuracy {
    pub correct: String,
}

impl Default for Accuracy {
    fn default() -> Self {
        Self {
            correct: "C".to_string(),
        }
    }
}

impl Accuracy {
    /// @ai:intent Map one scalar to correct / incorrect
    /// @ai:effects pure
    fn is_correct(&self, scalar: &Scalar) -> bool {
        match scalar {
            Scalar::Str(s) => *s == self.correct,
            Scalar::Bool(b) => *b,
            Scalar::Int(_) | Scalar::Float(_) => {
                let target = self
                    .correct
                    .parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .unwrap_or(1.0);
                scalar.as_f64() == Some(target)
            }
        }
    }
}

impl FromParams for Accuracy {
    fn from_params(params: &Params) -> Result<Self> {
        params.ensure_known("accuracy", &["correct"])?;
        Ok(Self {
            correct: params.str_or("accuracy", "correct", "C")?,
        })
    }
}

impl Metric for Accuracy {
    /// @ai:effects pure
    fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        if scores.is_empty() {
            return Err(ScoringError::too_few_samples("accuracy", 1, 0));
        }

        let hits = scores
            .iter()
            .map(|s| match &s.score.value {
                Value::Scalar(scalar) => Ok(if self.is_correct(scalar) { 1.0 } else { 0.0 }),
                other => Err(ScoringError::Coercion {
                    metric: "accuracy".to_string(),
                    value: serde_json::to_string(other).unwrap_or_default(),
                }),
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Value::from(stats::average(hits.into_iter())))
    }
}

/// @ai:intent Unbiased sample variance; a single value has variance 0
#[derive(Debug, Clone, Default)]
pub struct Variance {
    pub coercion: Coercion,
}

impl FromParams for Variance {
    fn from_params(params: &Params) -> Result<Self> {
        params.ensure_known("var", &["coerce"])?;
        Ok(Self {
            coercion: Coercion::from_config("var", params)?,
        })
    }
}

impl Metric for Variance {
    fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        let values = self.coercion.values("var", scores)?;
        stats::sample_variance(&values)
            .map(Value::from)
            .ok_or_else(|| ScoringError::too_few_samples("var", 1, 0))
    }
}

/// @ai:intent Sample standard deviation
#[derive(Debug, Clone, Default)]
pub struct StdDev {
    pub coercion: Coercion,
}

impl FromParams for StdDev {
    fn from_params(params: &Params) -> Result<Self> {
        params.ensure_known("std", &["coerce"])?;
        Ok(Self {
            coercion: Coercion::from_config("std", params)?,
        })
    }
}

impl Metric for StdDev {
    fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        let values = self.coercion.values("std", scores)?;
        stats::sample_variance(&values)
            .map(|variance| Value::from(variance.sqrt()))
            .ok_or_else(|| ScoringError::too_few_samples("std", 1, 0))
    }
}

/// @ai:intent Standard error of the mean, optionally cluster-robust on a sample metadata field
#[derive(Debug, Clone, Default)]
pub struct StdErr {
    pub coercion: Coercion,
    pub cluster: Option<String>,
}

impl StdErr {
    /// @ai:intent Cluster label of each sample, read from its metadata
    /// @ai:effects pure
    fn cluster_labels(field: &str, scores: &[SampleScore]) -> Result<Vec<ClusterLabel>> {
        scores
            .iter()
            .map(|s| {
                s.sample_metadata
                    .get(field)
                    .and_then(ClusterLabel::from_json)
                    .ok_or_else(|| ScoringError::MissingMetadata {
                        metric: "stderr".to_string(),
                        field: field.to_string(),
                    })
            })
            .collect()
    }
}

impl FromParams for StdErr {
    fn from_params(params: &Params) -> Result<Self> {
        params.ensure_known("stderr", &["coerce", "cluster"])?;
        Ok(Self {
            coercion: Coercion::from_config("stderr", params)?,
            cluster: params.opt_str("stderr", "cluster")?,
        })
    }
}

impl Metric for StdErr {
    /// @ai:effects pure
    fn compute(&self, scores: &[SampleScore]) -> Result<Value> {
        let values = self.coercion.values("stderr", scores)?;

        let Some(field) = &self.cluster else {
            return stats::standard_error(&values)
                .map(Value::from)
                .ok_or_else(|| ScoringError::too_few_samples("stderr", 1, 0));
        };

        let labels = Self::cluster_labels(field, scores)?;
        let clusters = stats::cluster_count(&labels);
        if clusters < 2 {
            return Err(ScoringError::too_few_clusters("stderr", 2, clusters));
        }

        stats::clustered_standard_error(&values, &labels)
            .map(Value::from)
            .ok_or_else(|| ScoringError::too_few_clusters("stderr", 2, clusters))
    }
}
