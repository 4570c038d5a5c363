//! @ai:module:intent Apply bound metrics to a partition of scores and name their outputs
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator, MetricsAggregatorTrait
//! @ai:module:stateless true

use crate::metrics::result::MetricEntry;
use crate::error::ScoringError;
use crate::metrics::types::MetricSpec;
use crate::value::{SampleScore, Scalar};
use indexmap::{IndexMap, IndexSet};

/// @ai:intent Trait for applying metrics to score partitions
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Run one metric and expand its result into named entries
    fn apply(&self, metric: &MetricSpec, scores: &[SampleScore], base_name: &str)
        -> Vec<MetricEntry>;

    /// @ai:intent Run all metrics bound to one partition, in bound order, with unique output names
    fn apply_all(
        &self,
        metrics: &[MetricSpec],
        scores: &[SampleScore],
    ) -> IndexMap<String, MetricEntry>;
}

/// @ai:intent Applies metrics to scores and expands structured results
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Choose each metric's base output name
    /// @ai:post short name unless another distinct metric in the partition shares it
    /// @ai:effects pure
    fn base_names(metrics: &[MetricSpec]) -> Vec<String> {
        let mut owners: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
        for metric in metrics {
            owners
                .entry(metric.short_name())
                .or_default()
                .insert(metric.name());
        }

        metrics
            .iter()
            .map(|metric| {
                if owners[metric.short_name()].len() > 1 {
                    metric.name().to_string()
                } else {
                    metric.short_name().to_string()
                }
            })
            .collect()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// @ai:intent First free name: the name itself, else name_1, name_2, ...
/// @ai:effects pure
fn unique_name(taken: &IndexMap<String, MetricEntry>, name: &str) -> String {
    if !taken.contains_key(name) {
        return name.to_string();
    }

    let renamed = (1..)
        .map(|n| format!("{}_{}", name, n))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or_else(|| name.to_string());

    tracing::debug!("Metric output '{}' already present, renamed to '{}'", name, renamed);
    renamed
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:intent Invoke the metric once and decompose its value into entries
    /// @ai:post scalar results keep base_name; keyed results become base_name + "_" + key
    /// @ai:post non-finite floats are recorded as failures
    /// @ai:effects pure
    fn apply(
        &self,
        metric: &MetricSpec,
        scores: &[SampleScore],
        base_name: &str,
    ) -> Vec<MetricEntry> {
        match metric.compute(scores) {
            Ok(value) => value
                .decompose()
                .into_iter()
                .map(|(key, scalar)| {
                    let name = match key {
                        Some(key) => format!("{}_{}", base_name, key),
                        None => base_name.to_string(),
                    };
                    match scalar {
                        Scalar::Float(f) if !f.is_finite() => {
                            let err = ScoringError::NonFinite {
                                metric: metric.name().to_string(),
                                output: name.clone(),
                            };
                            tracing::warn!("{}", err);
                            MetricEntry::failed(name, &err)
                        }
                        scalar => MetricEntry::value(name, scalar),
                    }
                })
                .collect(),
            Err(err) => {
                tracing::warn!(
                    "Metric {} failed over {} scores: {}",
                    metric.name(),
                    scores.len(),
                    err
                );
                vec![MetricEntry::failed(base_name, &err)]
            }
        }
    }

    /// @ai:intent Concatenate every bound metric's entries in bound order
    /// @ai:effects pure
    fn apply_all(
        &self,
        metrics: &[MetricSpec],
        scores: &[SampleScore],
    ) -> IndexMap<String, MetricEntry> {
        let mut entries = IndexMap::new();

        for (metric, base_name) in metrics.iter().zip(Self::base_names(metrics)) {
            for mut entry in self.apply(metric, scores, &base_name) {
                let name = unique_name(&entries, &entry.name);
                entry.name = name.clone();
                entries.insert(name, entry);
            }
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::metrics::ResultRow;
    use crate::metrics::standard::Variance;
    use crate::registry::Params;
    use crate::value::{Score, Value};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn spec(name: &str, metric: fn(&[SampleScore]) -> Result<Value>) -> MetricSpec {
        MetricSpec::new(name.to_string(), Params::new(), Arc::new(metric))
    }

    fn scalar_metric(_: &[SampleScore]) -> Result<Value> {
        Ok(Value::from(1))
    }

    fn dict_metric(_: &[SampleScore]) -> Result<Value> {
        Ok(Value::mapping([("one", 1), ("two", 2), ("three", 3)]))
    }

    fn list_metric(_: &[SampleScore]) -> Result<Value> {
        Ok(Value::sequence([1, 2, 3]))
    }

    fn failing_metric(scores: &[SampleScore]) -> Result<Value> {
        Err(ScoringError::too_few_samples("failing", 2, scores.len()))
    }

    fn scores() -> Vec<SampleScore> {
        vec![SampleScore::new(Score::new(1))]
    }

    #[test]
    fn test_scalar_keeps_base_name() {
        let entries = MetricsAggregator::new().apply(&spec("accuracy1", scalar_metric), &scores(), "accuracy1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "accuracy1");
    }

    #[test]
    fn test_mapping_and_sequence_are_qualified() {
        let aggregator = MetricsAggregator::new();

        let names: Vec<_> = aggregator
            .apply(&spec("dict_metric", dict_metric), &scores(), "dict_metric")
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["dict_metric_one", "dict_metric_two", "dict_metric_three"]);

        let names: Vec<_> = aggregator
            .apply(&spec("list_metric", list_metric), &scores(), "list_metric")
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["list_metric_0", "list_metric_1", "list_metric_2"]);
    }

    #[test]
    fn test_failure_is_marked_not_dropped() {
        let metrics = vec![spec("failing", failing_metric), spec("ok", scalar_metric)];
        let entries = MetricsAggregator::new().apply_all(&metrics, &scores());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries["failing"].failure().unwrap().kind, "insufficient_data");
        assert_eq!(entries["ok"].as_f64(), Some(1.0));
    }

    fn overflow_metric(_: &[SampleScore]) -> Result<Value> {
        Ok(Value::mapping([("ok", 1.0), ("nan", f64::NAN)]))
    }

    #[test]
    fn test_non_finite_results_are_failures() {
        let var = MetricSpec::new("evalscore/var".to_string(), Params::new(), Arc::new(Variance::default()));
        let scores = vec![
            SampleScore::new(Score::new(1e308)),
            SampleScore::new(Score::new(-1e308)),
        ];

        let entries = MetricsAggregator::new().apply_all(&[var], &scores);
        assert_eq!(entries["var"].failure().unwrap().kind, "non_finite");

        let row = ResultRow::new("s", "s", 2, entries);
        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains("null"));
        let back: ResultRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_non_finite_component_only_fails_itself() {
        let entries = MetricsAggregator::new()
            .apply(&spec("overflow", overflow_metric), &scores(), "overflow");
        assert_eq!(entries[0].as_f64(), Some(1.0));
        assert_eq!(entries[1].name, "overflow_nan");
        assert_eq!(entries[1].failure().unwrap().kind, "non_finite");
    }

    #[test]
    fn test_shared_short_name_uses_full_names() {
        let metrics = vec![
            spec("evalscore/accuracy", scalar_metric),
            spec("accuracy", scalar_metric),
            spec("evalscore/std", scalar_metric),
        ];
        let entries = MetricsAggregator::new().apply_all(&metrics, &scores());

        let names: Vec<_> = entries.keys().cloned().collect();
        assert_eq!(names, vec!["evalscore/accuracy", "accuracy", "std"]);
    }

    #[test]
    fn test_same_metric_twice_first_keeps_name() {
        let metrics = vec![spec("evalscore/mean", scalar_metric), spec("evalscore/mean", scalar_metric)];
        let entries = MetricsAggregator::new().apply_all(&metrics, &scores());

        let names: Vec<_> = entries.keys().cloned().collect();
        assert_eq!(names, vec!["mean", "mean_1"]);
        assert_eq!(entries["mean_1"].name, "mean_1");
    }
}
