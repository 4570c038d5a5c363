//! @ai:module:intent Partition a scorer's scores per its binding and build result rows
//! @ai:module:layer application
//! @ai:module:public_api BindingResolver, BindingResolverTrait
//! @ai:module:stateless true

use crate::error::{Result, ScoringError};
use crate::metrics::{MetricSpec, MetricsAggregator, MetricsAggregatorTrait, ResultRow};
use crate::scorer::{ScorerMetricsBinding, Selector};
use crate::value::{SampleScore, ValueShape};
use indexmap::{IndexMap, IndexSet};

/// @ai:intent Trait for resolving scorer bindings into result rows
pub trait BindingResolverTrait: Send + Sync {
    /// @ai:intent Build every result row for one scorer's output
    /// @ai:post keyed bindings always yield the aggregate row first
    fn resolve(
        &self,
        scorer: &str,
        binding: &ScorerMetricsBinding,
        scores: &[SampleScore],
    ) -> Result<Vec<ResultRow>>;
}

/// @ai:intent Resolves flat and keyed bindings using the metrics aggregator
pub struct BindingResolver {
    aggregator: MetricsAggregator,
}

impl BindingResolver {
    /// @ai:intent Create a new binding resolver
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            aggregator: MetricsAggregator::new(),
        }
    }

    fn row(
        &self,
        name: &str,
        scorer: &str,
        metrics: &[MetricSpec],
        scores: &[SampleScore],
    ) -> ResultRow {
        let entries = self.aggregator.apply_all(metrics, scores);
        ResultRow::new(name, scorer, scores.len(), entries)
    }

    /// @ai:intent Keys of every mapping-valued score, in first-observed order
    /// @ai:pre every score must hold a mapping
    /// @ai:effects pure
    fn observed_keys(scorer: &str, scores: &[SampleScore]) -> Result<IndexSet<String>> {
        let mut keys = IndexSet::new();

        for (index, sample) in scores.iter().enumerate() {
            let mapping = sample.score.value.as_mapping().ok_or_else(|| {
                ScoringError::ShapeMismatch {
                    scorer: scorer.to_string(),
                    detail: format!(
                        "{} has a {} value but a keyed binding needs a {}",
                        sample.label(index),
                        sample.score.value.shape(),
                        ValueShape::Mapping
                    ),
                }
            })?;
            keys.extend(mapping.keys().cloned());
        }

        Ok(keys)
    }

    /// @ai:intent Project every score onto a literal key
    /// @ai:post fails when any score lacks the key
    /// @ai:effects pure
    fn project_all(scorer: &str, key: &str, scores: &[SampleScore]) -> Result<Vec<SampleScore>> {
        scores
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                sample.project(key).ok_or_else(|| ScoringError::ShapeMismatch {
                    scorer: scorer.to_string(),
                    detail: format!("{} has no '{}' key", sample.label(index), key),
                })
            })
            .collect()
    }

    fn resolve_keyed(
        &self,
        scorer: &str,
        selectors: &IndexMap<Selector, Vec<MetricSpec>>,
        aggregate: &[MetricSpec],
        scores: &[SampleScore],
    ) -> Result<Vec<ResultRow>> {
        let observed = Self::observed_keys(scorer, scores)?;
        let mut rows = vec![self.row(scorer, scorer, aggregate, scores)];

        let mut wildcard = None;
        let mut covered = IndexSet::new();
        for (selector, metrics) in selectors {
            match selector {
                Selector::Key(key) => {
                    let projected = Self::project_all(scorer, key, scores)?;
                    rows.push(self.row(key, scorer, metrics, &projected));
                    covered.insert(key.as_str());
                }
                Selector::Wildcard => wildcard = Some(metrics),
            }
        }

        if let Some(metrics) = wildcard {
            for key in observed.iter().filter(|key| !covered.contains(key.as_str())) {
                // Wildcard partitions hold only the samples that carry the key.
                let projected: Vec<SampleScore> =
                    scores.iter().filter_map(|sample| sample.project(key)).collect();
                rows.push(self.row(key, scorer, metrics, &projected));
            }
        }

        tracing::debug!(
            "Scorer {}: {} observed keys, {} rows",
            scorer,
            observed.len(),
            rows.len()
        );
        Ok(rows)
    }
}

impl Default for BindingResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingResolverTrait for BindingResolver {
    fn resolve(
        &self,
        scorer: &str,
        binding: &ScorerMetricsBinding,
        scores: &[SampleScore],
    ) -> Result<Vec<ResultRow>> {
        match binding {
            ScorerMetricsBinding::Flat(metrics) => {
                Ok(vec![self.row(scorer, scorer, metrics, scores)])
            }
            ScorerMetricsBinding::Keyed {
                selectors,
                aggregate,
            } => self.resolve_keyed(scorer, selectors, aggregate, scores),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Params, Registry};
    use crate::value::{Score, Value};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn builtin(name: &str) -> MetricSpec {
        Registry::with_builtins()
            .create_metric(name, &Params::new())
            .unwrap()
    }

    fn custom(name: &str, metric: fn(&[SampleScore]) -> Result<Value>) -> MetricSpec {
        MetricSpec::new(name.to_string(), Params::new(), Arc::new(metric))
    }

    fn complex_metric(scores: &[SampleScore]) -> Result<Value> {
        let total: f64 = scores
            .iter()
            .filter_map(|s| s.score.value.as_mapping())
            .flat_map(|m| m.values().filter_map(|v| v.as_f64()))
            .sum();
        Ok(Value::from(total))
    }

    fn nested_dict_metric(_: &[SampleScore]) -> Result<Value> {
        Ok(Value::mapping([("key1", 1.0), ("key2", 2.0)]))
    }

    fn nested_list_metric(_: &[SampleScore]) -> Result<Value> {
        Ok(Value::sequence([1.0, 2.0]))
    }

    fn keyed_scores() -> Vec<SampleScore> {
        vec![SampleScore::new(Score::new(Value::mapping([
            ("one", 1),
            ("two", 2),
            ("three", 3),
        ])))]
    }

    fn names(rows: &[ResultRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_flat_binding_single_row() {
        let binding = ScorerMetricsBinding::flat(vec![builtin("mean")]);
        let scores: Vec<_> = [1, 0, 1, 1]
            .into_iter()
            .map(|v| SampleScore::new(Score::new(v)))
            .collect();

        let rows = BindingResolver::new().resolve("match", &binding, &scores).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "match");
        assert_eq!(rows[0].scored_samples, 4);
        assert_eq!(rows[0].value("mean"), Some(0.75));
    }

    #[test]
    fn test_complex_binding() {
        let binding = ScorerMetricsBinding::keyed([
            ("one", vec![builtin("mean")]),
            ("two", vec![builtin("mean"), builtin("std")]),
            ("three", vec![builtin("mean"), builtin("std")]),
        ])
        .with_aggregate(vec![custom("complex_metric", complex_metric)]);

        let rows = BindingResolver::new()
            .resolve("complex_scorer", &binding, &keyed_scores())
            .unwrap();

        assert_eq!(names(&rows), vec!["complex_scorer", "one", "two", "three"]);
        assert_eq!(rows[0].value("complex_metric"), Some(6.0));
        assert_eq!(rows[2].metric_names(), vec!["mean", "std"]);
        assert_eq!(rows[2].value("mean"), Some(2.0));
    }

    #[test]
    fn test_wildcard_binding() {
        let binding = ScorerMetricsBinding::keyed([("*", vec![builtin("mean")])]);
        let rows = BindingResolver::new()
            .resolve("wildcard_scorer", &binding, &keyed_scores())
            .unwrap();

        assert_eq!(rows.len(), 4);
        assert!(rows[0].metrics.is_empty());
        assert_eq!(rows[1].name, "one");
        assert_eq!(rows[1].value("mean"), Some(1.0));
        assert_eq!(rows[1].scorer, "wildcard_scorer");
    }

    #[test]
    fn test_wildcard_skips_literal_keys() {
        let binding = ScorerMetricsBinding::keyed([
            ("*", vec![builtin("mean")]),
            ("two", vec![builtin("std")]),
        ]);
        let rows = BindingResolver::new()
            .resolve("mixed", &binding, &keyed_scores())
            .unwrap();

        assert_eq!(names(&rows), vec!["mixed", "two", "one", "three"]);
        assert_eq!(rows[1].metric_names(), vec!["std"]);
    }

    #[test]
    fn test_nested_results_under_wildcard() {
        let binding = ScorerMetricsBinding::keyed([("*", vec![custom("nested_dict_metric", nested_dict_metric)])]);
        let rows = BindingResolver::new()
            .resolve("nested_dict_scorer", &binding, &keyed_scores())
            .unwrap();
        assert_eq!(rows[1].metric_names(), vec!["nested_dict_metric_key1", "nested_dict_metric_key2"]);

        let binding = ScorerMetricsBinding::keyed([("*", vec![custom("nested_list_metric", nested_list_metric)])]);
        let rows = BindingResolver::new()
            .resolve("nested_list_scorer", &binding, &keyed_scores())
            .unwrap();
        assert_eq!(rows[1].metric_names(), vec!["nested_list_metric_0", "nested_list_metric_1"]);
    }

    #[test]
    fn test_mixed_shapes_fail_fast() {
        let mut scores = keyed_scores();
        scores.push(SampleScore::new(Score::new(1)));

        let binding = ScorerMetricsBinding::keyed([("*", vec![builtin("mean")])]);
        let err = BindingResolver::new()
            .resolve("mixed", &binding, &scores)
            .unwrap_err();
        assert_eq!(err.kind(), "shape_mismatch");
        assert!(err.to_string().contains("sample #1"));
    }

    #[test]
    fn test_missing_literal_key_is_shape_mismatch() {
        let mut scores = keyed_scores();
        scores.push(SampleScore::new(Score::new(Value::mapping([("one", 1)]))));

        let binding = ScorerMetricsBinding::keyed([("two", vec![builtin("mean")])]);
        let err = BindingResolver::new()
            .resolve("partial", &binding, &scores)
            .unwrap_err();
        assert!(matches!(err, ScoringError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_wildcard_partition_holds_carrying_samples() {
        let mut scores = keyed_scores();
        scores.push(SampleScore::new(Score::new(Value::mapping([("four", 4)]))));

        let binding = ScorerMetricsBinding::keyed([("*", vec![builtin("mean")])]);
        let rows = BindingResolver::new()
            .resolve("sparse", &binding, &scores)
            .unwrap();

        assert_eq!(names(&rows), vec!["sparse", "one", "two", "three", "four"]);
        assert_eq!(rows[0].scored_samples, 2);
        assert_eq!(rows[4].scored_samples, 1);
        assert_eq!(rows[4].value("mean"), Some(4.0));
    }
}
