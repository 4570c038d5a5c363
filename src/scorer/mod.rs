//! @ai:module:intent Scorer capability and the metrics bound to its output
//! @ai:module:layer application
//! @ai:module:public_api Scorer, ScorerSpec, ScorerMetricsBinding, Selector, BindingResolver

pub mod resolver;

pub use resolver::{BindingResolver, BindingResolverTrait};

use crate::error::Result;
use crate::metrics::{MetricSpec, ResultRow};
use crate::registry::{ComponentKind, Params, RegistryInfo};
use crate::value::{SampleScore, Score};
use indexmap::IndexMap;
use std::sync::Arc;

/// @ai:intent Per-sample evaluator producing a score from a model output and its targets
pub trait Scorer: Send + Sync {
    /// @ai:intent Score one model output
    fn score(&self, output: &str, target: &[String]) -> Result<Score>;
}

impl<F> Scorer for F
where
    F: Fn(&str, &[String]) -> Result<Score> + Send + Sync,
{
    fn score(&self, output: &str, target: &[String]) -> Result<Score> {
        self(output, target)
    }
}

/// @ai:intent Key selector within a keyed binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Key(String),
    Wildcard,
}

impl Selector {
    /// @ai:intent Parse a selector; "*" is the wildcard
    /// @ai:effects pure
    pub fn parse(text: &str) -> Self {
        if text == "*" {
            Selector::Wildcard
        } else {
            Selector::Key(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selector::Key(key) => key,
            Selector::Wildcard => "*",
        }
    }
}

impl From<&str> for Selector {
    fn from(text: &str) -> Self {
        Selector::parse(text)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Declared association between a scorer's output and the metrics to run
#[derive(Debug, Clone)]
pub enum ScorerMetricsBinding {
    /// Metrics applied to the whole, undecomposed score list.
    Flat(Vec<MetricSpec>),
    /// Per-key metrics for mapping-valued scores; `aggregate` metrics still
    /// run over the undecomposed scores in the scorer's own row.
    Keyed {
        selectors: IndexMap<Selector, Vec<MetricSpec>>,
        aggregate: Vec<MetricSpec>,
    },
}

impl ScorerMetricsBinding {
    /// @ai:intent Flat binding over the whole score list
    /// @ai:effects pure
    pub fn flat(metrics: Vec<MetricSpec>) -> Self {
        ScorerMetricsBinding::Flat(metrics)
    }

    /// @ai:intent Keyed binding from selector / metric-list pairs, in the given order
    /// @ai:effects pure
    pub fn keyed<S, I>(selectors: I) -> Self
    where
        S: Into<Selector>,
        I: IntoIterator<Item = (S, Vec<MetricSpec>)>,
    {
        ScorerMetricsBinding::Keyed {
            selectors: selectors
                .into_iter()
                .map(|(selector, metrics)| (selector.into(), metrics))
                .collect(),
            aggregate: Vec::new(),
        }
    }

    /// @ai:intent Add metrics for the aggregate row
    /// @ai:effects pure
    pub fn with_aggregate(self, metrics: Vec<MetricSpec>) -> Self {
        match self {
            ScorerMetricsBinding::Flat(mut flat) => {
                flat.extend(metrics);
                ScorerMetricsBinding::Flat(flat)
            }
            ScorerMetricsBinding::Keyed {
                selectors,
                mut aggregate,
            } => {
                aggregate.extend(metrics);
                ScorerMetricsBinding::Keyed {
                    selectors,
                    aggregate,
                }
            }
        }
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, ScorerMetricsBinding::Keyed { .. })
    }
}

impl Default for ScorerMetricsBinding {
    fn default() -> Self {
        ScorerMetricsBinding::Flat(Vec::new())
    }
}

/// @ai:intent A scorer instantiated from the registry together with its binding
#[derive(Clone)]
pub struct ScorerSpec {
    name: String,
    params: Params,
    scorer: Arc<dyn Scorer>,
    binding: ScorerMetricsBinding,
}

impl ScorerSpec {
    pub(crate) fn new(
        name: String,
        params: Params,
        scorer: Arc<dyn Scorer>,
        binding: ScorerMetricsBinding,
    ) -> Self {
        Self {
            name,
            params,
            scorer,
            binding,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn binding(&self) -> &ScorerMetricsBinding {
        &self.binding
    }

    pub fn info(&self) -> RegistryInfo {
        RegistryInfo {
            kind: ComponentKind::Scorer,
            name: self.name.clone(),
        }
    }

    /// @ai:intent Score one model output
    /// @ai:effects pure
    pub fn score(&self, output: &str, target: &[String]) -> Result<Score> {
        self.scorer.score(output, target)
    }

    /// @ai:intent Resolve this scorer's binding against the scores it produced
    /// @ai:effects pure
    pub fn results(&self, scores: &[SampleScore]) -> Result<Vec<ResultRow>> {
        BindingResolver::new().resolve(&self.name, &self.binding, scores)
    }
}

impl std::fmt::Debug for ScorerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(Selector::parse("*"), Selector::Wildcard);
        assert_eq!(Selector::parse("one"), Selector::Key("one".to_string()));
        assert_eq!(Selector::Wildcard.to_string(), "*");
    }

    #[test]
    fn test_keyed_keeps_selector_order() {
        let binding = ScorerMetricsBinding::keyed([("two", vec![]), ("*", vec![]), ("one", vec![])]);
        match binding {
            ScorerMetricsBinding::Keyed { selectors, aggregate } => {
                let order: Vec<_> = selectors.keys().map(Selector::as_str).collect();
                assert_eq!(order, vec!["two", "*", "one"]);
                assert!(aggregate.is_empty());
            }
            ScorerMetricsBinding::Flat(_) => panic!("expected keyed binding"),
        }
    }

    #[test]
    fn test_default_binding_is_empty_flat() {
        let binding = ScorerMetricsBinding::default();
        assert!(!binding.is_keyed());
    }
}
