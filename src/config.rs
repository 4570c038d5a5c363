//! @ai:module:intent Configuration structs for re-scoring logged samples
//! @ai:module:layer infrastructure
//! @ai:module:public_api RescoreConfig, ScorerConfig
//! @ai:module:stateless true

use crate::error::Result;
use crate::metrics::{MetricRef, MetricSpec};
use crate::registry::{Params, Registry};
use crate::scorer::{ScorerMetricsBinding, Selector};
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// @ai:intent Main configuration: the metrics binding of every scorer to re-score
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescoreConfig {
    #[serde(default)]
    pub scorers: Vec<ScorerConfig>,
}

/// @ai:intent By-name binding of one scorer
/// @ai:effects pure
///
/// `metrics` alone is a flat binding. With `keys` present the binding is keyed
/// and `metrics` run on the scorer's aggregate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub name: String,
    #[serde(default)]
    pub metrics: Vec<MetricRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<IndexMap<String, Vec<MetricRef>>>,
}

impl Default for RescoreConfig {
    fn default() -> Self {
        Self {
            scorers: vec![
                ScorerConfig {
                    name: "match".to_string(),
                    metrics: vec![MetricRef::named("accuracy"), MetricRef::named("stderr")],
                    keys: None,
                },
                ScorerConfig {
                    name: "rubric".to_string(),
                    metrics: Vec::new(),
                    keys: Some(IndexMap::from([(
                        "*".to_string(),
                        vec![
                            MetricRef::named("mean"),
                            MetricRef::named("stderr")
                                .with_params(Params::new().with("cluster", "category")),
                        ],
                    )])),
                },
            ],
        }
    }
}

impl RescoreConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Find the binding configured for a scorer
    /// @ai:effects pure
    pub fn scorer(&self, name: &str) -> Option<&ScorerConfig> {
        self.scorers.iter().find(|s| s.name == name)
    }
}

impl ScorerConfig {
    /// @ai:intent Capture an in-process binding in by-name form
    /// @ai:effects pure
    pub fn from_binding(name: impl Into<String>, binding: &ScorerMetricsBinding) -> Self {
        let refs = |metrics: &[MetricSpec]| -> Vec<MetricRef> {
            metrics.iter().map(MetricSpec::to_ref).collect()
        };

        match binding {
            ScorerMetricsBinding::Flat(metrics) => Self {
                name: name.into(),
                metrics: refs(metrics.as_slice()),
                keys: None,
            },
            ScorerMetricsBinding::Keyed {
                selectors,
                aggregate,
            } => Self {
                name: name.into(),
                metrics: refs(aggregate.as_slice()),
                keys: Some(
                    selectors
                        .iter()
                        .map(|(selector, metrics)| (selector.to_string(), refs(metrics.as_slice())))
                        .collect(),
                ),
            },
        }
    }

    /// @ai:intent Instantiate every referenced metric through the registry
    /// @ai:post fails with NotFound for an unregistered metric name
    /// @ai:effects pure
    pub fn build(&self, registry: &Registry) -> Result<ScorerMetricsBinding> {
        let create = |refs: &[MetricRef]| -> Result<Vec<MetricSpec>> {
            refs.iter().map(|r| registry.create_metric_ref(r)).collect()
        };

        let aggregate = create(self.metrics.as_slice())?;
        match &self.keys {
            None => Ok(ScorerMetricsBinding::flat(aggregate)),
            Some(keys) => {
                let selectors = keys
                    .iter()
                    .map(|(selector, refs)| Ok((Selector::parse(selector), create(refs.as_slice())?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ScorerMetricsBinding::keyed(selectors).with_aggregate(aggregate))
            }
        }
    }
}
