//! @ai:module:intent Assemble result rows of every scorer into one results document
//! @ai:module:layer application
//! @ai:module:public_api EvalResults, ScorerFailure, ScoreLog, ResultsBuilder

use crate::config::RescoreConfig;
use crate::error::ScoringError;
use crate::metrics::ResultRow;
use crate::registry::{ComponentKind, Registry};
use crate::scorer::{BindingResolver, BindingResolverTrait, ScorerMetricsBinding, ScorerSpec};
use crate::value::SampleScore;
use serde::{Deserialize, Serialize};

/// @ai:intent Logged scores of one scorer, the input to re-scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLog {
    pub scorer: String,
    pub samples: Vec<SampleScore>,
}

/// @ai:intent A scorer whose binding could not be resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerFailure {
    pub scorer: String,
    pub kind: String,
    pub message: String,
}

impl ScorerFailure {
    fn new(scorer: &str, err: &ScoringError) -> Self {
        Self {
            scorer: scorer.to_string(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// @ai:intent Complete results document of one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResults {
    pub timestamp: String,
    pub rows: Vec<ResultRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ScorerFailure>,
}

impl EvalResults {
    /// @ai:intent First row with the given name
    /// @ai:effects pure
    pub fn row(&self, name: &str) -> Option<&ResultRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// @ai:intent All rows produced from one scorer's scores
    /// @ai:effects pure
    pub fn rows_for<'a>(&'a self, scorer: &'a str) -> impl Iterator<Item = &'a ResultRow> + 'a {
        self.rows.iter().filter(move |r| r.scorer == scorer)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.rows.iter().any(ResultRow::has_failures)
    }
}

/// @ai:intent Collects rows scorer by scorer; one scorer's failure never aborts its siblings
pub struct ResultsBuilder {
    resolver: BindingResolver,
    rows: Vec<ResultRow>,
    failures: Vec<ScorerFailure>,
}

impl ResultsBuilder {
    /// @ai:intent Create an empty builder
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            resolver: BindingResolver::new(),
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// @ai:intent Resolve one scorer's binding and keep its rows or its failure
    /// @ai:effects state:write
    pub fn add(
        &mut self,
        scorer: &str,
        binding: &ScorerMetricsBinding,
        scores: &[SampleScore],
    ) -> &mut Self {
        match self.resolver.resolve(scorer, binding, scores) {
            Ok(rows) => {
                tracing::info!("Scorer {}: {} samples, {} rows", scorer, scores.len(), rows.len());
                self.rows.extend(rows);
            }
            Err(err) => self.fail(scorer, &err),
        }
        self
    }

    /// @ai:intent Resolve an instantiated scorer against its scores
    /// @ai:effects state:write
    pub fn add_spec(&mut self, scorer: &ScorerSpec, scores: &[SampleScore]) -> &mut Self {
        self.add(scorer.name(), scorer.binding(), scores)
    }

    /// @ai:intent Re-score logged samples using by-name bindings from configuration
    /// @ai:post a log without a configured scorer, or with an unknown metric, becomes a failure
    /// @ai:effects state:write
    pub fn add_logs(
        &mut self,
        config: &RescoreConfig,
        registry: &Registry,
        logs: &[ScoreLog],
    ) -> &mut Self {
        for log in logs {
            let binding = config
                .scorer(&log.scorer)
                .ok_or_else(|| ScoringError::NotFound {
                    kind: ComponentKind::Scorer,
                    name: log.scorer.clone(),
                })
                .and_then(|scorer| scorer.build(registry));

            match binding {
                Ok(binding) => {
                    self.add(&log.scorer, &binding, &log.samples);
                }
                Err(err) => self.fail(&log.scorer, &err),
            }
        }
        self
    }

    fn fail(&mut self, scorer: &str, err: &ScoringError) {
        tracing::warn!("Scorer {} skipped: {}", scorer, err);
        self.failures.push(ScorerFailure::new(scorer, err));
    }

    /// @ai:intent Stamp and return the finished results
    /// @ai:effects time:read
    pub fn build(self) -> EvalResults {
        EvalResults {
            timestamp: chrono::Utc::now().to_rfc3339(),
            rows: self.rows,
            failures: self.failures,
        }
    }
}

impl Default for ResultsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
