//! @ai:module:intent Scoring and metrics aggregation engine for model evaluations
//! @ai:module:layer application
//! @ai:module:public_api config, error, metrics, registry, report, scorer, value

pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod scorer;
pub mod value;

pub use config::{RescoreConfig, ScorerConfig};
pub use error::{Result, ScoringError};
pub use metrics::{Metric, MetricEntry, MetricRef, MetricSpec, MetricsAggregator, ResultRow};
pub use registry::{registry, ComponentKind, FromParams, Params, Registry, RegistryInfo};
pub use report::{EvalResults, ReportGenerator, ResultsBuilder, ScoreLog};
pub use scorer::{BindingResolver, Scorer, ScorerMetricsBinding, ScorerSpec, Selector};
pub use value::{SampleId, SampleScore, Scalar, Score, Value};
