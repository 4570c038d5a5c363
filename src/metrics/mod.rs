//! @ai:module:intent Metric capability, application engine and built-in metrics
//! @ai:module:layer application
//! @ai:module:public_api Metric, MetricSpec, MetricRef, MetricsAggregator, MetricEntry, ResultRow, Mean, Accuracy, Variance, StdDev, StdErr

pub mod aggregator;
pub mod result;
pub mod standard;
pub mod stats;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use result::{MetricEntry, MetricFailure, MetricOutcome, ResultRow};
pub use standard::{Accuracy, Coercion, Mean, StdDev, StdErr, Variance};
pub use types::{Metric, MetricRef, MetricSpec, ScoreListMetric};
