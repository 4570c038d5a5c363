//! @ai:module:intent Numeric helpers behind the standard metrics
//! @ai:module:layer domain
//! @ai:module:public_api average, sample_variance, standard_error, clustered_standard_error, cluster_count, ClusterLabel
//! @ai:module:stateless true

use indexmap::{IndexMap, IndexSet};
use serde_json::Value as JsonValue;

/// @ai:intent Cluster identity taken from a sample metadata value
///
/// Numbers compare by numeric value (`0` and `0.0` are one cluster); a number
/// and a string never share a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    Str(String),
    /// Bit pattern of the value as f64, with -0.0 folded into 0.0.
    Num(u64),
    Bool(bool),
    /// Arrays and objects, keyed by their JSON text.
    Other(String),
}

impl ClusterLabel {
    /// @ai:intent Label for a metadata value; None for null
    /// @ai:effects pure
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(ClusterLabel::Str(s.clone())),
            JsonValue::Bool(b) => Some(ClusterLabel::Bool(*b)),
            JsonValue::Number(n) => Some(match n.as_f64() {
                Some(x) => ClusterLabel::number(x),
                None => ClusterLabel::Other(n.to_string()),
            }),
            other => Some(ClusterLabel::Other(other.to_string())),
        }
    }

    /// @ai:effects pure
    pub fn number(value: f64) -> Self {
        let normalized = if value == 0.0 { 0.0 } else { value };
        ClusterLabel::Num(normalized.to_bits())
    }
}

/// @ai:intent Calculate average of an iterator of f64
/// @ai:effects pure
pub fn average<I: Iterator<Item = f64>>(iter: I) -> f64 {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// @ai:intent Unbiased sample variance (divisor n - 1)
/// @ai:post None for no values; 0.0 for a single value
/// @ai:effects pure
/// @ai:example ([0..9]) -> 9.1667
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    match values.len() {
        0 => None,
        1 => Some(0.0),
        n => {
            let mean = average(values.iter().copied());
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            Some(squares / (n - 1) as f64)
        }
    }
}

/// @ai:intent Standard error of the mean, sqrt(variance / n)
/// @ai:effects pure
/// @ai:example ([0..9]) -> 0.957
pub fn standard_error(values: &[f64]) -> Option<f64> {
    let variance = sample_variance(values)?;
    Some((variance / values.len() as f64).sqrt())
}

/// @ai:intent Number of distinct cluster labels
/// @ai:effects pure
pub fn cluster_count(clusters: &[ClusterLabel]) -> usize {
    clusters.iter().collect::<IndexSet<_>>().len()
}

/// @ai:intent Cluster-robust standard error of the mean
/// @ai:pre values and clusters have equal length
/// @ai:post None when fewer than two clusters are present
/// @ai:effects pure
///
/// SE = sqrt( C / (C - 1) * sum_c (S_c - n_c * mean)^2 / n^2 ), where S_c is
/// the sum and n_c the size of cluster c.
pub fn clustered_standard_error(values: &[f64], clusters: &[ClusterLabel]) -> Option<f64> {
    let mut totals: IndexMap<&ClusterLabel, (f64, usize)> = IndexMap::new();
    for (value, cluster) in values.iter().zip(clusters) {
        let total = totals.entry(cluster).or_insert((0.0, 0));
        total.0 += value;
        total.1 += 1;
    }

    let c = totals.len();
    if c < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = average(values.iter().copied());
    let deviations: f64 = totals
        .values()
        .map(|(sum, size)| (sum - *size as f64 * mean).powi(2))
        .sum();

    let c = c as f64;
    Some((c / (c - 1.0) * deviations / (n * n)).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    fn round3(x: f64) -> f64 {
        (x * 1000.0).round() / 1000.0
    }

    #[test]
    fn test_average() {
        let values = vec![10.0, 20.0, 30.0];
        assert!((average(values.into_iter()) - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_average_empty() {
        let values: Vec<f64> = vec![];
        assert!((average(values.into_iter()) - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_variance() {
        assert_eq!(round3(sample_variance(&range(10)).unwrap()), 9.167);
        assert_eq!(sample_variance(&[4.0]), Some(0.0));
        assert_eq!(sample_variance(&[]), None);
    }

    #[test]
    fn test_standard_error() {
        assert_eq!(round3(standard_error(&range(10)).unwrap()), 0.957);
    }

    #[test]
    fn test_clustered_standard_error() {
        let values = range(20);
        let clusters: Vec<ClusterLabel> = (0..20).map(|i| ClusterLabel::number((i % 4) as f64)).collect();

        assert_eq!(cluster_count(&clusters), 4);
        assert_eq!(
            round3(clustered_standard_error(&values, &clusters).unwrap()),
            0.645
        );
    }

    #[test]
    fn test_singleton_clusters_match_plain_formula() {
        let values = range(10);
        let clusters: Vec<ClusterLabel> = (0..10).map(|i| ClusterLabel::Str(format!("c{}", i))).collect();

        let clustered = clustered_standard_error(&values, &clusters).unwrap();
        let plain = standard_error(&values).unwrap();
        assert!((clustered - plain).abs() < 1e-9);
    }

    #[test]
    fn test_cluster_labels_compare_by_value() {
        use serde_json::json;

        let label = |v: JsonValue| ClusterLabel::from_json(&v).unwrap();
        assert_eq!(label(json!(0)), label(json!(0.0)));
        assert_eq!(label(json!(0)), label(json!(-0.0)));
        assert_ne!(label(json!(1)), label(json!("1")));
        assert_ne!(label(json!(true)), label(json!("true")));
        assert_eq!(ClusterLabel::from_json(&json!(null)), None);
    }

    #[test]
    fn test_single_cluster_is_undefined() {
        let clusters = vec![ClusterLabel::Str("a".to_string()); 3];
        assert_eq!(clustered_standard_error(&[1.0, 2.0, 3.0], &clusters), None);
    }
}
