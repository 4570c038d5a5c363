//! @ai:module:intent Score value types produced by scorers and consumed by metrics
//! @ai:module:layer domain
//! @ai:module:public_api Scalar, Value, ValueShape, Score, SampleScore, SampleId
//! @ai:module:stateless true

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// @ai:intent Single scalar score value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// @ai:intent Numeric view of the scalar; booleans map to 1/0, strings have none
    /// @ai:effects pure
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Str(_) => None,
        }
    }

    /// @ai:intent String payload, if this is a string scalar
    /// @ai:effects pure
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

/// @ai:intent Shape tag of a score value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Scalar,
    Mapping,
    Sequence,
}

impl ValueShape {
    /// @ai:intent Convert shape to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueShape::Scalar => "scalar",
            ValueShape::Mapping => "mapping",
            ValueShape::Sequence => "sequence",
        }
    }
}

impl std::fmt::Display for ValueShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Score value: a scalar, a keyed mapping of scalars, or a sequence of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Mapping(IndexMap<String, Scalar>),
    Sequence(Vec<Scalar>),
}

impl Value {
    /// @ai:intent Build a mapping value preserving the given key order
    /// @ai:effects pure
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Scalar>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// @ai:intent Build a sequence value
    /// @ai:effects pure
    pub fn sequence<V, I>(items: I) -> Self
    where
        V: Into<Scalar>,
        I: IntoIterator<Item = V>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// @ai:intent Shape tag of this value
    /// @ai:effects pure
    pub fn shape(&self) -> ValueShape {
        match self {
            Value::Scalar(_) => ValueShape::Scalar,
            Value::Mapping(_) => ValueShape::Mapping,
            Value::Sequence(_) => ValueShape::Sequence,
        }
    }

    /// @ai:intent Scalar payload, if this is a scalar value
    /// @ai:effects pure
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// @ai:intent Mapping payload, if this is a mapping value
    /// @ai:effects pure
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Scalar>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

macro_rules! value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(value.into())
                }
            }
        )*
    };
}

value_from_scalar!(bool, i64, i32, f64, &str, String);

/// @ai:intent Evaluation outcome for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, JsonValue>,
}

impl Score {
    /// @ai:intent Create a score carrying only a value
    /// @ai:effects pure
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            answer: None,
            explanation: None,
            metadata: IndexMap::new(),
        }
    }

    /// @ai:intent Attach an explanation
    /// @ai:effects pure
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// @ai:intent Identifier of the sample a score belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleId::Int(i) => write!(f, "{}", i),
            SampleId::Str(s) => write!(f, "{}", s),
        }
    }
}

/// @ai:intent Score plus the identity and metadata of the originating sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleScore {
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_id: Option<SampleId>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub sample_metadata: IndexMap<String, JsonValue>,
}

impl SampleScore {
    /// @ai:intent Wrap a score without sample context
    /// @ai:effects pure
    pub fn new(score: Score) -> Self {
        Self {
            score,
            sample_id: None,
            sample_metadata: IndexMap::new(),
        }
    }

    /// @ai:intent Attach the sample identifier
    /// @ai:effects pure
    pub fn with_id(mut self, id: SampleId) -> Self {
        self.sample_id = Some(id);
        self
    }

    /// @ai:intent Attach one sample metadata field
    /// @ai:effects pure
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.sample_metadata.insert(key.into(), value.into());
        self
    }

    /// @ai:intent Project a mapping-valued score onto one key
    /// @ai:post returns None when the value is not a mapping or lacks the key
    /// @ai:effects pure
    pub fn project(&self, key: &str) -> Option<SampleScore> {
        let scalar = self.score.value.as_mapping()?.get(key)?;

        Some(SampleScore {
            score: Score {
                value: Value::Scalar(scalar.clone()),
                ..self.score.clone()
            },
            sample_id: self.sample_id.clone(),
            sample_metadata: self.sample_metadata.clone(),
        })
    }

    /// @ai:intent Human-readable label used in diagnostics
    /// @ai:effects pure
    pub fn label(&self, index: usize) -> String {
        match &self.sample_id {
            Some(id) => format!("sample {}", id),
            None => format!("sample #{}", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(Scalar::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Scalar::Int(3).as_f64(), Some(3.0));
        assert_eq!(Scalar::from("C").as_f64(), None);
    }

    #[test]
    fn test_value_json_shapes() {
        let scalar: Value = serde_json::from_str("1").unwrap();
        assert_eq!(scalar, Value::Scalar(Scalar::Int(1)));

        let float: Value = serde_json::from_str("0.5").unwrap();
        assert_eq!(float, Value::Scalar(Scalar::Float(0.5)));

        let mapping: Value = serde_json::from_str(r#"{"b": 2, "a": "x"}"#).unwrap();
        let keys: Vec<_> = mapping.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);

        let sequence: Value = serde_json::from_str("[true, 2]").unwrap();
        assert_eq!(sequence.shape(), ValueShape::Sequence);
    }

    #[test]
    fn test_project_keeps_sample_context() {
        let sample = SampleScore::new(Score::new(Value::mapping([("one", 1), ("two", 2)])))
            .with_id(SampleId::Int(7))
            .with_metadata("group", 3);

        let projected = sample.project("two").unwrap();
        assert_eq!(projected.score.value, Value::from(2));
        assert_eq!(projected.sample_id, Some(SampleId::Int(7)));
        assert_eq!(projected.sample_metadata["group"], serde_json::json!(3));

        assert!(sample.project("three").is_none());
        assert!(SampleScore::new(Score::new(1)).project("one").is_none());
    }
}
