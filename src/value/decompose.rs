//! @ai:module:intent Decompose score values into keyed scalar components
//! @ai:module:layer domain
//! @ai:module:public_api decompose, Component
//! @ai:module:stateless true

use crate::value::score::{Scalar, Value};

/// One scalar component of a value. The key is `None` only for a bare scalar.
pub type Component = (Option<String>, Scalar);

/// @ai:intent Split a value into ordered (key, scalar) components
/// @ai:post scalar -> one unkeyed entry; mapping -> insertion order; sequence -> zero-based index keys
/// @ai:effects pure
/// @ai:example (Value::Sequence([a, b])) -> [(Some("0"), a), (Some("1"), b)]
pub fn decompose(value: &Value) -> Vec<Component> {
    match value {
        Value::Scalar(scalar) => vec![(None, scalar.clone())],
        Value::Mapping(map) => map
            .iter()
            .map(|(key, scalar)| (Some(key.clone()), scalar.clone()))
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, scalar)| (Some(index.to_string()), scalar.clone()))
            .collect(),
    }
}

impl Value {
    /// @ai:intent Split this value into ordered (key, scalar) components
    /// @ai:effects pure
    pub fn decompose(&self) -> Vec<Component> {
        decompose(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decompose_scalar() {
        assert_eq!(decompose(&Value::from(4)), vec![(None, Scalar::Int(4))]);
    }

    #[test]
    fn test_decompose_mapping_keeps_order() {
        let value = Value::mapping([("one", 1), ("two", 2), ("three", 3)]);
        let keys: Vec<_> = decompose(&value).into_iter().map(|(k, _)| k).collect();

        assert_eq!(
            keys,
            vec![
                Some("one".to_string()),
                Some("two".to_string()),
                Some("three".to_string())
            ]
        );
    }

    #[test]
    fn test_decompose_sequence_indexes() {
        let value = Value::sequence([1.0, 2.0]);

        assert_eq!(
            decompose(&value),
            vec![
                (Some("0".to_string()), Scalar::Float(1.0)),
                (Some("1".to_string()), Scalar::Float(2.0)),
            ]
        );
    }

    #[test]
    fn test_decompose_empty_containers() {
        assert!(decompose(&Value::Sequence(vec![])).is_empty());
        assert!(decompose(&Value::mapping(Vec::<(String, i64)>::new())).is_empty());
    }
}
