//! @ai:module:intent Keyword configuration passed to component factories
//! @ai:module:layer domain
//! @ai:module:public_api Params, FromParams
//! @ai:module:stateless true

use crate::error::{Result, ScoringError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// @ai:intent Ordered keyword arguments for a registered factory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(IndexMap<String, JsonValue>);

/// @ai:intent Construct a component from keyword configuration
pub trait FromParams: Sized {
    /// @ai:intent Build the component, rejecting unknown or ill-typed keys
    fn from_params(params: &Params) -> Result<Self>;
}

impl Params {
    /// @ai:intent Create empty parameters (all defaults)
    /// @ai:effects pure
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// @ai:intent Builder-style insert of one parameter
    /// @ai:effects pure
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// @ai:intent Fail when a key outside the allowed set is present
    /// @ai:effects pure
    pub fn ensure_known(&self, component: &str, allowed: &[&str]) -> Result<()> {
        match self.0.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(unknown) => Err(invalid(
                component,
                format!(
                    "unexpected parameter '{}' (accepted: {})",
                    unknown,
                    if allowed.is_empty() {
                        "none".to_string()
                    } else {
                        allowed.join(", ")
                    }
                ),
            )),
            None => Ok(()),
        }
    }

    /// @ai:intent Read an optional string parameter
    /// @ai:effects pure
    pub fn opt_str(&self, component: &str, key: &str) -> Result<Option<String>> {
        match self.0.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            // numeric markers such as correct = 1 are accepted as their text form
            Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(invalid(
                component,
                format!("'{}' must be a string, got {}", key, other),
            )),
        }
    }

    /// @ai:intent Read a string parameter, falling back to a default
    /// @ai:effects pure
    pub fn str_or(&self, component: &str, key: &str, default: &str) -> Result<String> {
        Ok(self
            .opt_str(component, key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// @ai:intent Read an optional string-to-number table
    /// @ai:effects pure
    pub fn opt_number_table(
        &self,
        component: &str,
        key: &str,
    ) -> Result<Option<IndexMap<String, f64>>> {
        let table = match self.0.get(key) {
            None | Some(JsonValue::Null) => return Ok(None),
            Some(JsonValue::Object(table)) => table,
            Some(other) => {
                return Err(invalid(
                    component,
                    format!("'{}' must be a table of numbers, got {}", key, other),
                ))
            }
        };

        table
            .iter()
            .map(|(name, value)| {
                value
                    .as_f64()
                    .map(|number| (name.clone(), number))
                    .ok_or_else(|| {
                        invalid(
                            component,
                            format!("'{}.{}' must be a number, got {}", key, name, value),
                        )
                    })
            })
            .collect::<Result<IndexMap<_, _>>>()
            .map(Some)
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn invalid(component: &str, detail: String) -> ScoringError {
    ScoringError::InvalidParameter {
        component: component.to_string(),
        detail,
    }
}
