//! @ai:module:intent Name-to-factory catalog for metrics and scorers
//! @ai:module:layer application
//! @ai:module:public_api Registry, ComponentKind, Component, RegistryInfo, Params, FromParams, registry
//! @ai:module:stateless false

pub mod params;

pub use params::{FromParams, Params};

use crate::error::{Result, ScoringError};
use crate::metrics::{Metric, MetricRef, MetricSpec};
use crate::scorer::{Scorer, ScorerMetricsBinding, ScorerSpec};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Namespace prefix of the components shipped with this crate.
pub const BUILTIN_NAMESPACE: &str = "evalscore";

/// @ai:intent Capability kind of a registered component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Metric,
    Scorer,
}

impl ComponentKind {
    /// @ai:intent Convert kind to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Metric => "metric",
            ComponentKind::Scorer => "scorer",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Registry identity of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryInfo {
    pub kind: ComponentKind,
    pub name: String,
}

/// @ai:intent Component produced by a by-name lookup
#[derive(Debug, Clone)]
pub enum Component {
    Metric(MetricSpec),
    Scorer(ScorerSpec),
}

impl Component {
    pub fn info(&self) -> RegistryInfo {
        match self {
            Component::Metric(spec) => spec.info(),
            Component::Scorer(spec) => spec.info(),
        }
    }
}

pub type MetricFactory = Arc<dyn Fn(&Params) -> Result<Arc<dyn Metric>> + Send + Sync>;
pub type ScorerFactory = Arc<dyn Fn(&Params) -> Result<Arc<dyn Scorer>> + Send + Sync>;

#[derive(Clone)]
struct ScorerEntry {
    factory: ScorerFactory,
    binding: ScorerMetricsBinding,
}

#[derive(Default)]
struct Catalog {
    metrics: IndexMap<String, MetricFactory>,
    scorers: IndexMap<String, ScorerEntry>,
}

/// @ai:intent Catalog of metric and scorer factories keyed by canonical name
///
/// Populated at startup and read during evaluation; a single-writer,
/// many-reader lock guards the catalog.
pub struct Registry {
    catalog: RwLock<Catalog>,
}

impl Registry {
    /// @ai:intent Create an empty registry
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
        }
    }

    /// @ai:intent Create a registry holding the built-in metrics
    /// @ai:effects pure
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::metrics::standard::register_builtins(&registry);
        registry
    }

    /// @ai:intent Register a metric factory under an explicit name
    /// @ai:pre name is non-empty and outside the built-in namespace
    /// @ai:effects state:write
    pub fn register_metric<F>(&self, name: &str, factory: F) -> Result<RegistryInfo>
    where
        F: Fn(&Params) -> Result<Arc<dyn Metric>> + Send + Sync + 'static,
    {
        validate_user_name(name)?;
        Ok(self.insert_metric(name.to_string(), Arc::new(factory)))
    }

    /// @ai:intent Register a factory function, deriving the name from the function when none is given
    /// @ai:effects state:write
    pub fn register_metric_fn<F>(&self, name: Option<&str>, factory: F) -> Result<RegistryInfo>
    where
        F: Fn(&Params) -> Result<Arc<dyn Metric>> + Send + Sync + 'static,
    {
        let name = match name {
            Some(name) => name.to_string(),
            None => derive_name::<F>()?,
        };
        self.register_metric(&name, factory)
    }

    /// @ai:intent Register a metric type, deriving the name from the type when none is given
    /// @ai:effects state:write
    pub fn register_metric_type<T>(&self, name: Option<&str>) -> Result<RegistryInfo>
    where
        T: Metric + FromParams + 'static,
    {
        let name = match name {
            Some(name) => name.to_string(),
            None => derive_name::<T>()?,
        };
        self.register_metric(&name, |params: &Params| {
            Ok(Arc::new(T::from_params(params)?) as Arc<dyn Metric>)
        })
    }

    /// @ai:intent Register a built-in metric under the reserved namespace
    /// @ai:effects state:write
    pub(crate) fn register_builtin_metric<F>(&self, short_name: &str, factory: F) -> RegistryInfo
    where
        F: Fn(&Params) -> Result<Arc<dyn Metric>> + Send + Sync + 'static,
    {
        self.insert_metric(
            format!("{}/{}", BUILTIN_NAMESPACE, short_name),
            Arc::new(factory),
        )
    }

    /// @ai:intent Register a scorer factory together with its metrics binding
    /// @ai:effects state:write
    pub fn register_scorer<F>(
        &self,
        name: &str,
        binding: ScorerMetricsBinding,
        factory: F,
    ) -> Result<RegistryInfo>
    where
        F: Fn(&Params) -> Result<Arc<dyn Scorer>> + Send + Sync + 'static,
    {
        validate_user_name(name)?;

        let mut catalog = self.catalog.write();
        if catalog.scorers.contains_key(name) {
            tracing::warn!("Replacing previously registered scorer '{}'", name);
        }
        catalog.scorers.insert(
            name.to_string(),
            ScorerEntry {
                factory: Arc::new(factory),
                binding,
            },
        );
        tracing::debug!("Registered scorer '{}'", name);

        Ok(RegistryInfo {
            kind: ComponentKind::Scorer,
            name: name.to_string(),
        })
    }

    /// @ai:intent Register a scorer factory function, deriving the name when none is given
    /// @ai:effects state:write
    pub fn register_scorer_fn<F>(
        &self,
        name: Option<&str>,
        binding: ScorerMetricsBinding,
        factory: F,
    ) -> Result<RegistryInfo>
    where
        F: Fn(&Params) -> Result<Arc<dyn Scorer>> + Send + Sync + 'static,
    {
        let name = match name {
            Some(name) => name.to_string(),
            None => derive_name::<F>()?,
        };
        self.register_scorer(&name, binding, factory)
    }

    /// @ai:intent Instantiate a component of the given kind by name
    /// @ai:effects pure
    pub fn create(&self, kind: ComponentKind, name: &str, params: &Params) -> Result<Component> {
        match kind {
            ComponentKind::Metric => self.create_metric(name, params).map(Component::Metric),
            ComponentKind::Scorer => self.create_scorer(name, params).map(Component::Scorer),
        }
    }

    /// @ai:intent Instantiate a metric by name with keyword configuration
    /// @ai:post the returned metric carries the canonical registry name
    /// @ai:effects pure
    pub fn create_metric(&self, name: &str, params: &Params) -> Result<MetricSpec> {
        let (canonical, factory) = {
            let catalog = self.catalog.read();
            let canonical = resolve_name(&catalog.metrics, name).ok_or_else(|| {
                ScoringError::NotFound {
                    kind: ComponentKind::Metric,
                    name: name.to_string(),
                }
            })?;
            let factory = catalog.metrics[&canonical].clone();
            (canonical, factory)
        };

        let metric = factory(params)?;
        Ok(MetricSpec::new(canonical, params.clone(), metric))
    }

    /// @ai:intent Instantiate a metric from a by-name reference
    /// @ai:effects pure
    pub fn create_metric_ref(&self, metric: &MetricRef) -> Result<MetricSpec> {
        self.create_metric(&metric.name, &metric.params)
    }

    /// @ai:intent Instantiate a scorer by name with keyword configuration
    /// @ai:effects pure
    pub fn create_scorer(&self, name: &str, params: &Params) -> Result<ScorerSpec> {
        let (canonical, entry) = {
            let catalog = self.catalog.read();
            let canonical = resolve_name(&catalog.scorers, name).ok_or_else(|| {
                ScoringError::NotFound {
                    kind: ComponentKind::Scorer,
                    name: name.to_string(),
                }
            })?;
            let entry = catalog.scorers[&canonical].clone();
            (canonical, entry)
        };

        let scorer = (entry.factory)(params)?;
        Ok(ScorerSpec::new(canonical, params.clone(), scorer, entry.binding))
    }

    /// @ai:intent Look up the registry identity of a component by name
    /// @ai:effects pure
    pub fn info(&self, kind: ComponentKind, name: &str) -> Result<RegistryInfo> {
        let catalog = self.catalog.read();
        let canonical = match kind {
            ComponentKind::Metric => resolve_name(&catalog.metrics, name),
            ComponentKind::Scorer => resolve_name(&catalog.scorers, name),
        };

        canonical
            .map(|name| RegistryInfo { kind, name })
            .ok_or_else(|| ScoringError::NotFound {
                kind,
                name: name.to_string(),
            })
    }

    /// @ai:intent List registered components of a kind in registration order
    /// @ai:effects pure
    pub fn list(&self, kind: ComponentKind) -> Vec<RegistryInfo> {
        let catalog = self.catalog.read();
        let names: Vec<String> = match kind {
            ComponentKind::Metric => catalog.metrics.keys().cloned().collect(),
            ComponentKind::Scorer => catalog.scorers.keys().cloned().collect(),
        };

        names
            .into_iter()
            .map(|name| RegistryInfo { kind, name })
            .collect()
    }

    /// @ai:effects state:write
    fn insert_metric(&self, name: String, factory: MetricFactory) -> RegistryInfo {
        let mut catalog = self.catalog.write();
        if catalog.metrics.contains_key(&name) {
            tracing::warn!("Replacing previously registered metric '{}'", name);
        }
        catalog.metrics.insert(name.clone(), factory);
        tracing::debug!("Registered metric '{}'", name);

        RegistryInfo {
            kind: ComponentKind::Metric,
            name,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// @ai:intent Process-wide registry, initialized with the built-in metrics
/// @ai:effects state:read
pub fn registry() -> &'static Registry {
    GLOBAL_REGISTRY.get_or_init(Registry::with_builtins)
}

/// @ai:intent Resolve a lookup name: exact match first, then the built-in namespace
/// @ai:effects pure
fn resolve_name<V>(entries: &IndexMap<String, V>, name: &str) -> Option<String> {
    if entries.contains_key(name) {
        return Some(name.to_string());
    }

    if name.contains('/') {
        return None;
    }

    let namespaced = format!("{}/{}", BUILTIN_NAMESPACE, name);
    entries.contains_key(&namespaced).then_some(namespaced)
}

/// @ai:intent Reject empty names and names inside the reserved namespace
/// @ai:effects pure
fn validate_user_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ScoringError::InvalidName("name must not be empty".to_string()));
    }

    if name
        .split_once('/')
        .map(|(prefix, _)| prefix == BUILTIN_NAMESPACE)
        .unwrap_or(false)
    {
        return Err(ScoringError::InvalidName(format!(
            "'{}' uses the reserved '{}/' namespace",
            name, BUILTIN_NAMESPACE
        )));
    }

    Ok(())
}

/// @ai:intent Derive a canonical name from a function or type identifier
/// @ai:post closures and other anonymous types are rejected
/// @ai:effects pure
/// @ai:example (fn my_crate::metrics::accuracy1) -> "accuracy1"
fn derive_name<T: ?Sized>() -> Result<String> {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    let name = path.rsplit("::").next().unwrap_or(path);

    if name.is_empty() || name.contains('{') {
        return Err(ScoringError::InvalidName(format!(
            "cannot derive a name from '{}', pass an explicit name",
            full
        )));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{SampleScore, Value};

    fn one(_: &[SampleScore]) -> Result<Value> {
        Ok(Value::from(1))
    }

    fn always_one(params: &Params) -> Result<Arc<dyn Metric>> {
        params.ensure_known("always_one", &["correct"])?;
        Ok(Arc::new(one))
    }

    #[test]
    fn test_register_fn_derives_name() {
        let registry = Registry::new();
        let info = registry.register_metric_fn(None, always_one).unwrap();
        assert_eq!(info.name, "always_one");

        let spec = registry.create_metric("always_one", &Params::new()).unwrap();
        assert_eq!(spec.info(), info);
    }

    #[test]
    fn test_closure_requires_explicit_name() {
        let registry = Registry::new();
        let err = registry
            .register_metric_fn(None, |_: &Params| Ok(Arc::new(one) as Arc<dyn Metric>))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_name");
    }

    #[test]
    fn test_create_unknown_is_not_found() {
        let registry = Registry::with_builtins();
        let err = registry.create_metric("nope", &Params::new()).unwrap_err();
        assert!(matches!(err, ScoringError::NotFound { kind: ComponentKind::Metric, .. }));

        let err = registry.create_scorer("mean", &Params::new()).unwrap_err();
        assert!(matches!(err, ScoringError::NotFound { kind: ComponentKind::Scorer, .. }));
    }

    #[test]
    fn test_builtin_namespace_does_not_collide() {
        let registry = Registry::with_builtins();
        registry.register_metric("accuracy", always_one).unwrap();

        let user = registry.create_metric("accuracy", &Params::new()).unwrap();
        assert_eq!(user.name(), "accuracy");

        let builtin = registry
            .create_metric("evalscore/accuracy", &Params::new())
            .unwrap();
        assert_eq!(builtin.name(), "evalscore/accuracy");
    }

    #[test]
    fn test_short_lookup_finds_builtin() {
        let registry = Registry::with_builtins();
        let info = registry.info(ComponentKind::Metric, "stderr").unwrap();
        assert_eq!(info.name, "evalscore/stderr");
    }

    #[test]
    fn test_reserved_namespace_rejected() {
        let registry = Registry::new();
        let err = registry
            .register_metric("evalscore/mine", always_one)
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_name");
    }

    #[test]
    fn test_unknown_parameter_surfaces_on_create() {
        let registry = Registry::new();
        registry.register_metric("always_one", always_one).unwrap();

        let params = Params::new().with("bogus", 1);
        let err = registry.create_metric("always_one", &params).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[test]
    fn test_list_in_registration_order() {
        let registry = Registry::with_builtins();
        let names: Vec<_> = registry
            .list(ComponentKind::Metric)
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "evalscore/mean",
                "evalscore/accuracy",
                "evalscore/var",
                "evalscore/std",
                "evalscore/stderr"
            ]
        );
    }
}
