//! Dynamic filter predicates
//!
//! A filter is a named predicate that can override a statically granted
//! permission with a context-sensitive decision. Filters expose two
//! optional capabilities, sync `can` and async `can_async`; a capability
//! the implementation leaves out defaults the check to satisfied.
//!
//! Filters are looked up through a [`FilterRegistry`] handed to the
//! evaluator at construction. There is no ambient container; the
//! application assembles a registry (usually [`StaticFilterRegistry`])
//! and passes it in explicitly.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Request-scoped filter parameters, keyed by filter name
///
/// Built by the dispatch layer per authorization attempt and discarded
/// with it. A filter receives its own entry only; `None` when the
/// carrier has nothing under its name.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    params: HashMap<String, Vec<Value>>,
}

impl FilterParams {
    /// Create an empty carrier
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a parameter list for a filter, replacing any previous one
    pub fn with_param(
        mut self,
        filter: impl Into<String>,
        params: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.params
            .insert(filter.into(), params.into_iter().collect());
        self
    }

    /// Parameter list for a filter, if one was attached
    pub fn param(&self, filter: &str) -> Option<&[Value]> {
        self.params.get(filter).map(|p| p.as_slice())
    }
}

/// Dynamic filter capability contract
///
/// Both methods default to `true`: a filter that implements neither
/// capability never blocks, and the async path does not fall back to
/// the sync one (each capability stands alone).
#[async_trait]
pub trait Filter: Send + Sync {
    /// Synchronous check
    fn can(&self, _params: Option<&[Value]>) -> bool {
        true
    }

    /// Asynchronous check
    async fn can_async(&self, _params: Option<&[Value]>) -> bool {
        true
    }
}

/// Filter lookup used by the evaluator
///
/// `names` must enumerate in a stable order; the evaluator's
/// unqualified-token scan walks it front to back and stops at the
/// first applicable filter.
pub trait FilterRegistry: Send + Sync {
    /// Resolve a filter by name
    fn resolve(&self, name: &str) -> Option<Arc<dyn Filter>>;

    /// Registered filter names in the registry's deterministic order
    fn names(&self) -> Vec<String>;
}

/// Map-backed registry; names enumerate lexicographically
#[derive(Default)]
pub struct StaticFilterRegistry {
    filters: BTreeMap<String, Arc<dyn Filter>>,
}

impl StaticFilterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter under a name
    pub fn register(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>) {
        self.filters.insert(name.into(), filter);
    }

    /// Builder-style registration
    pub fn with_filter(mut self, name: impl Into<String>, filter: Arc<dyn Filter>) -> Self {
        self.register(name, filter);
        self
    }

    /// Number of registered filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FilterRegistry for StaticFilterRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Filter>> {
        self.filters.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.filters.keys().cloned().collect()
    }
}
