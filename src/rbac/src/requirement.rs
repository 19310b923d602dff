//! Requirement descriptors from the dispatch layer
//!
//! A protected operation declares what it demands as a plain
//! [`Requirement`] value; the dispatch layer resolves the caller's
//! role, builds the request-scoped filter parameters, and hands both
//! to the service. The four shapes mirror the evaluator operations:
//! all-of and any-of-groups, each in a sync and an async flavor.

use crate::evaluator::RoleEvaluator;
use serde::{Deserialize, Serialize};

/// Params key under which dispatch layers conventionally pass the
/// incoming request object to synchronous filters
pub const REQUEST_FILTER: &str = "RBAC_REQUEST_FILTER";

/// Params key for the asynchronous counterpart of [`REQUEST_FILTER`]
pub const ASYNC_REQUEST_FILTER: &str = "ASYNC_RBAC_REQUEST_FILTER";

/// Declared authorization requirement for a protected operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tokens", rename_all = "snake_case")]
pub enum Requirement {
    /// Every token must be granted (sync filters)
    All(Vec<String>),

    /// At least one group must be fully granted (sync filters)
    Any(Vec<Vec<String>>),

    /// Every token must be granted (async filters)
    AllAsync(Vec<String>),

    /// At least one group must be fully granted (async filters)
    AnyAsync(Vec<Vec<String>>),
}

impl Requirement {
    /// All-of requirement over the given tokens
    pub fn all(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::All(tokens.into_iter().map(Into::into).collect())
    }

    /// Any-of-groups requirement
    pub fn any(
        groups: impl IntoIterator<Item = impl IntoIterator<Item = impl Into<String>>>,
    ) -> Self {
        Self::Any(collect_groups(groups))
    }

    /// All-of requirement evaluated through async filter capabilities
    pub fn all_async(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::AllAsync(tokens.into_iter().map(Into::into).collect())
    }

    /// Any-of-groups requirement evaluated through async capabilities
    pub fn any_async(
        groups: impl IntoIterator<Item = impl IntoIterator<Item = impl Into<String>>>,
    ) -> Self {
        Self::AnyAsync(collect_groups(groups))
    }

    /// Evaluate this requirement against a role-bound evaluator
    pub async fn evaluate(&self, evaluator: &RoleEvaluator) -> bool {
        match self {
            Requirement::All(tokens) => evaluator.can(tokens),
            Requirement::Any(groups) => evaluator.any(groups),
            Requirement::AllAsync(tokens) => evaluator.can_async(tokens).await,
            Requirement::AnyAsync(groups) => evaluator.any_async(groups).await,
        }
    }
}

fn collect_groups(
    groups: impl IntoIterator<Item = impl IntoIterator<Item = impl Into<String>>>,
) -> Vec<Vec<String>> {
    groups
        .into_iter()
        .map(|group| group.into_iter().map(Into::into).collect())
        .collect()
}
