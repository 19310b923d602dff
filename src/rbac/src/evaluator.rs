//! Per-request authorization evaluator
//!
//! A [`RoleEvaluator`] binds one role's resolved grant set to a filter
//! registry and the request-scoped parameters for a single authorization
//! attempt. Evaluation layers two checks:
//!
//! 1. **Static membership**: every requirement token must be present in
//!    the grant set. An empty requirement list is denied outright, and a
//!    missing token denies without consulting any filter.
//! 2. **Filter augmentation**: requirement tokens are scanned in the
//!    caller's order for the first one that resolves to a registered
//!    filter, either through an explicit `"permission@filter"` suffix or
//!    by matching `"token@name"` in the grant set against the registry's
//!    names. That filter's verdict is the result of the whole call.
//!
//! The early return on the first applicable filter is intentional and
//! locked by a regression test: later requirement tokens never reach
//! their filters once one has fired.

use crate::filters::{Filter, FilterParams, FilterRegistry};
use crate::model::{split_token, RoleId, TOKEN_SEPARATOR};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Role-bound evaluator, created per authorization attempt
pub struct RoleEvaluator {
    /// Role this evaluator answers for
    role: RoleId,

    /// The role's resolved grant set
    grants: HashSet<String>,

    /// Filter lookup, shared with the owning service
    registry: Arc<dyn FilterRegistry>,

    /// Request-scoped filter parameters, if the dispatch layer built any
    params: Option<FilterParams>,
}

impl std::fmt::Debug for RoleEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleEvaluator")
            .field("role", &self.role)
            .field("grants", &self.grants)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl RoleEvaluator {
    /// Create an evaluator for a role and its resolved grant set
    pub fn new(
        role: impl Into<String>,
        grants: HashSet<String>,
        registry: Arc<dyn FilterRegistry>,
        params: Option<FilterParams>,
    ) -> Self {
        Self {
            role: role.into(),
            grants,
            registry,
            params,
        }
    }

    /// Role this evaluator was built for
    pub fn role(&self) -> &str {
        &self.role
    }

    /// The resolved grant set backing this evaluator
    pub fn grants(&self) -> &HashSet<String> {
        &self.grants
    }

    /// Check that the role holds every requirement, synchronously.
    ///
    /// Returns `false` for an empty requirement list and for any token
    /// missing from the grant set; otherwise the verdict of the first
    /// applicable filter, or `true` when no filter applies.
    pub fn can(&self, requirements: &[String]) -> bool {
        if !self.holds_all(requirements) {
            return false;
        }

        match self.applicable_filter(requirements) {
            Some((name, filter)) => {
                debug!("Role '{}' delegating to filter '{}'", self.role, name);
                filter.can(self.params_for(&name))
            }
            None => true,
        }
    }

    /// Check that the role holds every requirement, through the
    /// asynchronous filter capability. Same contract as [`Self::can`].
    pub async fn can_async(&self, requirements: &[String]) -> bool {
        if !self.holds_all(requirements) {
            return false;
        }

        match self.applicable_filter(requirements) {
            Some((name, filter)) => {
                debug!("Role '{}' delegating to async filter '{}'", self.role, name);
                filter.can_async(self.params_for(&name)).await
            }
            None => true,
        }
    }

    /// Check whether any group of requirements passes [`Self::can`].
    ///
    /// Every group is evaluated; the result is the OR over all of them.
    /// No groups means no access.
    pub fn any(&self, groups: &[Vec<String>]) -> bool {
        let results: Vec<bool> = groups.iter().map(|group| self.can(group)).collect();
        results.into_iter().any(|allowed| allowed)
    }

    /// Check whether any group passes [`Self::can_async`].
    ///
    /// All groups are issued concurrently and awaited together before
    /// the results are ORed.
    pub async fn any_async(&self, groups: &[Vec<String>]) -> bool {
        let checks = groups.iter().map(|group| self.can_async(group));
        join_all(checks).await.into_iter().any(|allowed| allowed)
    }

    /// Static membership gate: non-empty and fully contained in grants
    fn holds_all(&self, requirements: &[String]) -> bool {
        if requirements.is_empty() {
            return false;
        }
        requirements.iter().all(|token| self.grants.contains(token))
    }

    /// Scan requirements in order for the first applicable filter.
    ///
    /// A token with a `"p@f"` suffix applies filter `f` when the
    /// registry knows it. An unqualified token applies the first
    /// registered name `f` (registry order) with `"token@f"` in the
    /// grant set. The scan stops at the first match.
    fn applicable_filter(&self, requirements: &[String]) -> Option<(String, Arc<dyn Filter>)> {
        for token in requirements {
            let (_, qualifier) = split_token(token);
            match qualifier {
                Some(name) => {
                    if let Some(filter) = self.registry.resolve(name) {
                        return Some((name.to_string(), filter));
                    }
                }
                None => {
                    for name in self.registry.names() {
                        let qualified = format!("{}{}{}", token, TOKEN_SEPARATOR, name);
                        if self.grants.contains(&qualified) {
                            if let Some(filter) = self.registry.resolve(&name) {
                                return Some((name, filter));
                            }
                        }
                    }
                }
            }
        }
        None
    }

    /// Parameters attached for a filter, if the carrier holds any
    fn params_for(&self, filter: &str) -> Option<&[Value]> {
        self.params.as_ref().and_then(|params| params.param(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::StaticFilterRegistry;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Verdict {
        allow: bool,
        calls: AtomicUsize,
    }

    impl Verdict {
        fn new(allow: bool) -> Arc<Self> {
            Arc::new(Self {
                allow,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Filter for Verdict {
        fn can(&self, _params: Option<&[Value]>) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.allow
        }

        async fn can_async(&self, _params: Option<&[Value]>) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.allow
        }
    }

    fn grants(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn reqs(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn evaluator(grant: HashSet<String>, registry: StaticFilterRegistry) -> RoleEvaluator {
        RoleEvaluator::new("user", grant, Arc::new(registry), None)
    }

    #[test]
    fn test_empty_requirements_denied() {
        let eval = evaluator(grants(&["orders"]), StaticFilterRegistry::new());
        assert!(!eval.can(&[]));
    }

    #[test]
    fn test_missing_token_denied_without_filter() {
        let owner = Verdict::new(true);
        let registry = StaticFilterRegistry::new().with_filter("owner", owner.clone());
        let eval = evaluator(grants(&["orders@owner"]), registry);

        assert!(!eval.can(&reqs(&["orders"])));
        assert_eq!(owner.calls(), 0, "membership failure must not reach filters");
    }

    #[test]
    fn test_granted_without_filters_allowed() {
        let eval = evaluator(grants(&["orders", "orders@read"]), StaticFilterRegistry::new());
        assert!(eval.can(&reqs(&["orders", "orders@read"])));
    }

    #[test]
    fn test_suffix_filter_verdict_wins() {
        let owner = Verdict::new(false);
        let registry = StaticFilterRegistry::new().with_filter("owner", owner.clone());
        let eval = evaluator(grants(&["orders@owner"]), registry);

        assert!(!eval.can(&reqs(&["orders@owner"])));
        assert_eq!(owner.calls(), 1);
    }

    #[test]
    fn test_unqualified_token_scans_grant_pairs() {
        // "orders" is granted and "orders@owner" pairs it with a
        // registered filter, so the filter decides.
        let owner = Verdict::new(false);
        let registry = StaticFilterRegistry::new().with_filter("owner", owner.clone());
        let eval = evaluator(grants(&["orders", "orders@owner"]), registry);

        assert!(!eval.can(&reqs(&["orders"])));
        assert_eq!(owner.calls(), 1);
    }

    #[test]
    fn test_action_suffix_is_not_a_filter() {
        // "read" is an action, not a registered filter; the suffix scan
        // finds nothing and static membership carries the day.
        let owner = Verdict::new(false);
        let registry = StaticFilterRegistry::new().with_filter("owner", owner.clone());
        let eval = evaluator(grants(&["orders@read"]), registry);

        assert!(eval.can(&reqs(&["orders@read"])));
        assert_eq!(owner.calls(), 0);
    }

    #[test]
    fn test_first_applicable_filter_returns_early() {
        let first = Verdict::new(true);
        let second = Verdict::new(false);
        let registry = StaticFilterRegistry::new()
            .with_filter("first", first.clone())
            .with_filter("second", second.clone());
        let eval = evaluator(grants(&["a@first", "b@second"]), registry);

        // Both tokens carry filters; only the first one runs and its
        // verdict is final even though the second would deny.
        assert!(eval.can(&reqs(&["a@first", "b@second"])));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_async_mirrors_sync_contract() {
        let owner = Verdict::new(false);
        let registry = StaticFilterRegistry::new().with_filter("owner", owner.clone());
        let eval = evaluator(grants(&["orders@owner"]), registry);

        assert!(!eval.can_async(&reqs(&["orders@owner"])).await);
        assert!(!eval.can_async(&[]).await);
        assert!(!eval.can_async(&reqs(&["ghost"])).await);
    }

    #[test]
    fn test_any_ors_over_all_groups() {
        let eval = evaluator(grants(&["a"]), StaticFilterRegistry::new());

        assert!(eval.any(&[reqs(&["ghost"]), reqs(&["a"])]));
        assert!(!eval.any(&[reqs(&["ghost"]), reqs(&["phantom"])]));
        assert!(!eval.any(&[]));
    }

    #[tokio::test]
    async fn test_any_async_ors_over_all_groups() {
        let eval = evaluator(grants(&["a"]), StaticFilterRegistry::new());

        assert!(eval.any_async(&[reqs(&["ghost"]), reqs(&["a"])]).await);
        assert!(!eval.any_async(&[reqs(&["ghost"])]).await);
    }

    #[test]
    fn test_filter_receives_its_params() {
        struct WantsAnswer;

        impl Filter for WantsAnswer {
            fn can(&self, params: Option<&[Value]>) -> bool {
                params.map(|p| p == [json!(42)]).unwrap_or(false)
            }
        }

        let registry = StaticFilterRegistry::new().with_filter("quiz", Arc::new(WantsAnswer));
        let params = FilterParams::new().with_param("quiz", [json!(42)]);
        let eval = RoleEvaluator::new(
            "user",
            grants(&["orders@quiz"]),
            Arc::new(registry),
            Some(params),
        );

        assert!(eval.can(&reqs(&["orders@quiz"])));

        // Without the carrier the filter sees no params and denies.
        let registry = StaticFilterRegistry::new().with_filter("quiz", Arc::new(WantsAnswer));
        let bare = evaluator(grants(&["orders@quiz"]), registry);
        assert!(!bare.can(&reqs(&["orders@quiz"])));
    }
}
