//! Grant resolution: raw token lists to the effective grant table
//!
//! This module turns the authoring-time grant description into the
//! deduplicated, validated, expanded [`GrantTable`] the evaluator
//! consumes. Resolution runs three passes per role:
//!
//! 1. **Static filter**: deduplicate the token list, drop inheritance
//!    markers, and keep only tokens the catalog recognizes.
//! 2. **Inheritance**: union in the first-pass set of every `"&role"`
//!    reference. One hop only; a referenced role's own inherited
//!    grants do not propagate further.
//! 3. **Action expansion**: for every plain permission left in the
//!    unioned set, add `"permission@action"` for each catalogued
//!    action of that permission.
//!
//! Resolution is a pure function: no I/O, no shared state, and the
//! output is set-equal for any token ordering of the same input. That
//! determinism is what makes the single-slot cache in
//! [`crate::cache`] safe under racing recomputes.

use crate::error::Result;
use crate::model::{
    split_token, validate_catalog, validate_grants, GrantTable, PermissionCatalog, RawGrants,
    INHERIT_PREFIX, TOKEN_SEPARATOR,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Whether a token is a role-inheritance link (`"&role"`)
fn is_inheritance(token: &str) -> bool {
    token.starts_with(INHERIT_PREFIX)
}

/// Whether the catalog recognizes a token, either as a plain permission
/// (`"orders"`) or as an action pair (`"orders@read"`).
fn catalog_allows(token: &str, catalog: &PermissionCatalog) -> bool {
    let (base, qualifier) = split_token(token);
    match qualifier {
        Some(action) => catalog
            .get(base)
            .map(|actions| actions.iter().any(|a| a == action))
            .unwrap_or(false),
        None => catalog.contains_key(base),
    }
}

/// Resolve raw grants into the effective grant table.
///
/// Unknown tokens are not an error: anything the catalog does not
/// recognize is dropped with a debug trace. The output maps every role
/// present in `grants` to its final set.
///
/// # Errors
///
/// Returns `RbacError::Validation` if the catalog or the grant mapping
/// is malformed (empty names, duplicate actions within a permission).
pub fn resolve(grants: &RawGrants, catalog: &PermissionCatalog) -> Result<GrantTable> {
    validate_catalog(catalog)?;
    validate_grants(grants)?;

    // Pass 1: per-role static filter against the catalog.
    let mut first_pass: GrantTable = HashMap::with_capacity(grants.len());
    for (role, tokens) in grants {
        let mut kept = HashSet::new();
        for token in tokens {
            if is_inheritance(token) {
                continue;
            }
            if catalog_allows(token, catalog) {
                kept.insert(token.clone());
            } else {
                debug!("Dropping unknown grant token '{}' for role '{}'", token, role);
            }
        }
        first_pass.insert(role.clone(), kept);
    }

    // Pass 2: one-hop inheritance. Unions always take the referenced
    // role's first-pass set, never its post-union set, so the result
    // does not depend on role iteration order.
    let mut table: GrantTable = HashMap::with_capacity(grants.len());
    for (role, tokens) in grants {
        let mut resolved = first_pass.get(role).cloned().unwrap_or_default();
        for token in tokens {
            if let Some(linked) = token.strip_prefix(INHERIT_PREFIX) {
                if linked == role {
                    debug!("Skipping self-inheritance for role '{}'", role);
                    continue;
                }
                match first_pass.get(linked) {
                    Some(inherited) => resolved.extend(inherited.iter().cloned()),
                    None => {
                        warn!("Role '{}' inherits undeclared role '{}', skipping", role, linked)
                    }
                }
            }
        }
        table.insert(role.clone(), resolved);
    }

    // Pass 3: expand plain permissions into their action pairs.
    for set in table.values_mut() {
        let mut expanded = Vec::new();
        for token in set.iter() {
            if token.contains(TOKEN_SEPARATOR) {
                continue;
            }
            if let Some(actions) = catalog.get(token) {
                for action in actions {
                    expanded.push(format!("{}{}{}", token, TOKEN_SEPARATOR, action));
                }
            }
        }
        set.extend(expanded);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RbacError;

    fn catalog() -> PermissionCatalog {
        let mut catalog = PermissionCatalog::new();
        catalog.insert("orders".to_string(), vec!["read".to_string(), "delete".to_string()]);
        catalog.insert("reports".to_string(), vec!["export".to_string()]);
        catalog
    }

    fn grants(entries: &[(&str, &[&str])]) -> RawGrants {
        entries
            .iter()
            .map(|(role, tokens)| {
                (
                    role.to_string(),
                    tokens.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    fn set(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_unknown_tokens_dropped() {
        let raw = grants(&[("user", &["orders", "ghost", "orders@teleport"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        let user = &table["user"];
        assert!(user.contains("orders"));
        assert!(!user.contains("ghost"));
        assert!(!user.contains("orders@teleport"));
    }

    #[test]
    fn test_duplicate_tokens_collapse() {
        let raw = grants(&[("user", &["orders", "orders", "orders@read", "orders@read"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        assert_eq!(table["user"], set(&["orders", "orders@read", "orders@delete"]));
    }

    #[test]
    fn test_action_qualified_token_kept() {
        let raw = grants(&[("user", &["reports@export"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        assert_eq!(table["user"], set(&["reports@export"]));
    }

    #[test]
    fn test_plain_permission_expands_to_all_actions() {
        let raw = grants(&[("user", &["orders"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        assert_eq!(
            table["user"],
            set(&["orders", "orders@read", "orders@delete"])
        );
    }

    #[test]
    fn test_inheritance_unions_first_pass_set() {
        let raw = grants(&[("admin", &["reports", "&user"]), ("user", &["orders@read"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        let admin = &table["admin"];
        assert!(admin.contains("reports"));
        assert!(admin.contains("reports@export"));
        assert!(admin.contains("orders@read"));
        assert_eq!(table["user"], set(&["orders@read"]));
    }

    #[test]
    fn test_inheritance_is_one_hop_only() {
        // a -> b -> c: a gets b's own tokens but not c's.
        let raw = grants(&[
            ("a", &["&b"]),
            ("b", &["orders@read", "&c"]),
            ("c", &["orders@delete"]),
        ]);
        let table = resolve(&raw, &catalog()).unwrap();

        assert_eq!(table["a"], set(&["orders@read"]));
        assert_eq!(table["b"], set(&["orders@read", "orders@delete"]));
    }

    #[test]
    fn test_self_reference_excluded() {
        let raw = grants(&[("user", &["&user", "orders@read"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        assert_eq!(table["user"], set(&["orders@read"]));
    }

    #[test]
    fn test_unknown_inheritance_reference_skipped() {
        let raw = grants(&[("user", &["orders@read", "&phantom"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        assert_eq!(table["user"], set(&["orders@read"]));
    }

    #[test]
    fn test_inherited_plain_permission_expands() {
        // Expansion runs after the union, so a plain permission picked
        // up through inheritance still gains its action pairs.
        let raw = grants(&[("admin", &["&user"]), ("user", &["orders"])]);
        let table = resolve(&raw, &catalog()).unwrap();

        assert_eq!(
            table["admin"],
            set(&["orders", "orders@read", "orders@delete"])
        );
    }

    #[test]
    fn test_empty_inputs() {
        let table = resolve(&RawGrants::new(), &catalog()).unwrap();
        assert!(table.is_empty());

        let raw = grants(&[("user", &[])]);
        let table = resolve(&raw, &PermissionCatalog::new()).unwrap();
        assert_eq!(table["user"], HashSet::new());
    }

    #[test]
    fn test_malformed_catalog_rejected() {
        let mut bad = PermissionCatalog::new();
        bad.insert("orders".to_string(), vec!["read".to_string(), "read".to_string()]);

        let result = resolve(&RawGrants::new(), &bad);
        assert!(matches!(result, Err(RbacError::Validation(_))));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let raw = grants(&[("admin", &["orders", "&user"]), ("user", &["reports"])]);
        let first = resolve(&raw, &catalog()).unwrap();
        let second = resolve(&raw, &catalog()).unwrap();

        assert_eq!(first, second);
    }
}
