//! Core RBAC data model
//!
//! The raw, human-authored description of an authorization domain:
//! a role list, a permission catalog (permission name -> action names),
//! per-role grant token lists, and named dynamic filter references.
//! The [`crate::grants`] resolver turns this into an effective
//! [`GrantTable`].

use crate::error::{RbacError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Unique role identifier
pub type RoleId = String;

/// Permission catalog: permission name -> action names
pub type PermissionCatalog = HashMap<String, Vec<String>>;

/// Authoring-time grants: role -> ordered token list
pub type RawGrants = HashMap<String, Vec<String>>;

/// Resolved grants: role -> deduplicated, expanded token set
pub type GrantTable = HashMap<String, HashSet<String>>;

/// Declared dynamic filters: filter name -> opaque reference
/// (e.g. the fully qualified name of the implementation to wire in)
pub type FilterRefs = BTreeMap<String, String>;

/// Token prefix marking a role-inheritance link (`"&editor"`)
pub const INHERIT_PREFIX: char = '&';

/// Separator between a permission and its action or filter suffix (`"orders@read"`)
pub const TOKEN_SEPARATOR: char = '@';

/// Split a token into its permission base and optional qualifier.
///
/// Only the first two separator-delimited segments are significant;
/// anything after a second `@` is ignored by the authoring format.
pub fn split_token(token: &str) -> (&str, Option<&str>) {
    let mut parts = token.splitn(3, TOKEN_SEPARATOR);
    let base = parts.next().unwrap_or("");
    (base, parts.next())
}

/// Raw authorization model as authored or fetched from storage
///
/// `roles` is the queryable universe: a role must be listed there to be
/// bound to an evaluator, even if it has grants. `grants` may reference
/// roles outside the list; those resolve normally but stay unreachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RbacModel {
    /// Declared role identifiers
    pub roles: Vec<RoleId>,

    /// Permission catalog
    #[serde(default)]
    pub permissions: PermissionCatalog,

    /// Raw grant token lists per role
    #[serde(default)]
    pub grants: RawGrants,

    /// Named dynamic filter references
    #[serde(default)]
    pub filters: FilterRefs,
}

impl RbacModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a permission and its actions to the catalog
    pub fn with_permission(
        mut self,
        name: impl Into<String>,
        actions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.permissions
            .insert(name.into(), actions.into_iter().map(Into::into).collect());
        self
    }

    /// Add a raw grant token list for a role
    pub fn with_grant(
        mut self,
        role: impl Into<String>,
        tokens: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.grants
            .insert(role.into(), tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a named dynamic filter
    pub fn with_filter_ref(mut self, name: impl Into<String>, reference: impl Into<String>) -> Self {
        self.filters.insert(name.into(), reference.into());
        self
    }

    /// Whether a role is declared in the role list
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Validate the model definition
    ///
    /// # Errors
    ///
    /// Returns `RbacError::Validation` if:
    /// - a role id is empty or duplicated
    /// - the permission catalog is malformed (see [`validate_catalog`])
    /// - a grant entry is malformed (see [`validate_grants`])
    /// - a filter name is empty
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for role in &self.roles {
            if role.is_empty() {
                return Err(RbacError::Validation("role id cannot be empty".into()));
            }
            if !seen.insert(role.as_str()) {
                return Err(RbacError::Validation(format!("duplicate role: {}", role)));
            }
        }

        validate_catalog(&self.permissions)?;
        validate_grants(&self.grants)?;

        for name in self.filters.keys() {
            if name.is_empty() {
                return Err(RbacError::Validation("filter name cannot be empty".into()));
            }
        }

        Ok(())
    }
}

/// Validate a permission catalog: non-empty permission names, non-empty
/// action names, and no duplicate action within one permission.
pub fn validate_catalog(catalog: &PermissionCatalog) -> Result<()> {
    for (permission, actions) in catalog {
        if permission.is_empty() {
            return Err(RbacError::Validation("permission name cannot be empty".into()));
        }
        let mut seen = HashSet::new();
        for action in actions {
            if action.is_empty() {
                return Err(RbacError::Validation(format!(
                    "permission {} has an empty action name",
                    permission
                )));
            }
            if !seen.insert(action.as_str()) {
                return Err(RbacError::Validation(format!(
                    "permission {} lists action {} more than once",
                    permission, action
                )));
            }
        }
    }
    Ok(())
}

/// Validate raw grants: non-empty role keys and non-empty tokens.
pub fn validate_grants(grants: &RawGrants) -> Result<()> {
    for (role, tokens) in grants {
        if role.is_empty() {
            return Err(RbacError::Validation("grant role key cannot be empty".into()));
        }
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(RbacError::Validation(format!(
                "role {} has an empty grant token",
                role
            )));
        }
    }
    Ok(())
}
