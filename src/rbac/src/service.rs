//! Model access and evaluator construction
//!
//! [`StorageService`] fronts the [`RbacStore`] collaborator: plain
//! accessors for the raw model pieces, plus the cache-checked
//! [`StorageService::grant_table`] resolution path. [`RbacService`]
//! sits on top and builds per-request [`RoleEvaluator`]s, with
//! [`RbacService::enforce`] as the function-call stand-in for a web
//! guard: authenticate, evaluate, allow or deny.

use crate::cache::{CacheConfig, GrantCache};
use crate::error::{RbacError, Result};
use crate::evaluator::RoleEvaluator;
use crate::filters::{FilterParams, FilterRegistry};
use crate::grants;
use crate::model::{FilterRefs, GrantTable, PermissionCatalog, RawGrants, RbacModel};
use crate::requirement::Requirement;
use crate::store::RbacStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Cached access to the raw model and its resolved grant table
pub struct StorageService {
    /// Model source
    store: Arc<dyn RbacStore>,

    /// Optional single-slot table cache
    cache: Option<Arc<dyn GrantCache>>,

    /// TTL applied when populating the cache
    cache_config: CacheConfig,
}

impl StorageService {
    /// Create a service over a store, with no cache
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self {
            store,
            cache: None,
            cache_config: CacheConfig::default(),
        }
    }

    /// Attach a grant-table cache
    pub fn with_cache(mut self, cache: Arc<dyn GrantCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the cache configuration
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// The full raw model, straight from the store
    pub async fn model(&self) -> Result<RbacModel> {
        self.store.load().await
    }

    /// Declared role identifiers
    pub async fn roles(&self) -> Result<Vec<String>> {
        Ok(self.store.load().await?.roles)
    }

    /// The permission catalog
    pub async fn catalog(&self) -> Result<PermissionCatalog> {
        Ok(self.store.load().await?.permissions)
    }

    /// Raw per-role grant token lists
    pub async fn raw_grants(&self) -> Result<RawGrants> {
        Ok(self.store.load().await?.grants)
    }

    /// Declared dynamic filter references
    pub async fn filter_refs(&self) -> Result<FilterRefs> {
        Ok(self.store.load().await?.filters)
    }

    /// The effective grant table, resolved through the cache.
    ///
    /// On a miss the model is loaded, validated, resolved and the
    /// result stored with the configured TTL. Racing misses may each
    /// resolve and write; resolution is pure, so the writes are
    /// set-equal and the race is harmless.
    pub async fn grant_table(&self) -> Result<GrantTable> {
        if let Some(cache) = &self.cache {
            if let Some(table) = cache.get().await {
                debug!("Grant table served from cache");
                return Ok(table);
            }
            debug!("Grant table cache miss, resolving");
        }

        let model = self.store.load().await?;
        model.validate()?;
        let table = grants::resolve(&model.grants, &model.permissions)?;

        if let Some(cache) = &self.cache {
            cache.set(table.clone(), self.cache_config.ttl).await;
        }

        Ok(table)
    }

    /// A role's resolved grant set; empty for a role with no grants
    pub async fn grants_for(&self, role: &str) -> Result<HashSet<String>> {
        let mut table = self.grant_table().await?;
        Ok(table.remove(role).unwrap_or_default())
    }

    /// Drop the cached table; the next resolution recomputes.
    ///
    /// Storage mutations do not invalidate anything on their own — the
    /// owning collaborator calls this (or lets the TTL lapse).
    pub async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.del().await;
            debug!("Grant table cache invalidated");
        }
    }
}

/// Authorization service: evaluator construction and enforcement
pub struct RbacService {
    storage: StorageService,
    registry: Arc<dyn FilterRegistry>,
}

impl RbacService {
    /// Create a service over storage and a filter registry
    pub fn new(storage: StorageService, registry: Arc<dyn FilterRegistry>) -> Self {
        info!(
            "RBAC service initialized with {} registered filters",
            registry.names().len()
        );
        Self { storage, registry }
    }

    /// The underlying storage service
    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    /// Build an evaluator for a role, with no request parameters
    pub async fn role(&self, role: &str) -> Result<RoleEvaluator> {
        self.role_with_params(role, None).await
    }

    /// Build an evaluator for a role with request-scoped filter params
    ///
    /// # Errors
    ///
    /// Returns `RbacError::RoleNotFound` when the role is not declared
    /// in the model's role list, even if it has grant entries.
    pub async fn role_with_params(
        &self,
        role: &str,
        params: Option<FilterParams>,
    ) -> Result<RoleEvaluator> {
        let model = self.storage.model().await?;
        if !model.has_role(role) {
            return Err(RbacError::RoleNotFound(role.to_string()));
        }

        let grants = self.storage.grants_for(role).await?;
        debug!("Built evaluator for role '{}' with {} grants", role, grants.len());

        Ok(RoleEvaluator::new(
            role,
            grants,
            Arc::clone(&self.registry),
            params,
        ))
    }

    /// Enforce a requirement for a subject's role.
    ///
    /// The dispatch layer extracts the subject (the authenticated
    /// caller's role) and the declared requirement, then calls this.
    ///
    /// # Errors
    ///
    /// - `RbacError::AuthenticationRequired` when `subject` is `None`
    /// - `RbacError::RoleNotFound` for an undeclared role
    /// - `RbacError::AccessDenied` when the requirement evaluates false
    pub async fn enforce(
        &self,
        subject: Option<&str>,
        requirement: &Requirement,
        params: Option<FilterParams>,
    ) -> Result<()> {
        let Some(role) = subject else {
            return Err(RbacError::AuthenticationRequired);
        };

        let evaluator = self.role_with_params(role, params).await?;
        if requirement.evaluate(&evaluator).await {
            Ok(())
        } else {
            debug!("Access denied for role '{}'", role);
            Err(RbacError::AccessDenied)
        }
    }
}
