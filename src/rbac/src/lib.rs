//! # Grantset RBAC Engine
//!
//! Role-based authorization with static grant resolution and dynamic filters.
//!
//! ## Features
//!
//! - **Declarative models** — roles, a permission catalog and per-role grants
//! - **Eager grant resolution** with one-hop role inheritance (`&role` tokens)
//! - **Dynamic filters** for per-request checks beyond static membership
//! - **Async-first design** using Tokio, with sync paths where nothing awaits
//! - **Single-slot caching** of the resolved grant table with optional TTL
//! - **Pluggable storage** behind the [`RbacStore`] trait
//!
//! ## Example
//!
//! ```rust
//! use grantset_rbac::{RbacModel, RbacService, StaticFilterRegistry, StaticRbacStore, StorageService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = RbacModel::new()
//!         .with_role("viewer")
//!         .with_role("editor")
//!         .with_permission("doc", ["read", "edit"])
//!         .with_grant("viewer", ["doc@read"])
//!         .with_grant("editor", ["doc", "&viewer"]);
//!
//!     let storage = StorageService::new(Arc::new(StaticRbacStore::new(model)));
//!     let rbac = RbacService::new(storage, Arc::new(StaticFilterRegistry::new()));
//!
//!     let editor = rbac.role("editor").await?;
//!     assert!(editor.can(&["doc@edit".to_string()]));
//!
//!     let viewer = rbac.role("viewer").await?;
//!     assert!(!viewer.can(&["doc@edit".to_string()]));
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod evaluator;
pub mod filters;
pub mod grants;
pub mod model;
pub mod requirement;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use cache::{CacheConfig, GrantCache, MemoryGrantCache};
pub use error::{RbacError, Result};
pub use evaluator::RoleEvaluator;
pub use filters::{Filter, FilterParams, FilterRegistry, StaticFilterRegistry};
pub use grants::resolve;
pub use model::{
    FilterRefs, GrantTable, PermissionCatalog, RawGrants, RbacModel, RoleId,
    INHERIT_PREFIX, TOKEN_SEPARATOR,
};
pub use requirement::{Requirement, ASYNC_REQUEST_FILTER, REQUEST_FILTER};
pub use service::{RbacService, StorageService};
pub use store::{RbacStore, StaticRbacStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
