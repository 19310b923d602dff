//! Storage collaborator contract
//!
//! The raw authorization model lives outside this crate: a config file,
//! a database, a remote service. [`RbacStore`] is the async seam those
//! collaborators implement; [`StaticRbacStore`] covers the common case
//! of a model fixed at startup.

use crate::error::Result;
use crate::model::RbacModel;
use async_trait::async_trait;

/// Async source of the raw authorization model
///
/// Implementations may cache upstream; the engine treats every `load`
/// as authoritative and applies its own grant-table caching on top.
#[async_trait]
pub trait RbacStore: Send + Sync {
    /// Load the raw model
    ///
    /// # Errors
    ///
    /// Returns `RbacError::Storage` when the backing source fails.
    async fn load(&self) -> Result<RbacModel>;
}

/// Store wrapping a model fixed at construction time
pub struct StaticRbacStore {
    model: RbacModel,
}

impl StaticRbacStore {
    /// Wrap a fixed model
    pub fn new(model: RbacModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl RbacStore for StaticRbacStore {
    async fn load(&self) -> Result<RbacModel> {
        Ok(self.model.clone())
    }
}
