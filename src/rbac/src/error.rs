//! Error types for the RBAC engine

use thiserror::Error;

/// RBAC engine errors
#[derive(Debug, Error)]
pub enum RbacError {
    /// Requested role is not declared in the model
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// No authenticated subject on the request
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Subject is authenticated but the requirement evaluated to false
    #[error("Access denied")]
    AccessDenied,

    /// Invalid model definition
    #[error("Invalid model: {0}")]
    Validation(String),

    /// Backing store failure while loading the model
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;
