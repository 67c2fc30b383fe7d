//! Error types for the access control model

use thiserror::Error;

/// Access control errors
#[derive(Debug, Error)]
pub enum AccessError {
    /// Mutation attempted after the grants model was locked
    #[error("Cannot alter the underlying grants model. AccessControl instance is locked.")]
    Locked,

    /// Empty or reserved role / resource name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Input is not in any of the accepted shapes
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Attribute list is neither empty nor a list of non-empty strings
    #[error("Invalid attributes: {0}")]
    InvalidAttributes(String),

    /// Malformed attribute glob
    #[error("Invalid attribute glob: {0}")]
    InvalidGlob(#[from] crate::notation::NotationError),

    /// Missing or unknown action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Possession outside of `own` / `any`
    #[error("Invalid action possession: {0}")]
    InvalidPossession(String),

    /// Referenced role does not exist
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// A role names itself as its own extender
    #[error("Cannot extend role \"{0}\" by itself.")]
    SelfExtension(String),

    /// Extending would create an inheritance cycle
    #[error("Cross inheritance is not allowed. Role \"{extender}\" already extends \"{role}\".")]
    CrossInheritance {
        /// Role that was about to be extended
        role: String,
        /// Candidate extender that already inherits `role`
        extender: String,
    },

    /// Locking a model without any grants
    #[error("Cannot lock empty or invalid grants model.")]
    EmptyGrants,

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccessError {
    /// Whether this error was raised because the model is locked
    pub fn is_locked(&self) -> bool {
        matches!(self, AccessError::Locked)
    }
}

/// Result type for access control operations
pub type Result<T> = std::result::Result<T, AccessError>;
