//! Error types for the authorization engine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a guard rejected a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// No principal attached to the request
    AuthenticationRequired,

    /// No organization id could be extracted from the request
    OrganizationContextRequired,

    /// The principal has no membership in the extracted organization
    NotAMember,

    /// The principal is a member but fails the role or permission test
    InsufficientPermissions,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DenyReason::AuthenticationRequired => "authentication_required",
            DenyReason::OrganizationContextRequired => "organization_context_required",
            DenyReason::NotAMember => "not_a_member",
            DenyReason::InsufficientPermissions => "insufficient_permissions",
        };
        f.write_str(name)
    }
}

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Request rejected by a guard
    #[error("{message}")]
    Forbidden { reason: DenyReason, message: String },

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique key violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Repository failure (transient)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// Build a guard rejection
    pub fn forbidden(reason: DenyReason, message: impl Into<String>) -> Self {
        AuthzError::Forbidden {
            reason,
            message: message.into(),
        }
    }

    /// The deny reason, if this is a guard rejection
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            AuthzError::Forbidden { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Whether retrying after the backing store recovers may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthzError::StorageError(_))
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
