//! Error model for token handling and role registry operations.

use thiserror::Error;

/// Result type used across the auth crate.
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication/authorization core error.
///
/// RBAC queries never produce one of these: an unknown role, resource or
/// action resolves to "deny". Only construction, token validation and
/// registry mutation are fallible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Construction input was rejected (e.g. an empty signing secret).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Malformed token, bad signature, disallowed algorithm, wrong token
    /// class, unsupported payload version or a token that is not valid yet.
    #[error("invalid token")]
    InvalidToken,

    /// The token's expiry has passed.
    #[error("token has expired")]
    TokenExpired,

    /// A registry operation referenced an unregistered role.
    #[error("role not found: {0}")]
    NotFound(String),

    /// The role is already registered.
    #[error("role already exists: {0}")]
    AlreadyExists(String),

    /// Registering the role would close a cycle in the hierarchy.
    #[error("role hierarchy cycle through '{0}'")]
    CyclicHierarchy(String),

    /// A policy document could not be read or parsed.
    #[error("invalid policy: {0}")]
    Policy(String),

    /// The signing backend failed to produce a token.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(role: impl Into<String>) -> Self {
        Self::NotFound(role.into())
    }

    pub fn already_exists(role: impl Into<String>) -> Self {
        Self::AlreadyExists(role.into())
    }

    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }
}
