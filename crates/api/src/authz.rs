//! Route-side authorization guard.
//!
//! Handlers call [`require`] with the identity attached by the auth
//! middleware before running protected logic.

use gatehouse_auth::{Permission, RbacRegistry, RequestIdentity};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("forbidden: missing permission '{0}'")]
pub struct Forbidden(pub Permission);

/// Check that `identity` may perform `action` on `resource`.
pub fn require(
    rbac: &RbacRegistry,
    identity: &RequestIdentity,
    resource: &str,
    action: &str,
) -> Result<(), Forbidden> {
    if rbac.is_allowed(&identity.roles, resource, action) {
        return Ok(());
    }

    tracing::debug!(
        user_id = %identity.user_id,
        roles = ?identity.roles,
        resource,
        action,
        "request forbidden"
    );
    Err(Forbidden(Permission::of(resource, action)))
}
