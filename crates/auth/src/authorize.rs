use serde::Serialize;

use crate::{Permission, Role};

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// The grant that satisfied an authorization query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    /// Role the caller presented.
    pub held_role: Role,
    /// Role in the hierarchy that carries the grant (the held role itself or
    /// one of its ancestors).
    pub source_role: Role,
    /// Matching grant: the exact permission or the resource wildcard.
    pub permission: Permission,
}

/// Auditable record of an authorization decision.
///
/// Produced by [`RbacRegistry::explain`](crate::RbacRegistry::explain); the
/// `granted` flag always agrees with `is_allowed` for the same inputs.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: Permission,
    pub granted: bool,
    pub held_roles: Vec<Role>,
    /// Held roles the registry does not know. They contribute nothing.
    pub unknown_roles: Vec<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant: Option<Grant>,
    pub reason: String,
}

impl AuthorizationExplanation {
    pub(crate) fn new(
        resource: &str,
        action: &str,
        held_roles: Vec<Role>,
        grant: Option<Grant>,
        unknown_roles: Vec<Role>,
    ) -> Self {
        let required_permission = Permission::of(resource, action);

        let reason = match &grant {
            Some(g) if g.held_role == g.source_role => {
                format!("role '{}' grants '{}'", g.held_role, g.permission)
            }
            Some(g) => format!(
                "role '{}' inherits '{}' from '{}'",
                g.held_role, g.permission, g.source_role
            ),
            None if held_roles.is_empty() => {
                format!("no roles presented; '{required_permission}' denied by default")
            }
            None => format!(
                "none of {:?} grants '{}' or '{}'",
                held_roles.iter().map(Role::as_str).collect::<Vec<_>>(),
                required_permission,
                Permission::all_actions(resource),
            ),
        };

        Self {
            required_permission,
            granted: grant.is_some(),
            held_roles,
            unknown_roles,
            grant,
            reason,
        }
    }
}
