//! Declarative role policy, replayed into a registry at startup.
//!
//! ```json
//! {
//!   "roles": [
//!     { "name": "admin", "permissions": ["document:*"] },
//!     { "name": "user", "permissions": ["document:read"] },
//!     { "name": "guest", "parents": ["user"] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AuthError, AuthResult, RbacRegistry};

/// One role entry of a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleSpec {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Role policy document. Entries apply in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RbacPolicy {
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
}

impl RbacPolicy {
    pub fn from_json_str(json: &str) -> AuthResult<Self> {
        serde_json::from_str(json).map_err(|e| AuthError::policy(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::policy(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}

impl RbacRegistry {
    /// Build a registry by replaying `policy` as `add_role` / `add_permission`
    /// calls. Stops at the first failing entry.
    pub fn from_policy(policy: &RbacPolicy) -> AuthResult<Self> {
        let registry = Self::new();
        registry.apply_policy(policy)?;
        Ok(registry)
    }

    /// Replay `policy` on top of the current registry contents.
    ///
    /// All or nothing: if any entry fails, the registry is left exactly as it
    /// was before the call.
    pub fn apply_policy(&self, policy: &RbacPolicy) -> AuthResult<()> {
        self.apply_all(|staged| {
            for spec in &policy.roles {
                let parents: Vec<&str> = spec.parents.iter().map(String::as_str).collect();
                let permissions: Vec<&str> =
                    spec.permissions.iter().map(String::as_str).collect();

                staged.add_role(&spec.name, &parents)?;
                if !permissions.is_empty() {
                    staged.add_permission(&spec.name, &permissions)?;
                }
            }
            Ok(())
        })?;

        tracing::info!(roles = policy.roles.len(), "role policy applied");
        Ok(())
    }
}
