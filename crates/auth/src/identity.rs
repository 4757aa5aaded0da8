use serde::{Deserialize, Serialize};

use crate::{Claims, Role};

/// Authenticated caller, as derived from a validated access token.
///
/// Transport adapters attach this to the request (e.g. as an axum request
/// extension) and hand it to authorization checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub user_id: String,
    pub roles: Vec<Role>,
}

impl RequestIdentity {
    pub fn new(user_id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            roles: claims.roles,
        }
    }

    /// Literal role membership (no hierarchy expansion).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }
}

impl From<Claims> for RequestIdentity {
    fn from(claims: Claims) -> Self {
        Self::from_claims(claims)
    }
}
