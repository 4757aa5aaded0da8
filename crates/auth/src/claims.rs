use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthError, AuthResult, Role};

/// Version of the signed payload layout. Tokens carrying any other version are
/// rejected as invalid.
pub const CLAIMS_SCHEMA_VERSION: u8 = 1;

/// Purpose a token was issued for.
///
/// Both classes share one payload layout but are signed with independent
/// secrets; a token of one class never validates as the other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

impl core::fmt::Display for TokenClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed token payload.
///
/// Roles are recorded as granted at issuance; they are not re-resolved
/// against the live role registry when the token is validated. Timestamps
/// travel as whole seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "ver")]
    pub version: u8,

    /// Subject / user identifier.
    #[serde(rename = "sub")]
    pub user_id: String,

    /// Roles granted at issuance. Always empty for refresh tokens.
    #[serde(default)]
    pub roles: Vec<Role>,

    pub class: TokenClass,

    #[serde(rename = "iss", default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "nbf", with = "chrono::serde::ts_seconds")]
    pub not_before: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Claims valid from `now` for `ttl`. Fails if the expiry is not a
    /// representable instant.
    pub fn new(
        user_id: impl Into<String>,
        roles: Vec<Role>,
        class: TokenClass,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> AuthResult<Self> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::validation("token expiry out of range"))?;

        Ok(Self {
            version: CLAIMS_SCHEMA_VERSION,
            user_id: user_id.into(),
            roles,
            class,
            issuer: None,
            issued_at: now,
            not_before: now,
            expires_at,
        })
    }

    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    /// Check the time window at `now`.
    ///
    /// The token is usable for `not_before <= now <= expires_at`.
    pub fn check_window(&self, now: DateTime<Utc>) -> AuthResult<()> {
        if self.expires_at < self.not_before {
            return Err(AuthError::InvalidToken);
        }
        if now < self.not_before {
            return Err(AuthError::InvalidToken);
        }
        if now > self.expires_at {
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }
}
