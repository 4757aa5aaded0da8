//! Signed token issuance and validation.
//!
//! Access and refresh tokens share the [`Claims`] layout but are signed with
//! independent secrets and carry a class tag, so a token minted for one
//! purpose is rejected when presented for the other.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;

use crate::claims::CLAIMS_SCHEMA_VERSION;
use crate::{AuthError, AuthResult, Claims, Role, TokenClass};

/// Default lifetime of an access token.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default lifetime of a refresh token.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Longest lifetime accepted for either token class.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

const RECOMMENDED_SECRET_LEN: usize = 32;

/// Keyed-hash algorithms accepted on validation.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Token manager configuration.
///
/// Unset TTLs fall back to [`DEFAULT_ACCESS_TTL`] and [`DEFAULT_REFRESH_TTL`].
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl: Option<Duration>,
    pub refresh_ttl: Option<Duration>,
    /// Signing algorithm; must be one of the HMAC family.
    pub algorithm: Algorithm,
    /// Issuer written into every token and required on validation.
    pub issuer: Option<String>,
}

impl TokenConfig {
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: None,
            refresh_ttl: None,
            algorithm: Algorithm::HS256,
            issuer: None,
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = Some(ttl);
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = Some(ttl);
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Reject configurations no token should ever be issued under.
    pub fn validate(&self) -> AuthResult<()> {
        if self.access_secret.is_empty() {
            return Err(AuthError::validation("access token secret is empty"));
        }
        if self.refresh_secret.is_empty() {
            return Err(AuthError::validation("refresh token secret is empty"));
        }
        if !HMAC_ALGORITHMS.contains(&self.algorithm) {
            return Err(AuthError::validation(format!(
                "signing algorithm {:?} is not an HMAC algorithm",
                self.algorithm
            )));
        }
        if self.access_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(AuthError::validation("access token TTL must be positive"));
        }
        if self.refresh_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(AuthError::validation("refresh token TTL must be positive"));
        }
        if self.access_ttl.is_some_and(|ttl| ttl > MAX_TOKEN_TTL) {
            return Err(AuthError::validation(format!(
                "access token TTL exceeds {} seconds",
                MAX_TOKEN_TTL.as_secs()
            )));
        }
        if self.refresh_ttl.is_some_and(|ttl| ttl > MAX_TOKEN_TTL) {
            return Err(AuthError::validation(format!(
                "refresh token TTL exceeds {} seconds",
                MAX_TOKEN_TTL.as_secs()
            )));
        }

        if self.access_secret.len() < RECOMMENDED_SECRET_LEN
            || self.refresh_secret.len() < RECOMMENDED_SECRET_LEN
        {
            tracing::warn!("token secret is shorter than recommended ({RECOMMENDED_SECRET_LEN} bytes)");
        }
        if self.access_secret == self.refresh_secret {
            tracing::warn!("access and refresh tokens share one secret; only the class tag separates them");
        }
        Ok(())
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validator contract
// ─────────────────────────────────────────────────────────────────────────────

/// Token validation contract consumed by transport adapters.
pub trait TokenValidator: Send + Sync {
    /// Verify `token` as a token of `class` at time `now`.
    fn validate_at(
        &self,
        token: &str,
        class: TokenClass,
        now: DateTime<Utc>,
    ) -> AuthResult<Claims>;

    fn validate(&self, token: &str, class: TokenClass) -> AuthResult<Claims> {
        self.validate_at(token, class, Utc::now())
    }
}

/// Access/refresh pair handed to a client after authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenManager
// ─────────────────────────────────────────────────────────────────────────────

struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
}

impl ClassKeys {
    fn new(secret: &[u8], ttl: Duration) -> AuthResult<Self> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|e| AuthError::validation(format!("token TTL out of range: {e}")))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        })
    }
}

/// Issues and verifies access and refresh tokens.
///
/// Holds only immutable key material, so it can be shared across request
/// handlers (`Arc<TokenManager>`) without synchronization.
pub struct TokenManager {
    access: ClassKeys,
    refresh: ClassKeys,
    algorithm: Algorithm,
    issuer: Option<String>,
    validation: Validation,
}

impl TokenManager {
    /// Build a manager, failing before any token can be issued if the
    /// configuration is unusable.
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        config.validate()?;

        let access = ClassKeys::new(
            &config.access_secret,
            config.access_ttl.unwrap_or(DEFAULT_ACCESS_TTL),
        )?;
        let refresh = ClassKeys::new(
            &config.refresh_secret,
            config.refresh_ttl.unwrap_or(DEFAULT_REFRESH_TTL),
        )?;

        // Time checks run against the caller's clock in `Claims::check_window`.
        let mut validation = Validation::new(config.algorithm);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        if let Some(issuer) = &config.issuer {
            validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);
            validation.set_issuer(&[issuer]);
        } else {
            validation.set_required_spec_claims(&["exp", "nbf", "sub"]);
        }

        tracing::debug!(
            algorithm = ?config.algorithm,
            access_ttl_secs = access.ttl.num_seconds(),
            refresh_ttl_secs = refresh.ttl.num_seconds(),
            "token manager configured"
        );

        Ok(Self {
            access,
            refresh,
            algorithm: config.algorithm,
            issuer: config.issuer,
            validation,
        })
    }

    pub fn access_ttl(&self) -> TimeDelta {
        self.access.ttl
    }

    pub fn refresh_ttl(&self) -> TimeDelta {
        self.refresh.ttl
    }

    pub fn generate_access_token(&self, user_id: &str, roles: Vec<Role>) -> AuthResult<String> {
        self.generate_access_token_at(user_id, roles, Utc::now())
    }

    pub fn generate_access_token_at(
        &self,
        user_id: &str,
        roles: Vec<Role>,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        self.sign(Claims::new(user_id, roles, TokenClass::Access, now, self.access.ttl)?)
    }

    /// Refresh tokens prove identity for renewal only and carry no roles.
    pub fn generate_refresh_token(&self, user_id: &str) -> AuthResult<String> {
        self.generate_refresh_token_at(user_id, Utc::now())
    }

    pub fn generate_refresh_token_at(&self, user_id: &str, now: DateTime<Utc>) -> AuthResult<String> {
        self.sign(Claims::new(user_id, Vec::new(), TokenClass::Refresh, now, self.refresh.ttl)?)
    }

    /// Issue an access token and a refresh token for the same subject.
    pub fn issue_pair(&self, user_id: &str, roles: Vec<Role>) -> AuthResult<TokenPair> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.generate_access_token_at(user_id, roles, now)?,
            refresh_token: self.generate_refresh_token_at(user_id, now)?,
            token_type: "Bearer",
            expires_in: self.access.ttl.num_seconds(),
        })
    }

    pub fn validate_access_token(&self, token: &str) -> AuthResult<Claims> {
        self.validate_at(token, TokenClass::Access, Utc::now())
    }

    pub fn validate_refresh_token(&self, token: &str) -> AuthResult<Claims> {
        self.validate_at(token, TokenClass::Refresh, Utc::now())
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    fn sign(&self, claims: Claims) -> AuthResult<String> {
        let claims = claims.with_issuer(self.issuer.clone());
        let keys = self.keys(claims.class);
        encode(&Header::new(self.algorithm), &claims, &keys.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl TokenValidator for TokenManager {
    fn validate_at(
        &self,
        token: &str,
        class: TokenClass,
        now: DateTime<Utc>,
    ) -> AuthResult<Claims> {
        let claims = decode::<Claims>(token, &self.keys(class).decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(%class, error = %e, "token rejected");
                AuthError::InvalidToken
            })?
            .claims;

        if claims.version != CLAIMS_SCHEMA_VERSION {
            tracing::debug!(%class, version = claims.version, "unsupported payload version");
            return Err(AuthError::InvalidToken);
        }
        if claims.class != class {
            tracing::debug!(expected = %class, presented = %claims.class, "token class mismatch");
            return Err(AuthError::InvalidToken);
        }
        claims.check_window(now)?;

        Ok(claims)
    }
}

impl core::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
