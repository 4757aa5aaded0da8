//! Process configuration, read from `GATEHOUSE_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use gatehouse_auth::{Algorithm, MAX_TOKEN_TTL, TokenConfig};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub tokens: TokenConfig,
    pub policy_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("GATEHOUSE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "GATEHOUSE_BIND_ADDR",
                reason: e.to_string(),
            })?;

        let access_secret =
            get("GATEHOUSE_ACCESS_SECRET").ok_or(ConfigError::Missing("GATEHOUSE_ACCESS_SECRET"))?;
        let refresh_secret =
            get("GATEHOUSE_REFRESH_SECRET").ok_or(ConfigError::Missing("GATEHOUSE_REFRESH_SECRET"))?;

        let mut tokens = TokenConfig::new(access_secret, refresh_secret);

        if let Some(ttl) = get("GATEHOUSE_ACCESS_TTL_SECS") {
            tokens = tokens.with_access_ttl(parse_ttl("GATEHOUSE_ACCESS_TTL_SECS", &ttl)?);
        }
        if let Some(ttl) = get("GATEHOUSE_REFRESH_TTL_SECS") {
            tokens = tokens.with_refresh_ttl(parse_ttl("GATEHOUSE_REFRESH_TTL_SECS", &ttl)?);
        }
        if let Some(alg) = get("GATEHOUSE_TOKEN_ALGORITHM") {
            tokens = tokens.with_algorithm(parse_algorithm(&alg)?);
        }
        if let Some(issuer) = get("GATEHOUSE_ISSUER") {
            tokens = tokens.with_issuer(issuer);
        }

        let policy_path = get("GATEHOUSE_POLICY_PATH").map(PathBuf::from);

        Ok(Self {
            bind_addr,
            tokens,
            policy_path,
        })
    }
}

fn parse_ttl(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;

    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    if secs > MAX_TOKEN_TTL.as_secs() {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must not exceed {}", MAX_TOKEN_TTL.as_secs()),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::Invalid {
            key: "GATEHOUSE_TOKEN_ALGORITHM",
            reason: format!("unsupported algorithm '{other}' (expected HS256, HS384 or HS512)"),
        }),
    }
}
