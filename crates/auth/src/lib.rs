//! `gatehouse-auth`: signed token lifecycle and role-hierarchy authorization.
//!
//! This crate is decoupled from any transport: adapters extract a bearer
//! token, call [`TokenValidator::validate`], then ask
//! [`RbacRegistry::is_allowed`] before running protected logic.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod identity;
pub mod permissions;
pub mod policy;
pub mod rbac;
pub mod roles;
pub mod tokens;

pub use authorize::{AuthorizationExplanation, Grant};
pub use claims::{CLAIMS_SCHEMA_VERSION, Claims, TokenClass};
pub use error::{AuthError, AuthResult};
pub use identity::RequestIdentity;
pub use permissions::{Permission, WILDCARD_ACTION};
pub use policy::{RbacPolicy, RoleSpec};
pub use rbac::RbacRegistry;
pub use roles::Role;
pub use tokens::{
    DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, MAX_TOKEN_TTL, TokenConfig, TokenManager, TokenPair,
    TokenValidator,
};

pub use jsonwebtoken::Algorithm;
