use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use gatehouse_auth::{AuthError, RequestIdentity, TokenClass, TokenValidator};

use crate::app::errors::json_error;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenValidator>,
}

/// Authentication failure surfaced to the client as `401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthenticated {
    MissingCredentials,
    InvalidToken,
    TokenExpired,
}

impl Unauthenticated {
    fn message(self) -> &'static str {
        match self {
            Unauthenticated::MissingCredentials => "missing bearer token",
            Unauthenticated::InvalidToken => "invalid token",
            Unauthenticated::TokenExpired => "token expired",
        }
    }
}

impl From<AuthError> for Unauthenticated {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => Unauthenticated::TokenExpired,
            _ => Unauthenticated::InvalidToken,
        }
    }
}

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        json_error(
            axum::http::StatusCode::UNAUTHORIZED,
            "unauthorized",
            self.message(),
        )
    }
}

/// Validate the bearer access token and attach the caller's
/// [`RequestIdentity`] to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Unauthenticated> {
    let token = extract_bearer(req.headers())?;

    let claims = state.tokens.validate(token, TokenClass::Access).map_err(|e| {
        tracing::debug!(error = %e, "access token rejected");
        Unauthenticated::from(e)
    })?;

    let identity = RequestIdentity::from_claims(claims);
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::now_v7(),
        user_id = %identity.user_id
    );
    req.extensions_mut().insert(identity);

    Ok(next.run(req).instrument(span).await)
}

/// Raw token from `Authorization: Bearer <token>`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, Unauthenticated> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(Unauthenticated::MissingCredentials)?;

    let header = header
        .to_str()
        .map_err(|_| Unauthenticated::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(Unauthenticated::MissingCredentials)?
        .trim();

    if token.is_empty() {
        return Err(Unauthenticated::MissingCredentials);
    }

    Ok(token)
}
