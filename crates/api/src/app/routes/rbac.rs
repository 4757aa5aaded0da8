//! RBAC audit endpoints: "why was this request allowed or denied?"

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use gatehouse_auth::RequestIdentity;

use crate::app::{errors, services::AppServices};
use crate::authz;

/// Resource whose `read` action guards the role listing endpoints.
const AUDIT_RESOURCE: &str = "rbac";

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub resource: String,
    pub action: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/explain", get(explain))
        .route("/roles", get(list_roles))
        .route("/roles/:name", get(get_role))
}

/// GET /rbac/explain?resource=..&action=.. - explain the caller's own access.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Query(query): Query<ExplainQuery>,
) -> axum::response::Response {
    let explanation = services
        .rbac
        .explain(&identity.roles, &query.resource, &query.action);

    (StatusCode::OK, Json(explanation)).into_response()
}

/// GET /rbac/roles - list registered roles.
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&services.rbac, &identity, AUDIT_RESOURCE, "read") {
        return errors::forbidden(e);
    }

    let roles = services.rbac.roles();
    (StatusCode::OK, Json(serde_json::json!({ "roles": roles }))).into_response()
}

/// GET /rbac/roles/:name - parents, direct and effective grants of one role.
pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(name): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&services.rbac, &identity, AUDIT_RESOURCE, "read") {
        return errors::forbidden(e);
    }

    let (Some(parents), Some(permissions)) =
        (services.rbac.parents(&name), services.rbac.permissions(&name))
    else {
        return errors::not_found("role");
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "name": name,
            "parents": parents,
            "permissions": permissions,
            "effective_permissions": services.rbac.effective_permissions(&name),
        })),
    )
        .into_response()
}
