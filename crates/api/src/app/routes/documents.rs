//! Document endpoints, each guarded by a `document:<action>` permission.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};

use gatehouse_auth::RequestIdentity;

use crate::app::{errors, services::AppServices};
use crate::authz;

pub const RESOURCE: &str = "document";

#[derive(Debug, Deserialize)]
pub struct PutDocumentRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub body: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_documents))
        .route(
            "/:id",
            get(get_document).put(put_document).delete(delete_document),
        )
}

pub async fn list_documents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&services.rbac, &identity, RESOURCE, "list") {
        return errors::forbidden(e);
    }

    let ids = services.documents.ids();
    (StatusCode::OK, Json(serde_json::json!({ "documents": ids }))).into_response()
}

pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&services.rbac, &identity, RESOURCE, "read") {
        return errors::forbidden(e);
    }

    match services.documents.get(&id) {
        Some(body) => (StatusCode::OK, Json(DocumentResponse { id, body })).into_response(),
        None => errors::not_found("document"),
    }
}

pub async fn put_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    Json(req): Json<PutDocumentRequest>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&services.rbac, &identity, RESOURCE, "write") {
        return errors::forbidden(e);
    }

    let created = services.documents.put(id.clone(), req.body);
    tracing::info!(document_id = %id, user_id = %identity.user_id, created, "document stored");

    if created {
        StatusCode::CREATED.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

pub async fn delete_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&services.rbac, &identity, RESOURCE, "delete") {
        return errors::forbidden(e);
    }

    if services.documents.remove(&id) {
        tracing::info!(document_id = %id, user_id = %identity.user_id, "document deleted");
        StatusCode::NO_CONTENT.into_response()
    } else {
        errors::not_found("document")
    }
}
