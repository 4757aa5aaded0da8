use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use gatehouse_auth::RequestIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(identity): Extension<RequestIdentity>) -> impl IntoResponse {
    Json(identity)
}
