use axum::{Router, routing::get};

pub mod documents;
pub mod rbac;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/documents", documents::router())
        .nest("/rbac", rbac::router())
}
