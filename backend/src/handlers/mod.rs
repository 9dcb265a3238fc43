//! Controllers: resolve the principal, authorize, call a service, present the result.
//! Handlers never touch a repository directly.

pub mod auth;
pub mod posts;
pub mod users;

use axum::http::StatusCode;

use crate::response::ApiResponse;

/// health
///
/// [Public Route] Liveness probe for load balancers and monitoring.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> ApiResponse {
    ApiResponse::message(StatusCode::OK, "ok")
}

/// not_found
///
/// Router fallback for paths no route matches.
pub async fn not_found() -> ApiResponse {
    ApiResponse::failure(StatusCode::NOT_FOUND, "Not Found", None)
}

/// method_not_allowed
///
/// Answers a known path called with a method it does not serve. Installed on the
/// merged `/api` router so it runs ahead of the auth layer.
pub async fn method_not_allowed() -> ApiResponse {
    ApiResponse::failure(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed", None)
}
