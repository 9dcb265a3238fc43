use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// User management endpoints for administrators. The router sits behind the
/// authentication layer; the `is_admin` check is performed inside each handler
/// (`require_admin`), so a valid token without admin rights gets a 403 rather than a 401.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /users
        // Lists every account, paginated.
        // POST /users
        // Creates an account, optionally with `is_admin=true`.
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
}
