use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are **unauthenticated**: the sign-in gateway and read-only access
/// to posts. Mounted under `/api`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /register
        // Self-registration. Always creates a non-admin account and returns a token.
        .route("/register", post(handlers::auth::register))
        // POST /login
        // Exchanges credentials for a bearer token.
        .route("/login", post(handlers::auth::login))
        // GET /posts?page=...&per_page=...
        // Paginated post listing, 15 per page by default.
        .route("/posts", get(handlers::posts::list_posts))
        // GET /posts/{id}
        .route("/posts/{id}", get(handlers::posts::show_post))
}
