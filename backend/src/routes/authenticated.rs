use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any signed-in user. The `auth_middleware` layer placed on this router
/// guarantees a resolved `AuthUser`, which handlers then use for owner-or-admin checks
/// (e.g. in `update_post` and `delete_user`). Mounted under `/api`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        // POST /logout
        // Revokes only the token used for this request.
        .route("/logout", post(handlers::auth::logout))
        // POST /logout/all
        // Revokes every token of the current user.
        .route("/logout/all", post(handlers::auth::logout_all))
        // GET /me
        .route("/me", get(handlers::auth::me))
        // --- Posts ---
        // POST /posts
        // The owner is the requesting user. The slug is derived from the title when absent.
        .route("/posts", post(handlers::posts::create_post))
        // PUT/DELETE /posts/{id}
        // **Owner or admin** only.
        .route(
            "/posts/{id}",
            put(handlers::posts::update_post).delete(handlers::posts::delete_post),
        )
        // --- Users ---
        // GET/PUT/DELETE /users/{id}
        // The user themself or an admin. Toggling `is_admin` is admin-only.
        .route(
            "/users/{id}",
            get(handlers::users::show_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
}
