use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain, persistence and auth.
pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod slug;

// Service layer and HTTP presentation.
pub mod extract;
pub mod handlers;
pub mod resources;
pub mod response;
pub mod services;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::{AuthGateway, AuthState, JwtAuthGateway};
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{RepositoryState, Stores};
pub use response::ApiResponse;
pub use services::{AuthService, PostService, UserService};

/// ApiDoc
///
/// The OpenAPI document aggregated from every `#[utoipa::path]` handler and
/// `ToSchema` type. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::auth::register, handlers::auth::login, handlers::auth::logout,
        handlers::auth::logout_all, handlers::auth::me,
        handlers::posts::list_posts, handlers::posts::show_post, handlers::posts::create_post,
        handlers::posts::update_post, handlers::posts::delete_post,
        handlers::users::list_users, handlers::users::create_user, handlers::users::show_user,
        handlers::users::update_user, handlers::users::delete_user,
    ),
    components(
        schemas(
            models::CreatePostRequest, models::UpdatePostRequest, models::RegisterRequest,
            models::LoginRequest, models::CreateUserRequest, models::UpdateUserRequest,
            resources::PostResource, resources::UserResource, resources::TokenResource,
            repository::PageMeta,
        )
    ),
    tags(
        (name = "posts", description = "Blog posts"),
        (name = "users", description = "Account management"),
        (name = "auth", description = "Token-based sign in"),
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration handed to every handler.
/// Handlers only see services; repositories stay behind them.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: UserService,
    pub auth: AuthService,
    /// Token resolver used by the `AuthUser` extractor.
    pub gateway: AuthState,
    pub config: AppConfig,
}

impl AppState {
    /// Wires services over `stores`, with a JWT gateway configured from `config`.
    pub fn new(stores: Stores, config: AppConfig) -> Self {
        let gateway: AuthState = Arc::new(JwtAuthGateway::new(
            &config.jwt_secret,
            config.token_ttl(),
            stores.tokens.clone(),
            stores.users.clone(),
        ));
        Self::with_gateway(stores, gateway, config)
    }

    /// Same as `new`, but with a caller-supplied gateway.
    pub fn with_gateway(stores: Stores, gateway: AuthState, config: AppConfig) -> Self {
        let users = UserService::new(stores.users, stores.directory);

        Self {
            posts: PostService::new(stores.posts),
            auth: AuthService::new(users.clone(), gateway.clone()),
            users,
            gateway,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AuthState {
    fn from_ref(app_state: &AppState) -> AuthState {
        app_state.gateway.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the routers it is layered on. The `AuthUser` extractor
/// rejects with a 401 envelope before the handler runs if the token is missing,
/// malformed, expired or revoked.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies the scoped auth layers and the global
/// observability stack, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. API Router Assembly (mounted under /api)
    let api = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Replaces the 405 fallbacks that `route_layer` wrapped in the auth check, so a
        // wrong method is reported as such even without a token.
        .method_not_allowed_fallback(handlers::method_not_allowed);

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id` set above, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
