use axum::{extract::State, http::StatusCode};
use serde_json::json;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    extract::ValidatedJson,
    models::{LoginRequest, RegisterRequest},
    resources::{TokenResource, UserResource},
    response::ApiResponse,
};

/// register
///
/// [Public Route] Creates a regular (non-admin) account and signs it in.
/// The response carries the bearer token alongside the new user.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = TokenResource),
        (status = 422, description = "Validation failed or email taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse, AppError> {
    payload.check_confirmation()?;

    let (user, token) = state.auth.register(payload.into()).await?;
    ApiResponse::resource(
        StatusCode::CREATED,
        "User registered successfully.",
        TokenResource::new(token, &user),
    )
}

/// login
///
/// [Public Route] Exchanges email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResource),
        (status = 422, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse, AppError> {
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let (user, token) = state.auth.login(&email, &password).await?;
    ApiResponse::resource(StatusCode::OK, "Login successful.", TokenResource::new(token, &user))
}

/// logout
///
/// [Authenticated Route] Revokes the token this request was made with.
/// Other sessions of the same user stay valid.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "Unauthenticated")
    ),
    tag = "auth"
)]
pub async fn logout(session: AuthUser, State(state): State<AppState>) -> Result<ApiResponse, AppError> {
    state.auth.logout(&session).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Logged out successfully."))
}

/// logout_all
///
/// [Authenticated Route] Revokes every token held by the requesting user.
#[utoipa::path(
    post,
    path = "/api/logout/all",
    responses(
        (status = 200, description = "All sessions signed out"),
        (status = 401, description = "Unauthenticated")
    ),
    tag = "auth"
)]
pub async fn logout_all(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse, AppError> {
    let revoked = state.auth.logout_all(&principal).await?;
    let mut response = ApiResponse::message(StatusCode::OK, "Logged out of all sessions.");
    response.data = Some(json!({ "revoked": revoked }));
    Ok(response)
}

/// me
///
/// [Authenticated Route] Returns the signed-in user.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = UserResource),
        (status = 401, description = "Unauthenticated")
    ),
    tag = "auth"
)]
pub async fn me(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse, AppError> {
    let user = state.users.find(principal.id).await?;
    ApiResponse::resource(StatusCode::OK, "User retrieved successfully.", UserResource::new(&user))
}
