use axum::{
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    authz::{authorize_owner, require_admin},
    error::AppError,
    extract::{PathParam, QueryParams, ValidatedJson},
    models::{CreateUserRequest, ListQuery, UpdateUserRequest},
    resources::{PaginatedCollection, UserResource},
    response::ApiResponse,
};

/// list_users
///
/// [Admin Route] Lists all accounts page by page.
#[utoipa::path(
    get,
    path = "/api/users",
    params(ListQuery),
    responses(
        (status = 200, description = "A page of users", body = [UserResource]),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not Admin")
    ),
    tag = "users"
)]
pub async fn list_users(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<ApiResponse, AppError> {
    require_admin(&principal)?;

    let page = state.users.list(query.page, query.per_page).await?;
    ApiResponse::resource(
        StatusCode::OK,
        "Users retrieved successfully.",
        PaginatedCollection::from_page(&page, |user| UserResource::for_viewer(user, &principal)),
    )
}

/// create_user
///
/// [Admin Route] Creates an account, optionally with admin rights.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserResource),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not Admin"),
        (status = 422, description = "Validation failed or email taken")
    ),
    tag = "users"
)]
pub async fn create_user(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<ApiResponse, AppError> {
    require_admin(&principal)?;

    let user = state.users.create(payload.into()).await?;
    ApiResponse::resource(StatusCode::CREATED, "User created successfully.", UserResource::new(&user))
}

/// show_user
///
/// [Authenticated Route] Retrieves a single account.
///
/// *Authorization*: the user themself or an admin.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserResource),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    tag = "users"
)]
pub async fn show_user(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<ApiResponse, AppError> {
    let user = state.users.find(id).await?;
    authorize_owner(&principal, user.id)?;

    ApiResponse::resource(
        StatusCode::OK,
        "User retrieved successfully.",
        UserResource::for_viewer(&user, &principal),
    )
}

/// update_user
///
/// [Authenticated Route] Partially updates an account.
///
/// *Authorization*: the user themself or an admin. Changing `is_admin` is admin-only,
/// so users cannot promote themselves.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResource),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Validation failed or email taken")
    ),
    tag = "users"
)]
pub async fn update_user(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<ApiResponse, AppError> {
    let user = state.users.find(id).await?;
    authorize_owner(&principal, user.id)?;
    if payload.is_admin.is_some() {
        require_admin(&principal)?;
    }

    let updated = state.users.update(&user, payload.into()).await?;
    ApiResponse::resource(
        StatusCode::OK,
        "User updated successfully.",
        UserResource::for_viewer(&updated, &principal),
    )
}

/// delete_user
///
/// [Authenticated Route] Deletes an account together with its posts and tokens.
///
/// *Authorization*: the user themself or an admin.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<ApiResponse, AppError> {
    let user = state.users.find(id).await?;
    authorize_owner(&principal, user.id)?;

    state.gateway.revoke_all(user.id).await?;
    if !state.users.delete(&user).await? {
        return Err(AppError::NotFound("User"));
    }
    Ok(ApiResponse::message(StatusCode::OK, "User deleted successfully."))
}
