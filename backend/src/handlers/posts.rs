use axum::{
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    authz::authorize_owner,
    error::AppError,
    extract::{PathParam, QueryParams, ValidatedJson},
    models::{CreatePostRequest, ListQuery, UpdatePostRequest},
    resources::{PaginatedCollection, PostResource},
    response::ApiResponse,
};

/// list_posts
///
/// [Public Route] Lists posts page by page (15 per page unless `per_page` is given).
/// Pagination metadata is returned in the envelope's `meta` key.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(ListQuery),
    responses(
        (status = 200, description = "A page of posts", body = [PostResource]),
        (status = 422, description = "Invalid pagination parameters")
    ),
    tag = "posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<ApiResponse, AppError> {
    let page = state.posts.list(query.page, query.per_page).await?;
    ApiResponse::resource(
        StatusCode::OK,
        "Posts retrieved successfully.",
        PaginatedCollection::from_page(&page, |post| PostResource::from(post)),
    )
}

/// show_post
///
/// [Public Route] Retrieves a single post by id.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostResource),
        (status = 404, description = "Not Found")
    ),
    tag = "posts"
)]
pub async fn show_post(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<ApiResponse, AppError> {
    let post = state.posts.find(id).await?;
    ApiResponse::resource(StatusCode::OK, "Post retrieved successfully.", PostResource::from(&post))
}

/// create_post
///
/// [Authenticated Route] Creates a post owned by the requesting user.
/// The owner is always taken from the token, never from the payload.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = PostResource),
        (status = 401, description = "Unauthenticated"),
        (status = 422, description = "Validation failed")
    ),
    tag = "posts"
)]
pub async fn create_post(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> Result<ApiResponse, AppError> {
    let post = state.posts.create(&principal, payload.into()).await?;
    ApiResponse::resource(StatusCode::CREATED, "Post created successfully.", PostResource::from(&post))
}

/// update_post
///
/// [Authenticated Route] Partially updates a post.
///
/// *Authorization*: owner or admin; anyone else gets 403.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = PostResource),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "posts"
)]
pub async fn update_post(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePostRequest>,
) -> Result<ApiResponse, AppError> {
    let post = state.posts.find(id).await?;
    authorize_owner(&principal, post.user_id)?;

    let updated = state.posts.update(&post, payload.into()).await?;
    ApiResponse::resource(StatusCode::OK, "Post updated successfully.", PostResource::from(&updated))
}

/// delete_post
///
/// [Authenticated Route] Deletes a post.
///
/// *Authorization*: owner or admin; anyone else gets 403.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    ),
    tag = "posts"
)]
pub async fn delete_post(
    AuthUser { principal, .. }: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<ApiResponse, AppError> {
    let post = state.posts.find(id).await?;
    authorize_owner(&principal, post.user_id)?;

    // A concurrent delete between find and delete still ends with the post gone.
    if !state.posts.delete(&post).await? {
        return Err(AppError::NotFound("Post"));
    }
    Ok(ApiResponse::message(StatusCode::OK, "Post deleted successfully."))
}
