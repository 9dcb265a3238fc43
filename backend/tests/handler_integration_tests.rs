use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use quill_api::{
    AppConfig, AppError, AppState, ApiResponse,
    auth::{AuthUser, Principal},
    extract::{PathParam, QueryParams, ValidatedJson},
    handlers,
    models::{CreatePostRequest, CreateUserRequest, ListQuery, Post, RegisterRequest, UpdatePostRequest, UpdateUserRequest},
    repository::Stores,
    services::{NewPost, NewUser},
};
use serde_json::Value;
use tokio::test;
use uuid::Uuid;

// --- Test State & Identities ---

fn create_test_state() -> AppState {
    AppState::new(Stores::in_memory(), AppConfig::default())
}

async fn make_user(state: &AppState, email: &str, is_admin: bool) -> AuthUser {
    let user = state
        .users
        .create(NewUser {
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            is_admin,
        })
        .await
        .unwrap();

    AuthUser {
        principal: Principal::from(&user),
        token_id: Uuid::new_v4(),
    }
}

async fn regular_user(state: &AppState) -> AuthUser {
    make_user(state, "member@test.com", false).await
}

async fn admin_user(state: &AppState) -> AuthUser {
    make_user(state, "admin@test.com", true).await
}

async fn seed_post(state: &AppState, owner: &AuthUser, title: &str) -> Post {
    state
        .posts
        .create(
            &owner.principal,
            NewPost {
                title: title.to_string(),
                slug: None,
                body: "Seed body".to_string(),
            },
        )
        .await
        .unwrap()
}

/// Renders a handler result into (status, envelope JSON).
async fn render(result: Result<ApiResponse, AppError>) -> (StatusCode, Value) {
    let response = result.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// --- Posts ---

#[test]
async fn test_create_post_success() {
    let state = create_test_state();
    let author = regular_user(&state).await;

    let payload = CreatePostRequest {
        title: Some("Hello World".to_string()),
        slug: None,
        body: Some("First!".to_string()),
    };
    let (status, body) = render(
        handlers::posts::create_post(author.clone(), State(state), ValidatedJson(payload)).await,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["slug"], "hello-world");
    assert_eq!(body["data"]["author_id"], author.principal.id.to_string());
    assert!(body["errors"].is_null());
}

#[test]
async fn test_show_post_not_found() {
    let state = create_test_state();

    let (status, body) =
        render(handlers::posts::show_post(State(state), PathParam(Uuid::new_v4())).await).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Post not found.");
    assert!(body["data"].is_null());
}

#[test]
async fn test_update_post_forbidden_for_non_owner() {
    let state = create_test_state();
    let owner = regular_user(&state).await;
    let intruder = make_user(&state, "intruder@test.com", false).await;
    let post = seed_post(&state, &owner, "Mine").await;

    let payload = UpdatePostRequest {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let (status, body) = render(
        handlers::posts::update_post(intruder, State(state.clone()), PathParam(post.id), ValidatedJson(payload))
            .await,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    // Nothing changed.
    assert_eq!(state.posts.find(post.id).await.unwrap().title, "Mine");
}

#[test]
async fn test_update_post_by_owner_returns_reloaded_post() {
    let state = create_test_state();
    let owner = regular_user(&state).await;
    let post = seed_post(&state, &owner, "Draft").await;

    let payload = UpdatePostRequest {
        body: Some("Final body".to_string()),
        ..Default::default()
    };
    let (status, body) = render(
        handlers::posts::update_post(owner, State(state), PathParam(post.id), ValidatedJson(payload)).await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Draft");
    assert_eq!(body["data"]["body"], "Final body");
    assert_eq!(body["data"]["slug"], "draft");
}

#[test]
async fn test_admin_can_delete_any_post() {
    let state = create_test_state();
    let owner = regular_user(&state).await;
    let admin = admin_user(&state).await;
    let post = seed_post(&state, &owner, "Moderated").await;

    let (status, body) =
        render(handlers::posts::delete_post(admin.clone(), State(state.clone()), PathParam(post.id)).await).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    // The post is gone: a second delete is a 404.
    let (status, _) = render(handlers::posts::delete_post(admin, State(state), PathParam(post.id)).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
async fn test_delete_post_forbidden_for_non_owner() {
    let state = create_test_state();
    let owner = regular_user(&state).await;
    let intruder = make_user(&state, "intruder@test.com", false).await;
    let post = seed_post(&state, &owner, "Keep me").await;

    let (status, _) =
        render(handlers::posts::delete_post(intruder, State(state.clone()), PathParam(post.id)).await).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(state.posts.find(post.id).await.is_ok());
}

#[test]
async fn test_list_posts_includes_meta() {
    let state = create_test_state();
    let owner = regular_user(&state).await;
    for i in 0..3 {
        seed_post(&state, &owner, &format!("Post {}", i)).await;
    }

    let query = ListQuery {
        page: Some(1),
        per_page: Some(2),
    };
    let (status, body) = render(handlers::posts::list_posts(State(state), QueryParams(query)).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["current_page"], 1);
    assert_eq!(body["meta"]["per_page"], 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["last_page"], 2);
}

// --- Auth ---

#[test]
async fn test_register_rejects_mismatched_confirmation() {
    let state = create_test_state();

    let payload = RegisterRequest {
        name: Some("Mismatch".to_string()),
        email: Some("mismatch@test.com".to_string()),
        password: Some("password123".to_string()),
        password_confirmation: Some("password124".to_string()),
    };
    let (status, body) =
        render(handlers::auth::register(State(state.clone()), ValidatedJson(payload)).await).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["password"].is_array());
    assert!(state.users.find_by_email("mismatch@test.com").await.unwrap().is_none());
}

#[test]
async fn test_register_returns_token_and_hides_hash() {
    let state = create_test_state();

    let payload = RegisterRequest {
        name: Some("New".to_string()),
        email: Some("new@test.com".to_string()),
        password: Some("password123".to_string()),
        password_confirmation: Some("password123".to_string()),
    };
    let (status, body) = render(handlers::auth::register(State(state), ValidatedJson(payload)).await).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["data"]["user"]["email"], "new@test.com");
    assert_eq!(body["data"]["user"]["is_admin"], false);
    assert!(body["data"]["user"].get("password_hash").is_none());
}

// --- Users ---

#[test]
async fn test_list_users_forbidden_for_non_admin() {
    let state = create_test_state();
    let member = regular_user(&state).await;

    let (status, _) =
        render(handlers::users::list_users(member, State(state), QueryParams(ListQuery::default())).await).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[test]
async fn test_list_users_success_for_admin() {
    let state = create_test_state();
    regular_user(&state).await;
    let admin = admin_user(&state).await;

    let (status, body) =
        render(handlers::users::list_users(admin, State(state), QueryParams(ListQuery::default())).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["per_page"], 15);
}

#[test]
async fn test_create_user_by_admin_can_grant_admin() {
    let state = create_test_state();
    let admin = admin_user(&state).await;

    let payload = CreateUserRequest {
        name: Some("Mod".to_string()),
        email: Some("mod@test.com".to_string()),
        password: Some("password123".to_string()),
        is_admin: Some(true),
    };
    let (status, body) =
        render(handlers::users::create_user(admin, State(state), ValidatedJson(payload)).await).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_admin"], true);
}

#[test]
async fn test_show_user_forbidden_for_other_user() {
    let state = create_test_state();
    let member = regular_user(&state).await;
    let other = make_user(&state, "other@test.com", false).await;

    let (status, _) =
        render(handlers::users::show_user(other, State(state), PathParam(member.principal.id)).await).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[test]
async fn test_user_cannot_promote_themself() {
    let state = create_test_state();
    let member = regular_user(&state).await;
    let id = member.principal.id;

    let payload = UpdateUserRequest {
        is_admin: Some(true),
        ..Default::default()
    };
    let (status, _) = render(
        handlers::users::update_user(member, State(state.clone()), PathParam(id), ValidatedJson(payload)).await,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!state.users.find(id).await.unwrap().is_admin);
}

#[test]
async fn test_user_can_rename_themself() {
    let state = create_test_state();
    let member = regular_user(&state).await;
    let id = member.principal.id;

    let payload = UpdateUserRequest {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let (status, body) = render(
        handlers::users::update_user(member, State(state), PathParam(id), ValidatedJson(payload)).await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");
    assert_eq!(body["data"]["email"], "member@test.com");
}

#[test]
async fn test_delete_user_by_self_removes_account() {
    let state = create_test_state();
    let member = regular_user(&state).await;
    let id = member.principal.id;

    let (status, _) = render(handlers::users::delete_user(member, State(state.clone()), PathParam(id)).await).await;

    assert_eq!(status, StatusCode::OK);
    assert!(matches!(state.users.find(id).await, Err(AppError::NotFound("User"))));
}
