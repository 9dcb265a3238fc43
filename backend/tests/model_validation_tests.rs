use axum::{http::StatusCode, response::IntoResponse};
use chrono::Utc;
use quill_api::{
    AppError, ApiResponse,
    auth::Principal,
    models::{CreatePostRequest, RegisterRequest, UpdatePostRequest, UpdateUserRequest, User},
    resources::{PaginatedCollection, PostResource, UserResource},
    repository::{Page, PageRequest},
};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        name: "Linus".to_string(),
        email: "linus@example.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        is_admin: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn viewer(id: Uuid, is_admin: bool) -> Principal {
    Principal {
        id,
        name: "Viewer".to_string(),
        email: "viewer@example.com".to_string(),
        is_admin,
    }
}

// --- Resources ---

#[test]
fn test_user_resource_never_contains_password_hash() {
    let user = sample_user();

    let json_output = serde_json::to_string(&UserResource::new(&user)).unwrap();

    assert!(!json_output.contains("password"));
    assert!(!json_output.contains(&user.password_hash));
    assert!(json_output.contains(r#""email":"linus@example.com""#));
}

#[test]
fn test_user_debug_redacts_password_hash() {
    let user = sample_user();
    let debug_output = format!("{:?}", user);

    assert!(!debug_output.contains(&user.password_hash));
    assert!(debug_output.contains("linus@example.com"));
}

#[test]
fn test_user_resource_hides_email_from_strangers() {
    let user = sample_user();

    let as_stranger = serde_json::to_value(UserResource::for_viewer(&user, &viewer(Uuid::new_v4(), false))).unwrap();
    assert!(as_stranger.get("email").is_none());

    let as_self = UserResource::for_viewer(&user, &viewer(user.id, false));
    assert_eq!(as_self.email.as_deref(), Some("linus@example.com"));

    let as_admin = UserResource::for_viewer(&user, &viewer(Uuid::new_v4(), true));
    assert_eq!(as_admin.email.as_deref(), Some("linus@example.com"));
}

#[test]
fn test_paginated_collection_serializes_as_array_with_meta() {
    let request = PageRequest::new(2, 2).unwrap();
    let page = Page::new(vec![1u32, 2], request, 5);

    let collection = PaginatedCollection::from_page(&page, |n| n * 10);
    let response = ApiResponse::resource(StatusCode::OK, "ok", collection).unwrap();
    let envelope = serde_json::to_value(&response).unwrap();

    assert_eq!(envelope["data"], json!([10, 20]));
    assert_eq!(
        envelope["meta"],
        json!({ "current_page": 2, "per_page": 2, "total": 5, "last_page": 3 })
    );
}

// --- Envelope ---

#[test]
fn test_envelope_always_has_four_keys() {
    let envelope = serde_json::to_value(ApiResponse::message(StatusCode::OK, "Done.")).unwrap();
    let object = envelope.as_object().unwrap();

    for key in ["success", "message", "data", "errors"] {
        assert!(object.contains_key(key), "missing `{}`", key);
    }
    assert_eq!(envelope["data"], Value::Null);
    assert_eq!(envelope["errors"], Value::Null);
}

#[test]
fn test_post_resource_envelope_shape() {
    let post = quill_api::models::Post {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        title: "Title".to_string(),
        slug: "title".to_string(),
        body: "Body".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let response = ApiResponse::resource(StatusCode::CREATED, "Created.", PostResource::from(&post)).unwrap();
    assert_eq!(response.status, StatusCode::CREATED);

    let envelope = serde_json::to_value(&response).unwrap();
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["data"]["author_id"], post.user_id.to_string());
    assert!(envelope.get("meta").is_none());
    // The HTTP status is not part of the body.
    assert!(envelope.get("status").is_none());
}

#[test]
fn test_error_statuses() {
    assert_eq!(AppError::invalid("title", "x").status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(AppError::NotFound("Post").status(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Unauthenticated("no").status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden("no").status(), StatusCode::FORBIDDEN);
    assert_eq!(
        AppError::Internal("boom".to_string()).into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// --- Validation ---

#[test]
fn test_create_post_request_requires_title_and_body() {
    let err: AppError = CreatePostRequest::default().validate().unwrap_err().into();

    match err {
        AppError::Validation(fields) => {
            assert_eq!(fields["title"], vec!["The title field is required.".to_string()]);
            assert!(fields.contains_key("body"));
            assert!(!fields.contains_key("slug"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_create_post_request_accepts_missing_slug() {
    let request: CreatePostRequest =
        serde_json::from_value(json!({ "title": "Hi", "body": "There" })).unwrap();

    assert!(request.validate().is_ok());
    assert_eq!(request.slug, None);
}

#[test]
fn test_register_request_checks_email_and_password_length() {
    let request = RegisterRequest {
        name: Some("N".to_string()),
        email: Some("not-an-email".to_string()),
        password: Some("short".to_string()),
        password_confirmation: Some("short".to_string()),
    };

    let errors = request.validate().unwrap_err();
    let fields = errors.field_errors();
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("password"));
    assert!(request.check_confirmation().is_ok());
}

#[test]
fn test_update_requests_omit_absent_fields() {
    let partial = UpdatePostRequest {
        title: Some("New Title Only".to_string()),
        ..Default::default()
    };

    let json_output = serde_json::to_string(&partial).unwrap();
    assert!(json_output.contains(r#""title":"New Title Only""#));
    assert!(!json_output.contains("slug"));
    assert!(!json_output.contains("body"));

    let empty = UpdateUserRequest::default();
    assert!(empty.validate().is_ok());
    assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
}
