use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppError, repository::Entity};

// --- Core Entities (Mapped to Database) ---

/// Post
///
/// A record from the `posts` table. `slug` is derived from `title` when the post is
/// created without one and is never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Default)]
pub struct Post {
    pub id: Uuid,
    // FK to users.id (Owner).
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for inserting a new post. Every value is final; derivations already happened.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
}

/// Explicit partial update for a post. `None` leaves the column untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
}

impl Entity for Post {
    type Draft = PostDraft;
    type Patch = PostPatch;

    const NAME: &'static str = "Post";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(id: Uuid, draft: PostDraft, now: DateTime<Utc>) -> Self {
        Post {
            id,
            user_id: draft.user_id,
            title: draft.title,
            slug: draft.slug,
            body: draft.body,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: PostPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        self.updated_at = now;
    }

    // Mirrors the partial unique index: empty slugs are exempt.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        if self.slug.is_empty() {
            Vec::new()
        } else {
            vec![("slug", self.slug.clone())]
        }
    }
}

/// User
///
/// A record from the `users` table. The argon2 `password_hash` belongs to the auth
/// layer only: this type is not `Serialize`, and its `Debug` output
/// redacts the hash. Use `UserResource` to present a user.
#[derive(Clone, PartialEq, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    // The RBAC flag used for admin overrides.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}

impl Entity for User {
    type Draft = UserDraft;
    type Patch = UserPatch;

    const NAME: &'static str = "User";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_draft(id: Uuid, draft: UserDraft, now: DateTime<Utc>) -> Self {
        User {
            id,
            name: draft.name,
            email: draft.email,
            password_hash: draft.password_hash,
            is_admin: draft.is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: UserPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password_hash) = patch.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(is_admin) = patch.is_admin {
            self.is_admin = is_admin;
        }
        self.updated_at = now;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }
}

/// Emails are compared exactly by persistence, so they are canonicalised on the way in.
pub fn canonical_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// --- Request Payloads (Input Schemas) ---
//
// Required fields are `Option`s guarded by `#[validate(required)]` so a missing key is
// reported against its field (422) instead of as a generic deserialization failure.

/// CreatePostRequest
///
/// Input payload for POST /api/posts. Omitting `slug` (or sending null) derives it from
/// the title; sending an empty string stores an empty slug.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    #[validate(
        required(message = "The title field is required."),
        length(min = 1, max = 255, message = "The title must be between 1 and 255 characters.")
    )]
    pub title: Option<String>,

    #[validate(length(max = 255, message = "The slug may not be greater than 255 characters."))]
    pub slug: Option<String>,

    #[validate(
        required(message = "The body field is required."),
        length(min = 1, message = "The body field is required.")
    )]
    pub body: Option<String>,
}

/// UpdatePostRequest
///
/// Partial update payload for PUT /api/posts/{id}. Only supplied keys are changed;
/// a new title does not regenerate the slug.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "The title must be between 1 and 255 characters."))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "The slug may not be greater than 255 characters."))]
    pub slug: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "The body field may not be empty."))]
    pub body: Option<String>,
}

impl From<UpdatePostRequest> for PostPatch {
    fn from(req: UpdatePostRequest) -> Self {
        PostPatch {
            title: req.title,
            slug: req.slug,
            body: req.body,
        }
    }
}

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /api/register).
/// The password is hashed before it reaches persistence and is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    #[validate(
        required(message = "The name field is required."),
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "The password field is required."),
        length(min = 8, message = "The password must be at least 8 characters.")
    )]
    pub password: Option<String>,

    pub password_confirmation: Option<String>,
}

impl RegisterRequest {
    /// The `confirmed` rule: `password_confirmation` must repeat `password` exactly.
    pub fn check_confirmation(&self) -> Result<(), AppError> {
        if self.password == self.password_confirmation {
            Ok(())
        } else {
            Err(AppError::invalid(
                "password",
                "The password confirmation does not match.",
            ))
        }
    }
}

/// LoginRequest
///
/// Input payload for POST /api/login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

/// CreateUserRequest
///
/// Admin-only payload for POST /api/users. Unlike registration, it may grant `is_admin`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "The name field is required."),
        length(min = 1, max = 255, message = "The name must be between 1 and 255 characters.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "The password field is required."),
        length(min = 8, message = "The password must be at least 8 characters.")
    )]
    pub password: Option<String>,

    pub is_admin: Option<bool>,
}

/// UpdateUserRequest
///
/// Partial update payload for PUT /api/users/{id}. `is_admin` may only be supplied by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "The password must be at least 8 characters."))]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

/// ListQuery
///
/// Query parameters accepted by the paginated listing endpoints.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Page size. Defaults to 15, at most 100.
    pub per_page: Option<u32>,
}
