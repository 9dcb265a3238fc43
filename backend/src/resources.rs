use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{IssuedToken, Principal},
    models::{Post, User},
    repository::{Page, PageMeta},
};

/// Resource
///
/// A presenter: a pure mapping from an entity (plus optional viewer context) to the
/// JSON shape clients see. Resources must never expose internal-only fields such as
/// credential hashes.
///
/// `with()` returns extra top-level keys to place next to `data` in the envelope.
pub trait Resource: Serialize {
    fn with(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// PostResource
///
/// Public shape of a post. The owner is exposed as `author_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PostResource {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Post> for PostResource {
    fn from(post: &Post) -> Self {
        PostResource {
            id: post.id,
            author_id: post.user_id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            body: post.body.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl Resource for PostResource {}

/// UserResource
///
/// Public shape of a user. `password_hash` has no counterpart here. The email is only
/// included when the viewer is the user themself or an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResource {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_admin: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl UserResource {
    /// Presents a user to themself (registration, login, `/me`).
    pub fn new(user: &User) -> Self {
        UserResource {
            id: user.id,
            name: user.name.clone(),
            email: Some(user.email.clone()),
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    /// Presents a user to an arbitrary viewer.
    pub fn for_viewer(user: &User, viewer: &Principal) -> Self {
        let mut resource = Self::new(user);
        if viewer.id != user.id && !viewer.is_admin {
            resource.email = None;
        }
        resource
    }
}

impl Resource for UserResource {}

/// TokenResource
///
/// Returned by registration and login: the bearer token and the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResource {
    pub access_token: String,
    pub token_type: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
    pub user: UserResource,
}

impl TokenResource {
    pub fn new(token: IssuedToken, user: &User) -> Self {
        TokenResource {
            access_token: token.token,
            token_type: "Bearer".to_string(),
            expires_at: token.expires_at,
            user: UserResource::new(user),
        }
    }
}

impl Resource for TokenResource {}

/// PaginatedCollection
///
/// A page of presented items. It serializes as a plain array (the envelope's `data`)
/// and contributes the pagination metadata as the envelope's `meta` key.
#[derive(Debug, Clone)]
pub struct PaginatedCollection<R> {
    pub items: Vec<R>,
    pub meta: PageMeta,
}

impl<R> PaginatedCollection<R> {
    pub fn from_page<T>(page: &Page<T>, present: impl FnMut(&T) -> R) -> Self {
        PaginatedCollection {
            items: page.items.iter().map(present).collect(),
            meta: page.meta(),
        }
    }
}

impl<R: Serialize> Serialize for PaginatedCollection<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<R: Serialize> Resource for PaginatedCollection<R> {
    fn with(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("meta".to_string(), json!(self.meta));
        extra
    }
}
