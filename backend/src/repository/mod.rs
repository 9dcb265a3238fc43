use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Post, User},
};

pub mod memory;
pub mod postgres;
pub mod tokens;

pub use memory::{InMemoryRepository, InMemoryUserRepository};
pub use postgres::{PostgresPostRepository, PostgresUserRepository};
pub use tokens::{InMemoryTokenStore, PostgresTokenStore, TokenRecord, TokenState, TokenStore};

/// Entity
///
/// A persisted domain record addressable by an opaque `Uuid`.
///
/// `Draft` is the complete field set for an insert and `Patch` the explicit partial
/// update. `from_draft`, `apply_patch` and `unique_keys` describe the row-level
/// behaviour that SQL gives the Postgres backend for free, so non-SQL backends
/// (the in-memory store) can reproduce it.
pub trait Entity: Clone + Send + Sync + 'static {
    type Draft: Send + 'static;
    type Patch: Send + 'static;

    /// Human readable entity name, used in `NotFound` messages.
    const NAME: &'static str;

    fn id(&self) -> Uuid;

    fn from_draft(id: Uuid, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// (field, value) pairs that must be unique across all rows of this entity.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Repository Trait
///
/// The persistence contract for a single entity type. Handlers never see it; services
/// hold it behind `RepositoryState<T>` so the backend (Postgres, in-memory) can be
/// swapped without touching business rules.
///
/// Errors are never swallowed here: a missing row is `AppError::NotFound`, a unique
/// constraint violation is `AppError::Validation` on the offending field.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Returns one page of rows ordered by `created_at, id`, plus pagination metadata.
    async fn paginate(&self, request: PageRequest) -> Result<Page<T>, AppError>;

    async fn create(&self, draft: T::Draft) -> Result<T, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<T, AppError>;

    /// Applies only the fields present in `patch`.
    async fn update(&self, id: Uuid, patch: T::Patch) -> Result<T, AppError>;

    /// Returns `true` if a row was removed. Deleting an absent id is `Ok(false)`, not an error.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// RepositoryState
///
/// The shared handle for a repository of `T`.
pub type RepositoryState<T> = Arc<dyn Repository<T>>;

/// UserDirectory
///
/// Credential lookup needed by the login flow; kept apart from the generic repository
/// contract because no other entity needs it.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by canonical (trimmed, lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

pub type DirectoryState = Arc<dyn UserDirectory>;

// --- Pagination ---

/// A validated page request. Pages are 1-based and `per_page` is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: u32, per_page: u32) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::invalid("page", "The page must be at least 1."));
        }
        if per_page == 0 || per_page > Self::MAX_PER_PAGE {
            return Err(AppError::invalid(
                "per_page",
                format!("The per page must be between 1 and {}.", Self::MAX_PER_PAGE),
            ));
        }
        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

/// PageMeta
///
/// Pagination metadata attached to list responses as the envelope's `meta` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
}

/// One page of entities plus the metadata needed to walk the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let per_page = u64::from(request.per_page);
        let last_page = total.div_ceil(per_page).max(1);

        Self {
            items,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        }
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta {
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

// --- Backend Wiring ---

/// Stores
///
/// The full set of persistence handles the application needs, built for one backend.
#[derive(Clone)]
pub struct Stores {
    pub posts: RepositoryState<Post>,
    pub users: RepositoryState<User>,
    pub directory: DirectoryState,
    pub tokens: TokenState,
}

impl Stores {
    /// Process-local storage. Used by tests and by local runs without a database.
    pub fn in_memory() -> Self {
        let posts = Arc::new(InMemoryRepository::<Post>::new());
        let tokens: TokenState = Arc::new(InMemoryTokenStore::default());
        let users = Arc::new(InMemoryUserRepository::new(posts.clone(), tokens.clone()));

        Self {
            posts,
            users: users.clone(),
            directory: users,
            tokens,
        }
    }

    /// PostgreSQL-backed storage sharing a single connection pool.
    pub fn postgres(pool: PgPool) -> Self {
        let users = Arc::new(PostgresUserRepository::new(pool.clone()));

        Self {
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            users: users.clone(),
            directory: users,
            tokens: Arc::new(PostgresTokenStore::new(pool)),
        }
    }
}
