use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Entity, Page, PageRequest, Repository, TokenState, UserDirectory};
use crate::{
    error::AppError,
    models::{Post, User},
};

/// InMemoryRepository
///
/// A process-local `Repository<T>` backed by a `Vec` in insertion order, which matches
/// the `created_at, id` ordering of the Postgres backend. Unique keys declared by the
/// entity are checked on every write, mirroring the database constraints.
pub struct InMemoryRepository<T> {
    rows: RwLock<Vec<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Rejects `candidate` if any *other* row already holds one of its unique values.
    fn check_unique(rows: &[T], candidate: &T) -> Result<(), AppError> {
        let wanted = candidate.unique_keys();

        for row in rows.iter().filter(|row| row.id() != candidate.id()) {
            for (field, value) in row.unique_keys() {
                if wanted.iter().any(|(f, v)| *f == field && *v == value) {
                    return Err(AppError::invalid(
                        field,
                        format!("The {} has already been taken.", field),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Removes every row matching `predicate` and returns how many were removed.
    pub async fn remove_where<F>(&self, predicate: F) -> u64
    where
        F: Fn(&T) -> bool,
    {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !predicate(row));
        (before - rows.len()) as u64
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn paginate(&self, request: PageRequest) -> Result<Page<T>, AppError> {
        let rows = self.rows.read().await;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);

        let items = rows
            .iter()
            .skip(offset)
            .take(request.per_page as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, request, rows.len() as u64))
    }

    async fn create(&self, draft: T::Draft) -> Result<T, AppError> {
        let entity = T::from_draft(Uuid::new_v4(), draft, Utc::now());

        let mut rows = self.rows.write().await;
        Self::check_unique(&rows, &entity)?;
        rows.push(entity.clone());

        Ok(entity)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<T, AppError> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or(AppError::NotFound(T::NAME))
    }

    async fn update(&self, id: Uuid, patch: T::Patch) -> Result<T, AppError> {
        let mut rows = self.rows.write().await;

        let index = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or(AppError::NotFound(T::NAME))?;

        // Work on a copy so a constraint failure leaves the stored row untouched.
        let mut updated = rows[index].clone();
        updated.apply_patch(patch, Utc::now());
        Self::check_unique(&rows, &updated)?;
        rows[index] = updated.clone();

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        Ok(rows.len() < before)
    }
}

#[async_trait]
impl UserDirectory for InMemoryRepository<User> {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }
}

/// InMemoryUserRepository
///
/// Users kept in an `InMemoryRepository<User>`, with the `ON DELETE CASCADE` of the
/// Postgres schema: deleting a user also removes their posts and token records.
pub struct InMemoryUserRepository {
    users: InMemoryRepository<User>,
    posts: Arc<InMemoryRepository<Post>>,
    tokens: TokenState,
}

impl InMemoryUserRepository {
    pub fn new(posts: Arc<InMemoryRepository<Post>>, tokens: TokenState) -> Self {
        Self {
            users: InMemoryRepository::new(),
            posts,
            tokens,
        }
    }
}

#[async_trait]
impl Repository<User> for InMemoryUserRepository {
    async fn paginate(&self, request: PageRequest) -> Result<Page<User>, AppError> {
        self.users.paginate(request).await
    }

    async fn create(&self, draft: <User as Entity>::Draft) -> Result<User, AppError> {
        self.users.create(draft).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.users.find_by_id(id).await
    }

    async fn update(&self, id: Uuid, patch: <User as Entity>::Patch) -> Result<User, AppError> {
        self.users.update(id, patch).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        if !self.users.delete(id).await? {
            return Ok(false);
        }

        let posts = self.posts.remove_where(|post| post.user_id == id).await;
        let tokens = self.tokens.revoke_all_for(id).await?;
        tracing::debug!(user_id = %id, posts, tokens, "cascaded user delete");

        Ok(true)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users.find_by_email(email).await
    }
}
