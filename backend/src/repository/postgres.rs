use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Entity, Page, PageRequest, Repository, UserDirectory};
use crate::{
    error::AppError,
    models::{Post, PostDraft, PostPatch, User, UserDraft, UserPatch},
};

const POST_COLUMNS: &str = "id, user_id, title, slug, body, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, created_at, updated_at";

/// map_write_error
///
/// Translates unique-constraint violations raised by Postgres into field-level
/// validation errors. Every other failure stays a database error (500).
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_email_key") => "email",
                Some("posts_slug_key") => "slug",
                _ => "id",
            };
            return AppError::invalid(field, format!("The {} has already been taken.", field));
        }
    }
    AppError::Database(err)
}

/// PostgresPostRepository
///
/// `Repository<Post>` over the `posts` table.
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Post> for PostgresPostRepository {
    async fn paginate(&self, request: PageRequest) -> Result<Page<Post>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(request.per_page))
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, request, total.max(0) as u64))
    }

    async fn create(&self, draft: PostDraft) -> Result<Post, AppError> {
        sqlx::query_as::<_, Post>(&format!(
            r#"INSERT INTO posts (id, user_id, title, slug, body, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
               RETURNING {POST_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(draft.user_id)
        .bind(draft.title)
        .bind(draft.slug)
        .bind(draft.body)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Post, AppError> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound(Post::NAME))
    }

    /// Uses `COALESCE` so that only the columns present in the patch change.
    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, AppError> {
        sqlx::query_as::<_, Post>(&format!(
            r#"UPDATE posts
               SET title = COALESCE($2, title),
                   slug = COALESCE($3, slug),
                   body = COALESCE($4, body),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {POST_COLUMNS}"#
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.slug)
        .bind(patch.body)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(AppError::NotFound(Post::NAME))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// PostgresUserRepository
///
/// `Repository<User>` and `UserDirectory` over the `users` table.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<User> for PostgresUserRepository {
    async fn paginate(&self, request: PageRequest) -> Result<Page<User>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(request.per_page))
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, request, total.max(0) as u64))
    }

    async fn create(&self, draft: UserDraft) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (id, name, email, password_hash, is_admin, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(draft.name)
        .bind(draft.email)
        .bind(draft.password_hash)
        .bind(draft.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound(User::NAME))
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   is_admin = COALESCE($5, is_admin),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.password_hash)
        .bind(patch.is_admin)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(AppError::NotFound(User::NAME))
    }

    /// Posts and tokens owned by the user go with it (`ON DELETE CASCADE`).
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserDirectory for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
