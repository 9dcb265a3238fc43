use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;

/// TokenRecord
///
/// The server-side record of an issued bearer token, keyed by the token's `jti`.
/// A token is only honoured while its record exists and has not expired.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// TokenStore
///
/// Persistence for issued tokens. Revocation deletes the record, so a revoked token
/// cannot be resurrected by re-recording it.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stores `token` and drops records that have already expired.
    async fn record(&self, token: TokenRecord) -> Result<(), AppError>;

    async fn is_active(&self, token_id: Uuid) -> Result<bool, AppError>;

    /// Returns `true` if the token was still on record.
    async fn revoke(&self, token_id: Uuid) -> Result<bool, AppError>;

    /// Revokes every token of the user and returns how many were removed.
    async fn revoke_all_for(&self, user_id: Uuid) -> Result<u64, AppError>;
}

pub type TokenState = Arc<dyn TokenStore>;

/// InMemoryTokenStore
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<Uuid, TokenRecord>>,
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn record(&self, token: TokenRecord) -> Result<(), AppError> {
        let now = Utc::now();
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, existing| existing.expires_at > now);
        tokens.insert(token.id, token);
        Ok(())
    }

    async fn is_active(&self, token_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .tokens
            .read()
            .await
            .get(&token_id)
            .is_some_and(|token| token.expires_at > Utc::now()))
    }

    async fn revoke(&self, token_id: Uuid) -> Result<bool, AppError> {
        Ok(self.tokens.write().await.remove(&token_id).is_some())
    }

    async fn revoke_all_for(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| token.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }
}

/// PostgresTokenStore
///
/// `TokenStore` over the `personal_access_tokens` table.
pub struct PostgresTokenStore {
    pool: PgPool,
}

impl PostgresTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn record(&self, token: TokenRecord) -> Result<(), AppError> {
        let pruned = sqlx::query("DELETE FROM personal_access_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned expired token records");
        }

        sqlx::query(
            "INSERT INTO personal_access_tokens (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, NOW())",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_active(&self, token_id: Uuid) -> Result<bool, AppError> {
        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM personal_access_tokens WHERE id = $1 AND expires_at > NOW())",
        )
        .bind(token_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(active)
    }

    async fn revoke(&self, token_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
