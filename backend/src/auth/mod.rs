use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::AppError, models::User};

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtAuthGateway};

/// Principal
///
/// The authenticated actor making a request. It carries only what authorization needs;
/// credential material never leaves the auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Admins pass every ownership check.
    pub is_admin: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request: the principal plus the id of the
/// token it presented, which `logout` needs in order to revoke exactly that token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
    pub token_id: Uuid,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// AuthGateway
///
/// Issues, resolves and revokes bearer tokens. The rest of the application treats tokens
/// as opaque strings and only ever talks to this trait.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn issue_token(&self, principal_id: Uuid) -> Result<IssuedToken, AppError>;

    /// Resolves a bearer token to its principal. Every failure (malformed, bad signature,
    /// expired, revoked, unknown user) is `AppError::Unauthenticated`.
    async fn resolve_principal(&self, token: &str) -> Result<AuthUser, AppError>;

    async fn revoke(&self, token_id: Uuid) -> Result<bool, AppError>;

    async fn revoke_all(&self, principal_id: Uuid) -> Result<u64, AppError>;
}

/// AuthState
///
/// The shared gateway handle, pulled out of the application state by the extractor.
pub type AuthState = Arc<dyn AuthGateway>;

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. The flow:
/// 1. Pull the `AuthGateway` out of the application state.
/// 2. Require an `Authorization: Bearer <token>` header.
/// 3. Let the gateway resolve the token to a principal.
///
/// Rejection: `AppError::Unauthenticated`, rendered as a 401 envelope.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gateway = AuthState::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthenticated("Unauthenticated."))?;

        gateway.resolve_principal(token).await
    }
}
