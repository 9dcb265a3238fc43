use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthGateway, AuthUser, IssuedToken, Principal};
use crate::{
    error::AppError,
    models::User,
    repository::{RepositoryState, TokenRecord, TokenState},
};

/// Claims
///
/// The payload signed into every bearer token (HS256).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    /// JWT ID (jti): the key of the token's record in the token store. Revoking the record
    /// invalidates the token even though its signature is still valid.
    pub jti: Uuid,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

/// JwtAuthGateway
///
/// `AuthGateway` issuing signed JWTs whose `jti` is recorded in a `TokenStore`.
/// A token resolves only if the signature and `exp` check out, the record still exists,
/// and the user it names still exists.
pub struct JwtAuthGateway {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    tokens: TokenState,
    users: RepositoryState<User>,
}

impl JwtAuthGateway {
    pub fn new(secret: &str, ttl: Duration, tokens: TokenState, users: RepositoryState<User>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            tokens,
            users,
        }
    }
}

#[async_trait]
impl AuthGateway for JwtAuthGateway {
    async fn issue_token(&self, principal_id: Uuid) -> Result<IssuedToken, AppError> {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(format!("token lifetime {} overflows the clock", self.ttl)))?;
        let token_id = Uuid::new_v4();

        let claims = Claims {
            sub: principal_id,
            jti: token_id,
            exp: expires_at.timestamp().max(0) as usize,
            iat: issued_at.timestamp().max(0) as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))?;

        self.tokens
            .record(TokenRecord {
                id: token_id,
                user_id: principal_id,
                expires_at,
            })
            .await?;

        tracing::debug!(user_id = %principal_id, token_id = %token_id, "issued token");

        Ok(IssuedToken {
            token,
            token_id,
            expires_at,
        })
    }

    async fn resolve_principal(&self, token: &str) -> Result<AuthUser, AppError> {
        let mut validation = Validation::default();
        // Ensure expiration time validation is always active, with no grace period.
        validation.validate_exp = true;
        validation.leeway = 0;

        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::ExpiredSignature => Err(AppError::Unauthenticated("Token has expired.")),
                    _ => Err(AppError::Unauthenticated("Unauthenticated.")),
                };
            }
        };

        if !self.tokens.is_active(claims.jti).await? {
            return Err(AppError::Unauthenticated("Token has been revoked."));
        }

        // The user may have been deleted after the token was issued.
        let user = match self.users.find_by_id(claims.sub).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => return Err(AppError::Unauthenticated("Unauthenticated.")),
            Err(e) => return Err(e),
        };

        Ok(AuthUser {
            principal: Principal::from(&user),
            token_id: claims.jti,
        })
    }

    async fn revoke(&self, token_id: Uuid) -> Result<bool, AppError> {
        self.tokens.revoke(token_id).await
    }

    async fn revoke_all(&self, principal_id: Uuid) -> Result<u64, AppError> {
        let revoked = self.tokens.revoke_all_for(principal_id).await?;
        tracing::info!(user_id = %principal_id, revoked, "revoked all tokens");
        Ok(revoked)
    }
}
