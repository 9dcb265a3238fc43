use crate::{
    auth::{AuthState, AuthUser, IssuedToken, Principal, password},
    error::AppError,
    models::User,
};

use super::{NewUser, UserChanges, UserService};

const BAD_CREDENTIALS: &str = "These credentials do not match our records.";

/// AuthService
///
/// The token-based auth flow on top of `UserService` and the `AuthGateway`:
/// registration, login, logout of the current token, and logout everywhere.
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    gateway: AuthState,
}

impl AuthService {
    pub fn new(users: UserService, gateway: AuthState) -> Self {
        Self { users, gateway }
    }

    /// Creates a non-admin account and signs it in.
    pub async fn register(&self, input: NewUser) -> Result<(User, IssuedToken), AppError> {
        let user = self.users.create(NewUser { is_admin: false, ..input }).await?;
        let token = self.gateway.issue_token(user.id).await?;
        Ok((user, token))
    }

    /// Verifies credentials and issues a new token. Unknown email and wrong password
    /// produce the same 422 so accounts cannot be probed.
    pub async fn login(&self, email: &str, plain_password: &str) -> Result<(User, IssuedToken), AppError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) if password::verify_password(plain_password, &user.password_hash) => user,
            Some(_) => return Err(AppError::invalid("email", BAD_CREDENTIALS)),
            None => {
                // Same cost as a wrong password.
                password::verify_password(plain_password, password::UNMATCHABLE_HASH);
                return Err(AppError::invalid("email", BAD_CREDENTIALS));
            }
        };

        let token = self.gateway.issue_token(user.id).await?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok((user, token))
    }

    /// Revokes only the token the request was made with.
    pub async fn logout(&self, session: &AuthUser) -> Result<bool, AppError> {
        self.gateway.revoke(session.token_id).await
    }

    /// Revokes every token the principal holds.
    pub async fn logout_all(&self, principal: &Principal) -> Result<u64, AppError> {
        self.gateway.revoke_all(principal.id).await
    }

    /// Makes sure an admin account exists for `email`. An existing account with that
    /// email is promoted to admin; otherwise one is created.
    pub async fn ensure_admin(&self, name: &str, email: &str, plain_password: &str) -> Result<User, AppError> {
        match self.users.find_by_email(email).await? {
            Some(existing) if existing.is_admin => Ok(existing),
            Some(existing) => {
                tracing::warn!(user_id = %existing.id, "promoting existing account to admin");
                self.users
                    .update(
                        &existing,
                        UserChanges {
                            is_admin: Some(true),
                            ..Default::default()
                        },
                    )
                    .await
            }
            None => {
                tracing::info!("seeding admin account");
                self.users
                    .create(NewUser {
                        name: name.to_string(),
                        email: email.to_string(),
                        password: plain_password.to_string(),
                        is_admin: true,
                    })
                    .await
            }
        }
    }
}
