use uuid::Uuid;

use super::CrudService;
use crate::{
    auth::password,
    error::AppError,
    models::{
        CreateUserRequest, RegisterRequest, UpdateUserRequest, User, UserDraft, UserPatch,
        canonical_email,
    },
    repository::{DirectoryState, Page, RepositoryState},
};

/// Input for creating a user. Holds the plaintext password only until it is hashed.
#[derive(Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

impl From<RegisterRequest> for NewUser {
    // Self-registration never grants admin.
    fn from(req: RegisterRequest) -> Self {
        NewUser {
            name: req.name.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            is_admin: false,
        }
    }
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            name: req.name.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            is_admin: req.is_admin.unwrap_or(false),
        }
    }
}

/// Partial user update as supplied by a caller (plaintext password).
#[derive(Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            name: req.name,
            email: req.email,
            password: req.password,
            is_admin: req.is_admin,
        }
    }
}

/// UserService
///
/// Business rules for users. The derived field here is `password_hash`: plaintext
/// passwords are hashed on create and on update, and emails are canonicalised so that
/// uniqueness and login lookups agree.
#[derive(Clone)]
pub struct UserService {
    crud: CrudService<User>,
    directory: DirectoryState,
}

impl UserService {
    pub fn new(repo: RepositoryState<User>, directory: DirectoryState) -> Self {
        Self {
            crud: CrudService::new(repo),
            directory,
        }
    }

    pub async fn list(&self, page: Option<u32>, per_page: Option<u32>) -> Result<Page<User>, AppError> {
        self.crud.list(page, per_page).await
    }

    pub async fn create(&self, input: NewUser) -> Result<User, AppError> {
        let password_hash = password::hash_password(&input.password)?;

        self.crud
            .create(UserDraft {
                name: input.name,
                email: canonical_email(&input.email),
                password_hash,
                is_admin: input.is_admin,
            })
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<User, AppError> {
        self.crud.find(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.directory.find_by_email(&canonical_email(email)).await
    }

    pub async fn update(&self, user: &User, changes: UserChanges) -> Result<User, AppError> {
        let password_hash = match changes.password {
            Some(plain) => Some(password::hash_password(&plain)?),
            None => None,
        };

        let patch = UserPatch {
            name: changes.name,
            email: changes.email.as_deref().map(canonical_email),
            password_hash,
            is_admin: changes.is_admin,
        };

        self.crud.update(user, patch).await
    }

    pub async fn delete(&self, user: &User) -> Result<bool, AppError> {
        self.crud.delete(user).await
    }
}
