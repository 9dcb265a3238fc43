use uuid::Uuid;

use crate::{
    error::AppError,
    repository::{Entity, Page, PageRequest, RepositoryState},
};

pub mod auth;
pub mod posts;
pub mod users;

pub use auth::AuthService;
pub use posts::{NewPost, PostService};
pub use users::{NewUser, UserChanges, UserService};

/// Page size applied when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// CrudService
///
/// The entity-agnostic half of every service: list, create, find, update and delete
/// delegated to a `Repository<T>`. Entity services wrap it and add their own rules
/// (derived fields) in front of `create`/`update`.
pub struct CrudService<T: Entity> {
    repo: RepositoryState<T>,
}

impl<T: Entity> Clone for CrudService<T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<T: Entity> CrudService<T> {
    pub fn new(repo: RepositoryState<T>) -> Self {
        Self { repo }
    }

    /// Lists one page. Both arguments are optional: page 1 and `DEFAULT_PAGE_SIZE`.
    pub async fn list(&self, page: Option<u32>, per_page: Option<u32>) -> Result<Page<T>, AppError> {
        let request = PageRequest::new(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PAGE_SIZE))?;
        self.repo.paginate(request).await
    }

    pub async fn create(&self, draft: T::Draft) -> Result<T, AppError> {
        let entity = self.repo.create(draft).await?;
        tracing::info!(entity = T::NAME, id = %entity.id(), "created");
        Ok(entity)
    }

    pub async fn find(&self, id: Uuid) -> Result<T, AppError> {
        self.repo.find_by_id(id).await
    }

    /// Applies `patch` and returns a freshly reloaded copy, so the caller observes
    /// the stored state (including server-set columns) rather than its own input.
    pub async fn update(&self, entity: &T, patch: T::Patch) -> Result<T, AppError> {
        self.repo.update(entity.id(), patch).await?;
        tracing::info!(entity = T::NAME, id = %entity.id(), "updated");
        self.repo.find_by_id(entity.id()).await
    }

    pub async fn delete(&self, entity: &T) -> Result<bool, AppError> {
        let removed = self.repo.delete(entity.id()).await?;
        tracing::info!(entity = T::NAME, id = %entity.id(), removed, "deleted");
        Ok(removed)
    }
}
