use uuid::Uuid;

use super::CrudService;
use crate::{
    auth::Principal,
    error::AppError,
    models::{CreatePostRequest, Post, PostDraft, PostPatch},
    repository::{Page, RepositoryState},
    slug,
};

/// Input for creating a post. `slug: None` means "derive it from the title".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPost {
    pub title: String,
    pub slug: Option<String>,
    pub body: String,
}

impl From<CreatePostRequest> for NewPost {
    // Required fields were enforced by `validate()` before conversion.
    fn from(req: CreatePostRequest) -> Self {
        NewPost {
            title: req.title.unwrap_or_default(),
            slug: req.slug,
            body: req.body.unwrap_or_default(),
        }
    }
}

/// PostService
///
/// Business rules for posts. The only rule beyond plain CRUD is slug derivation:
/// a post created without a slug gets `slug::normalize(title)`. An explicitly supplied
/// slug, including an empty one, is stored untouched, and updates never re-derive it.
#[derive(Clone)]
pub struct PostService {
    crud: CrudService<Post>,
}

impl PostService {
    pub fn new(repo: RepositoryState<Post>) -> Self {
        Self {
            crud: CrudService::new(repo),
        }
    }

    pub async fn list(&self, page: Option<u32>, per_page: Option<u32>) -> Result<Page<Post>, AppError> {
        self.crud.list(page, per_page).await
    }

    /// Creates a post owned by `owner`.
    pub async fn create(&self, owner: &Principal, input: NewPost) -> Result<Post, AppError> {
        let slug = match input.slug {
            Some(explicit) => explicit,
            None => slug::normalize(&input.title),
        };

        self.crud
            .create(PostDraft {
                user_id: owner.id,
                title: input.title,
                slug,
                body: input.body,
            })
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<Post, AppError> {
        self.crud.find(id).await
    }

    pub async fn update(&self, post: &Post, patch: PostPatch) -> Result<Post, AppError> {
        self.crud.update(post, patch).await
    }

    pub async fn delete(&self, post: &Post) -> Result<bool, AppError> {
        self.crud.delete(post).await
    }
}
