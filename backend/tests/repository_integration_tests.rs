use chrono::{Duration, Utc};
use quill_api::{
    AppError,
    models::{Post, PostDraft, PostPatch, User, UserDraft},
    repository::{
        InMemoryRepository, InMemoryTokenStore, InMemoryUserRepository, PageRequest, PostgresPostRepository, PostgresTokenStore, PostgresUserRepository,
        Repository, TokenRecord, TokenStore, UserDirectory,
    },
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

/// Holds the pool of the Postgres instance named by `DATABASE_URL`.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    /// Connects and migrates, or returns `None` when no database is configured so the
    /// Postgres tests are skipped on machines without one.
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres repository test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn posts(&self) -> PostgresPostRepository {
        PostgresPostRepository::new(self.pool.clone())
    }

    fn users(&self) -> PostgresUserRepository {
        PostgresUserRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

fn user_draft(tag: &str) -> UserDraft {
    UserDraft {
        name: format!("User {}", tag),
        email: format!("{}-{}@test.com", tag, Uuid::new_v4()),
        password_hash: "not-a-real-hash".to_string(),
        is_admin: false,
    }
}

fn post_draft(user_id: Uuid, slug: &str) -> PostDraft {
    PostDraft {
        user_id,
        title: "Integration".to_string(),
        slug: slug.to_string(),
        body: "Body".to_string(),
    }
}

fn unique_slug() -> String {
    format!("slug-{}", Uuid::new_v4())
}

fn is_validation_on(err: &AppError, field: &str) -> bool {
    matches!(err, AppError::Validation(fields) if fields.contains_key(field))
}

// --- Postgres ---

#[test]
async fn test_postgres_post_crud_roundtrip() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let users = ctx.users();
    let posts = ctx.posts();

    let owner = users.create(user_draft("crud")).await.unwrap();
    let created = posts.create(post_draft(owner.id, &unique_slug())).await.unwrap();

    assert_eq!(posts.find_by_id(created.id).await.unwrap(), created);

    let updated = posts
        .update(
            created.id,
            PostPatch {
                title: Some("Changed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Changed");
    assert_eq!(updated.slug, created.slug);
    assert_eq!(updated.body, created.body);
    assert!(updated.updated_at >= created.updated_at);

    assert!(posts.delete(created.id).await.unwrap());
    assert!(!posts.delete(created.id).await.unwrap());
    assert!(matches!(posts.find_by_id(created.id).await, Err(AppError::NotFound("Post"))));
}

#[test]
async fn test_postgres_update_missing_post_is_not_found() {
    let Some(ctx) = DbTestContext::setup().await else { return };

    let err = ctx.posts().update(Uuid::new_v4(), PostPatch::default()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Post")));
}

#[test]
async fn test_postgres_slug_uniqueness_exempts_empty_slugs() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let owner = ctx.users().create(user_draft("slug")).await.unwrap();
    let posts = ctx.posts();

    let slug = unique_slug();
    posts.create(post_draft(owner.id, &slug)).await.unwrap();
    let err = posts.create(post_draft(owner.id, &slug)).await.unwrap_err();
    assert!(is_validation_on(&err, "slug"));

    posts.create(post_draft(owner.id, "")).await.unwrap();
    posts.create(post_draft(owner.id, "")).await.unwrap();
}

#[test]
async fn test_postgres_duplicate_email_is_validation_error() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let users = ctx.users();

    let first = users.create(user_draft("dupe")).await.unwrap();
    let err = users
        .create(UserDraft {
            email: first.email.clone(),
            ..user_draft("dupe")
        })
        .await
        .unwrap_err();

    assert!(is_validation_on(&err, "email"));
    assert_eq!(users.find_by_email(&first.email).await.unwrap().map(|u| u.id), Some(first.id));
}

#[test]
async fn test_postgres_pagination_meta_is_consistent() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let owner = ctx.users().create(user_draft("page")).await.unwrap();
    let posts = ctx.posts();
    for _ in 0..3 {
        posts.create(post_draft(owner.id, &unique_slug())).await.unwrap();
    }

    let page = posts.paginate(PageRequest::new(1, 2).unwrap()).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert!(page.total >= 3);
    assert_eq!(u64::from(page.last_page), page.total.div_ceil(2));
}

#[test]
async fn test_postgres_user_delete_cascades_to_posts_and_tokens() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let users = ctx.users();
    let posts = ctx.posts();
    let tokens = PostgresTokenStore::new(ctx.pool.clone());

    let owner = users.create(user_draft("cascade")).await.unwrap();
    let post = posts.create(post_draft(owner.id, &unique_slug())).await.unwrap();
    let token_id = Uuid::new_v4();
    tokens
        .record(TokenRecord {
            id: token_id,
            user_id: owner.id,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();
    assert!(tokens.is_active(token_id).await.unwrap());

    assert!(users.delete(owner.id).await.unwrap());

    assert!(matches!(posts.find_by_id(post.id).await, Err(AppError::NotFound(_))));
    assert!(!tokens.is_active(token_id).await.unwrap());
}

#[test]
async fn test_postgres_token_store_revocation() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let owner = ctx.users().create(user_draft("tokens")).await.unwrap();
    let tokens = PostgresTokenStore::new(ctx.pool.clone());

    let record = |id| TokenRecord {
        id,
        user_id: owner.id,
        expires_at: Utc::now() + Duration::hours(1),
    };
    let (a, b, expired) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    tokens
        .record(TokenRecord {
            expires_at: Utc::now() - Duration::hours(1),
            ..record(expired)
        })
        .await
        .unwrap();
    assert!(!tokens.is_active(expired).await.unwrap());

    tokens.record(record(a)).await.unwrap();
    tokens.record(record(b)).await.unwrap();

    // Recording `a` pruned the expired row.
    assert!(!tokens.revoke(expired).await.unwrap());
    assert!(tokens.revoke(a).await.unwrap());
    assert!(!tokens.is_active(a).await.unwrap());
    assert!(tokens.is_active(b).await.unwrap());
    assert_eq!(tokens.revoke_all_for(owner.id).await.unwrap(), 1);
}

// --- In-Memory ---

#[test]
async fn test_in_memory_failed_update_leaves_row_untouched() {
    let users = InMemoryRepository::<User>::new();
    let first = users.create(user_draft("mem")).await.unwrap();
    let second = users.create(user_draft("mem")).await.unwrap();

    let err = users
        .update(
            second.id,
            quill_api::models::UserPatch {
                email: Some(first.email.clone()),
                name: Some("Should not stick".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(is_validation_on(&err, "email"));
    let reloaded = users.find_by_id(second.id).await.unwrap();
    assert_eq!(reloaded.name, second.name);
    assert_eq!(reloaded.email, second.email);
}

#[test]
async fn test_in_memory_directory_finds_by_exact_email() {
    let users = InMemoryRepository::<User>::new();
    let user = users.create(user_draft("dir")).await.unwrap();

    assert_eq!(users.find_by_email(&user.email).await.unwrap().map(|u| u.id), Some(user.id));
    assert!(users.find_by_email("nobody@test.com").await.unwrap().is_none());
}

#[test]
async fn test_in_memory_token_store_prunes_expired_records() {
    let tokens = InMemoryTokenStore::default();
    let user_id = Uuid::new_v4();
    let (stale, fresh) = (Uuid::new_v4(), Uuid::new_v4());

    tokens
        .record(TokenRecord {
            id: stale,
            user_id,
            expires_at: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();
    tokens
        .record(TokenRecord {
            id: fresh,
            user_id,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

    // The stale record was dropped when the fresh one was written.
    assert!(!tokens.revoke(stale).await.unwrap());
    assert!(tokens.is_active(fresh).await.unwrap());
    assert_eq!(tokens.revoke_all_for(user_id).await.unwrap(), 1);
}

#[test]
async fn test_in_memory_user_delete_cascades_to_posts_and_tokens() {
    let posts = Arc::new(InMemoryRepository::<Post>::new());
    let tokens = Arc::new(InMemoryTokenStore::default());
    let users = InMemoryUserRepository::new(posts.clone(), tokens.clone());

    let owner = users.create(user_draft("cascade")).await.unwrap();
    let bystander = users.create(user_draft("bystander")).await.unwrap();
    let owned = posts.create(post_draft(owner.id, &unique_slug())).await.unwrap();
    let kept = posts.create(post_draft(bystander.id, &unique_slug())).await.unwrap();
    let token_id = Uuid::new_v4();
    tokens
        .record(TokenRecord {
            id: token_id,
            user_id: owner.id,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

    assert!(users.delete(owner.id).await.unwrap());

    assert!(matches!(posts.find_by_id(owned.id).await, Err(AppError::NotFound("Post"))));
    assert_eq!(posts.find_by_id(kept.id).await.unwrap(), kept);
    assert!(!tokens.is_active(token_id).await.unwrap());
    assert!(!users.delete(owner.id).await.unwrap());
}
