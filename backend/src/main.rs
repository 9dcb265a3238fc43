use quill_api::{
    AppState,
    config::{AppConfig, DataStore, Env},
    create_router,
    repository::Stores,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, persistence, admin seeding, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise verbose for this crate and the HTTP stack.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quill_api=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode with {:?} store", config.env, config.store);

    // 4. Persistence Initialization
    let stores = match config.store {
        DataStore::Postgres => {
            let db_url = config
                .db_url
                .as_deref()
                .expect("FATAL: DATABASE_URL is required for the postgres data store.");

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("FATAL: Failed to run database migrations.");

            Stores::postgres(pool)
        }
        DataStore::Memory => {
            tracing::warn!("Using the in-memory store; all data is lost on shutdown.");
            Stores::in_memory()
        }
    };

    // 5. Unified State Assembly
    let app_state = AppState::new(stores, config.clone());

    // 6. Admin Seeding
    if let Some(admin) = &config.admin {
        match app_state
            .auth
            .ensure_admin(&admin.name, &admin.email, &admin.password)
            .await
        {
            Ok(user) => tracing::info!(user_id = %user.id, "Admin account ready."),
            Err(error) => tracing::error!(%error, "Failed to ensure the admin account."),
        }
    }

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.expect("FATAL: HTTP server error.");
}
