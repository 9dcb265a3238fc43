use std::env;

/// AppConfig
///
/// The application's configuration, loaded once at startup and immutable afterwards.
/// It is pulled into handlers and services via `FromRef` on the shared `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and how strict loading is.
    pub env: Env,
    // Which persistence backend the repositories run on.
    pub store: DataStore,
    // Postgres connection string. Only required for `DataStore::Postgres`.
    pub db_url: Option<String>,
    // HS256 key used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Lifetime of an issued token.
    pub token_ttl_minutes: i64,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Admin account ensured at startup, if configured.
    pub admin: Option<AdminSeed>,
}

/// Env
///
/// The runtime context: local development or hardened production.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// DataStore
///
/// `Memory` keeps everything in process and is meant for local runs and tests.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DataStore {
    Postgres,
    Memory,
}

/// Credentials of the admin account created (or promoted) on startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24;
/// Upper bound on `TOKEN_TTL_MINUTES`: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests: local, in-memory, no admin seed.
    fn default() -> Self {
        Self {
            env: Env::Local,
            store: DataStore::Memory,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            admin: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (`APP_ENV`, `DATA_STORE`,
    /// `DATABASE_URL`, `JWT_SECRET`, `TOKEN_TTL_MINUTES`, `BIND_ADDR`, `ADMIN_*`).
    ///
    /// # Panics
    /// In production, panics when `JWT_SECRET` or `DATABASE_URL` is missing, and in any
    /// environment when the Postgres store is selected without a `DATABASE_URL`. The
    /// process must not start with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        // Production always runs on Postgres. Locally the store follows DATA_STORE,
        // falling back to Postgres only when a database is configured.
        let store = match (env, env::var("DATA_STORE").as_deref()) {
            (Env::Production, _) => DataStore::Postgres,
            (Env::Local, Ok("memory")) => DataStore::Memory,
            (Env::Local, Ok("postgres")) => DataStore::Postgres,
            (Env::Local, _) if db_url.is_some() => DataStore::Postgres,
            (Env::Local, _) => DataStore::Memory,
        };

        if store == DataStore::Postgres && db_url.is_none() {
            panic!("FATAL: DATABASE_URL is required for the postgres data store.");
        }

        let token_ttl_minutes = env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|minutes| (1..=MAX_TOKEN_TTL_MINUTES).contains(minutes))
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => Some(AdminSeed {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Self {
            env,
            store,
            db_url,
            jwt_secret,
            token_ttl_minutes,
            bind_addr,
            admin,
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES))
    }
}
