//! # jotter-db
//!
//! PostgreSQL database layer for jotter.
//!
//! This crate provides connection pool management and the repository
//! implementations for every core entity. The schema lives in the workspace
//! `migrations/` directory (applied by [`Database::migrate`] with the
//! `migrations` feature); the repositories expect the following tables:
//!
//! ```text
//! app_user      (id uuid pk, username text, password_hash text,
//!                phone text unique, email text unique, avatar text null,
//!                created_at timestamptz, updated_at timestamptz)
//! category      (id uuid pk, user_id uuid -> app_user on delete cascade,
//!                name text, created_at, updated_at)
//! tag           (id uuid pk, user_id uuid -> app_user on delete cascade,
//!                name text, created_at, updated_at)
//! note          (id uuid pk, user_id uuid -> app_user on delete cascade,
//!                title text, content text,
//!                category_id uuid null -> category on delete set null,
//!                created_at, updated_at)
//! note_tag      (note_id uuid -> note on delete cascade,
//!                tag_id uuid -> tag on delete cascade, pk (note_id, tag_id))
//! provider_key  (id uuid pk, user_id uuid -> app_user on delete cascade,
//!                provider text, model text, sealed_key text,
//!                created_at, updated_at, unique (user_id, provider, model))
//! ai_log        (id uuid pk, user_id uuid -> app_user on delete cascade,
//!                level text, request jsonb null, response jsonb null,
//!                error text null, created_at, deleted_at timestamptz null)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_db::{Database, TagRepository};
//! use jotter_crypto::SecretBox;
//!
//! let secrets = SecretBox::new(&std::env::var("ENCRYPTION_KEY")?)?;
//! let db = Database::connect("postgres://localhost/jotter", secrets).await?;
//! let tag = db.tags.create(user_id, "reading").await?;
//! ```

pub mod ai_logs;
pub mod categories;
pub mod notes;
pub mod pool;
pub mod provider_keys;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use jotter_core::*;

pub use ai_logs::PgAiLogRepository;
pub use categories::PgCategoryRepository;
pub use notes::PgNoteRepository;
pub use pool::{connect_pool, PoolConfig};
pub use provider_keys::PgProviderKeyRepository;
pub use tags::{validate_name, PgTagRepository};
pub use users::PgUserRepository;

use jotter_crypto::SecretBox;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub users: PgUserRepository,
    pub notes: PgNoteRepository,
    pub tags: PgTagRepository,
    pub categories: PgCategoryRepository,
    /// Provider API keys, sealed at rest.
    pub provider_keys: PgProviderKeyRepository,
    /// AI processing audit log.
    pub ai_logs: PgAiLogRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>, secrets: SecretBox) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            categories: PgCategoryRepository::new(pool.clone()),
            provider_keys: PgProviderKeyRepository::new(pool.clone(), secrets),
            ai_logs: PgAiLogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str, secrets: SecretBox) -> Result<Self> {
        Self::connect_with_config(url, PoolConfig::default(), secrets).await
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(
        url: &str,
        config: PoolConfig,
        secrets: SecretBox,
    ) -> Result<Self> {
        let pool = connect_pool(url, &config).await?;
        Ok(Self::new(pool, secrets))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

/// Map a unique-constraint violation to `Error::Conflict`, anything else to
/// `Error::Database`.
pub(crate) fn conflict_or_db(e: sqlx::Error, message: &str) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(message.to_string())
        }
        _ => Error::Database(e),
    }
}
