//! # jotter-db
//!
//! PostgreSQL database layer for jotter.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for every core entity
//! - `[[tag]]` mention syncing inside item transactions
//! - Trigram search over notes and todos
//! - The LISTEN/NOTIFY [`ChangeNotifier`] feeding per-user sync streams
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_db::{CreateTodoRequest, Database, Priority, TodoRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/jotter").await?;
//!
//!     let todo = db.todos.create(user_id, CreateTodoRequest {
//!         date: chrono::Utc::now().date_naive(),
//!         content: "Water the [[garden]]".to_string(),
//!         priority: Priority::High,
//!     }).await?;
//!
//!     println!("Created todo: {}", todo.id);
//!     Ok(())
//! }
//! ```
pub mod comments;
pub mod folders;
mod items;
pub mod notes;
pub mod notifier;
pub mod pool;
pub mod projects;
pub mod search;
pub mod settings;
pub mod tags;
pub mod todos;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use jotter_core::*;

use chrono::NaiveDate;
use uuid::Uuid;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use comments::PgCommentRepository;
pub use folders::PgFolderRepository;
pub use notes::PgNoteRepository;
pub use notifier::ChangeNotifier;
pub use pool::{
    create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use projects::PgProjectRepository;
pub use search::{PgSearch, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
pub use settings::PgSettingsRepository;
pub use tags::PgTagRepository;
pub use todos::PgTodoRepository;
pub use users::{PgSessionRepository, PgUserRepository, TOKEN_PREFIX};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub users: PgUserRepository,
    /// Bearer-token sessions.
    pub sessions: PgSessionRepository,
    pub todos: PgTodoRepository,
    /// Daily and generic notes.
    pub notes: PgNoteRepository,
    /// Folder tree for generic notes.
    pub folders: PgFolderRepository,
    pub projects: PgProjectRepository,
    pub tags: PgTagRepository,
    pub comments: PgCommentRepository,
    pub settings: PgSettingsRepository,
    /// Trigram search provider.
    pub search: PgSearch,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            todos: PgTodoRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            folders: PgFolderRepository::new(pool.clone()),
            projects: PgProjectRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            comments: PgCommentRepository::new(pool.clone()),
            settings: PgSettingsRepository::new(pool.clone()),
            search: PgSearch::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
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

    /// Todos and daily notes for one day.
    pub async fn day_view(&self, user_id: Uuid, date: NaiveDate) -> Result<DayView> {
        let (todos, notes) = tokio::try_join!(
            self.todos.list_for_date(user_id, date),
            self.notes.list_for_date(user_id, date),
        )?;
        Ok(DayView { date, todos, notes })
    }
}
