//! # Database Pool and Admin Sessions
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new(path)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← pool + WAL + foreign_keys + migrations  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.session(user_id).await                                             │
//! │       │                                                                 │
//! │       ├── not in admin_users ──► DbError::PermissionDenied             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AdminSession                                                          │
//! │  ├── books()      ──► BookRepository                                   │
//! │  ├── customers()  ──► CustomerRepository                               │
//! │  └── sales()      ──► SaleRepository                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories are only handed out by an `AdminSession`, so every read and
//! write is preceded by the administrator check for that request.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::book::BookRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::sale::SaleRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/shelf.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Default: 5
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// Pool acquire timeout. Default: 30 seconds
    pub connect_timeout: Duration,

    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the given file. The file is created on
    /// first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// In-memory database for tests. Each call gets its own isolated
    /// database.
    ///
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            // the in-memory database lives and dies with its one connection
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

// =============================================================================
// Database
// =============================================================================

/// Database handle. Cheap to clone (wraps the pool).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, if configured, applies pending migrations.
    ///
    /// SQLite is configured with WAL journaling (file databases), NORMAL
    /// synchronous and foreign keys on.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let journal_mode = if config.is_in_memory() {
            SqliteJournalMode::Memory
        } else {
            SqliteJournalMode::Wal
        };

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(journal_mode)
            .synchronous(SqliteSynchronous::Normal)
            // off by default in SQLite; the schema's RESTRICT / SET NULL /
            // CASCADE rules depend on it
            .foreign_keys(true)
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);

        if config.is_in_memory() {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        } else {
            pool_options = pool_options.idle_timeout(Some(config.idle_timeout));
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies all pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        Ok(())
    }

    /// `(embedded, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Opens an administrator session for `user_id`.
    ///
    /// ## Returns
    /// * `Ok(AdminSession)` - `user_id` is in `admin_users`
    /// * `Err(DbError::PermissionDenied)` - anyone else
    pub async fn session(&self, user_id: &str) -> DbResult<AdminSession> {
        let user_id = user_id.trim();

        let is_admin: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admin_users WHERE user_id = ?1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        if !is_admin {
            warn!(user_id = %user_id, "Rejected non-admin session");
            return Err(DbError::PermissionDenied {
                user_id: user_id.to_string(),
            });
        }

        debug!(user_id = %user_id, "Admin session opened");
        Ok(AdminSession {
            user_id: user_id.to_string(),
            pool: self.pool.clone(),
        })
    }

    /// Adds `user_id` to `admin_users`. Granting twice is a no-op.
    pub async fn grant_admin(&self, user_id: &str) -> DbResult<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(DbError::QueryFailed("admin user id is empty".to_string()));
        }

        sqlx::query("INSERT OR IGNORE INTO admin_users (user_id, granted_at) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, "Granted admin");
        Ok(())
    }

    /// Removes `user_id` from `admin_users`. Returns whether it was present.
    pub async fn revoke_admin(&self, user_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM admin_users WHERE user_id = ?1")
            .bind(user_id.trim())
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, "Revoked admin");
        Ok(result.rows_affected() > 0)
    }

    /// Closes the pool. Sessions created from it fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

// =============================================================================
// Admin Session
// =============================================================================

/// Proof that the caller passed the administrator check.
///
/// ## Usage
/// ```rust,ignore
/// let session = db.session("manager").await?;
/// let books = session.books().list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct AdminSession {
    user_id: String,
    pool: SqlitePool,
}

impl AdminSession {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
