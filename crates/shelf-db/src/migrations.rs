//! # Database Migrations
//!
//! SQL files in `migrations/sqlite/` at the workspace root, embedded at
//! compile time.
//!
//! ```text
//! migrations/sqlite/
//! ├── 001_initial_schema.sql  # books, customers, sales, sale_items, admin_users
//! └── 002_add_indexes.sql     # lookup indexes for reports and history
//! ```
//!
//! Never edit an applied migration; add the next numbered file instead.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations in filename order, each in its own
/// transaction. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // the bookkeeping table only exists once run_migrations has run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
