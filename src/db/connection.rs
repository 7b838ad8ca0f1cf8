use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::db::errors::{Result, StoreError};

const CREATE_TASKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        completed BOOLEAN,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Open a pool against a SQLite URL, creating the database file if missing.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    info!("Creating database connection pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StoreError::Connection(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Connection(format!("Failed to create pool: {}", e)))?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Single-connection in-memory pool. The connection is never recycled,
/// because dropping it would drop the database with it.
pub async fn create_in_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| StoreError::Connection(format!("Invalid database URL: {}", e)))?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Connection(format!("Failed to create pool: {}", e)))
}

/// Create the `tasks` table if absent, then run the additive migrations.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_TASKS_TABLE).execute(pool).await?;
    ensure_updated_at_column(pool).await;
    Ok(())
}

/// Add `tasks.updated_at` to tables created before the column existed.
///
/// Failures are logged and swallowed; the service keeps starting.
pub async fn ensure_updated_at_column(pool: &SqlitePool) {
    let columns = match sqlx::query("PRAGMA table_info(tasks)").fetch_all(pool).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "schema check failed");
            return;
        }
    };

    let mut has_updated_at = false;
    for row in &columns {
        match row.try_get::<String, _>("name") {
            Ok(name) if name == "updated_at" => {
                has_updated_at = true;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "schema scan failed");
                return;
            }
        }
    }

    if has_updated_at {
        return;
    }

    // SQLite rejects non-constant defaults in ADD COLUMN, so backfill instead
    let migration = async {
        sqlx::query(
            "ALTER TABLE tasks ADD COLUMN updated_at TIMESTAMP NOT NULL DEFAULT '1970-01-01 00:00:00'",
        )
        .execute(pool)
        .await?;
        sqlx::query("UPDATE tasks SET updated_at = created_at")
            .execute(pool)
            .await?;
        Ok::<_, sqlx::Error>(())
    };

    match migration.await {
        Ok(()) => info!("migrated: added tasks.updated_at"),
        Err(e) => warn!(error = %e, "add updated_at failed (maybe already exists?)"),
    }
}

/// Health check for the database connection
pub async fn health_check(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
