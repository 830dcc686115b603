use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the data layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Message {0} not found")]
    NotFound(i64),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const CREATE_MESSAGES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        body TEXT NOT NULL,
        username TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

/// Owns pool construction and schema setup for the messages database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open (creating if missing) the database described by `config` and apply the schema
    pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // Every connection to an in-memory database is a separate database,
        // so those are pinned to a single connection that is never recycled.
        let in_memory = Self::is_in_memory(&config.url);
        let max_connections = if in_memory { 1 } else { config.max_connections.max(1) };

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout));
        if in_memory {
            pool_options = pool_options.idle_timeout(None::<Duration>).max_lifetime(None::<Duration>);
        }

        let pool = pool_options.connect_with(options).await?;
        Self::migrate(&pool).await?;

        info!("Opened messages database: {}", config.url);
        Ok(pool)
    }

    /// Create the messages table if it does not exist yet
    pub async fn migrate(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query(CREATE_MESSAGES_TABLE)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(format!("creating messages table: {}", e)))?;
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the pool on shutdown
    pub async fn close(pool: SqlitePool) {
        pool.close().await;
        info!("Closed messages database pool");
    }

    fn is_in_memory(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }
}
