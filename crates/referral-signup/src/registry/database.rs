//! SQLite connection management and schema.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        phone_number TEXT NOT NULL UNIQUE,
        referral_code TEXT NOT NULL UNIQUE,
        entries INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_REFERRALS: &str = r#"
    CREATE TABLE IF NOT EXISTS referrals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        referrer_code TEXT NOT NULL,
        new_user_id INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_REFERRALS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_referrals_referrer_code ON referrals (referrer_code)";

/// Shared SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        info!("SQLite connection pool established");
        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// An in-memory SQLite database lives as long as its connection, so the
    /// pool is pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        for statement in [CREATE_USERS, CREATE_REFERRALS, CREATE_REFERRALS_INDEX] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        assert_ok!(db.migrate().await);
        assert_ok!(db.migrate().await);
        assert_ok!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("referrals.db");
        let url = format!("sqlite://{}", path.display());

        let db = Database::connect(&url, 2).await.unwrap();
        db.migrate().await.unwrap();

        assert!(path.exists());
    }
}
