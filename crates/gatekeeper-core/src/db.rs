//! Shared database types and utilities.
//!
//! Provides `DatabaseError`, `unix_timestamp()` and the pool creation helpers
//! used by the SQLite connector.

use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Database errors surfaced by the permission store.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        Self::Query(e.to_string())
    }
}

/// Open a `SQLite` connection pool from a connection descriptor such as
/// `sqlite:/var/lib/gatekeeper/perms.db` or `sqlite::memory:`.
///
/// File databases are created when missing and run in WAL mode with foreign
/// keys and a 5-second busy timeout. In-memory databases are pinned to a
/// single connection that is never recycled, so every borrower sees the same
/// data.
pub async fn open_pool(url: &str) -> Result<Pool<Sqlite>, DatabaseError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool_options = if is_in_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let options = if is_in_memory(url) {
        options
    } else {
        options.journal_mode(SqliteJournalMode::Wal)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    info!(url = %redact(url), "Database opened");

    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Strip the query string from a connection descriptor before logging it.
pub fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Returns the current time as a Unix timestamp (seconds since epoch).
#[allow(clippy::cast_possible_wrap)]
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unix_timestamp_is_reasonable() {
        let ts = unix_timestamp();
        // Should be after 2024-01-01
        assert!(ts > 1_704_067_200);
    }

    #[test]
    fn memory_descriptors_are_detected() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:perms?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:/var/lib/gatekeeper/perms.db"));
    }

    #[test]
    fn redact_drops_query_string() {
        assert_eq!(redact("sqlite:perms.db?mode=rwc"), "sqlite:perms.db");
        assert_eq!(redact("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perms.db");
        let pool = open_pool(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        let row: (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(row.0, 1);
        assert!(path.exists());
        pool.close().await;
    }

    #[tokio::test]
    async fn unreachable_database_is_a_connection_error() {
        let err = open_pool("sqlite:/nonexistent-gatekeeper-dir/perms.db")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Connection(_)));
    }
}
