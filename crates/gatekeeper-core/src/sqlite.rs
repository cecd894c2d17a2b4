//! SQLite-backed [`Connector`] for the permission store.

use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::connection::Connector;
use crate::db::{self, DatabaseError};

/// Collection holding permission records.
pub const PERMISSIONS: &str = "permissions";

const COLLECTIONS: &[&str] = &[PERMISSIONS];

/// A named table borrowed from the live pool.
#[derive(Debug, Clone)]
pub struct Collection {
    name: &'static str,
    pool: Pool<Sqlite>,
}

impl Collection {
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

/// Opens a pool from a connection descriptor and runs migrations on connect.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    url: String,
}

impl SqliteConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Connector for a private in-memory database (for testing).
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }
}

impl Connector for SqliteConnector {
    type Handle = Pool<Sqlite>;
    type Resource = Collection;

    async fn connect(&self) -> Result<Pool<Sqlite>, DatabaseError> {
        let pool = db::open_pool(&self.url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Permission store migrations complete");
        Ok(pool)
    }

    fn resource(&self, handle: &Pool<Sqlite>, name: &str) -> Result<Collection, DatabaseError> {
        let name = COLLECTIONS
            .iter()
            .copied()
            .find(|known| *known == name)
            .ok_or_else(|| DatabaseError::NotFound(format!("Collection {name}")))?;
        Ok(Collection {
            name,
            pool: handle.clone(),
        })
    }

    async fn close(&self, handle: Pool<Sqlite>) -> Result<(), DatabaseError> {
        handle.close().await;
        Ok(())
    }
}
