//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

// Catalog requests are read-only and mostly wait on directory scans, so a
// handful of connections is plenty.
const MAX_CONNECTIONS: u32 = 5;

/// Read-only connection pool for a Calibre `metadata.db`.
///
/// The catalog never writes to the library: file-backed databases are opened
/// with `SQLITE_OPEN_READONLY`, and in-memory fixtures switch to
/// `PRAGMA query_only` once loaded. Concurrent requests each borrow their own
/// connection, so there is no write contention to manage.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, pool: SqlitePoolOptions) -> Result<Self> {
        let pool = pool
            // This is IMPORTANT to apply the query-based PRAGMAs to EVERY
            // connection (set by max connections) instead of only the
            // first connection returned by the pool.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Self { pool })
    }

    /// Open the library database at the given path.
    ///
    /// The file must already exist; the catalog has no business creating an
    /// empty library.
    #[instrument("opening library database", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::base_options()
            .filename(path.as_ref())
            .read_only(true)
            .create_if_missing(false);
        Self::new(options, SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)).await
    }

    /// Create an in-memory database populated by the given SQL script (useful
    /// for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory(script: &str) -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // In-memory database must be limited to one connection, and that
        // connection must never be recycled. Otherwise the pool hands out a
        // fresh (empty) database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        let db = Self::new(options, pool).await?;
        db.load_script(script).await?;
        Ok(db)
    }

    /// Base connection options shared between file and in-memory databases.
    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // PRAGMA busy_timeout = 1500ms
            // Calibre itself may hold a write lock while the catalog is
            // being browsed.
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
                PRAGMA mmap_size = 33554432;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("loading database script", skip_all)]
    async fn load_script(&self, script: &str) -> Result<()> {
        sqlx::raw_sql(script).execute(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        // Only now that the fixture exists does the connection become read-only.
        sqlx::query("PRAGMA query_only = ON")
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// This is useful for running custom queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. After calling this, the Database instance should not
    /// be used.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
