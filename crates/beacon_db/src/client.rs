//! Database client for Beacon
//!
//! This module provides a database client that is designed to be database agnostic,
//! using SQLx's `Any` driver as the underlying database library. The client owns
//! a connection pool; stores borrow connections from it per operation, and the
//! pool re-establishes dropped connections on demand.

use crate::error::DbError;
use beacon_config::{AppConfig, DatabaseConfig};
use sqlx::any::AnyConnectOptions;
use sqlx::pool::PoolOptions;
use sqlx::{Pool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database transaction
pub type DbTransaction<'a> = Transaction<'a, sqlx::Any>;

/// Default upper bound of pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// The database engine behind a URL.
///
/// Only the DDL differs between engines; all queries are portable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Sqlite,
    Postgres,
}

impl DbBackend {
    /// Determines the backend from a database URL
    pub fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.starts_with("sqlite:") {
            Ok(DbBackend::Sqlite)
        } else if db_url.starts_with("postgres://") || db_url.starts_with("postgresql://") {
            Ok(DbBackend::Postgres)
        } else {
            Err(DbError::UrlError(format!(
                "Unsupported database URL scheme: {}",
                db_url.split(':').next().unwrap_or_default()
            )))
        }
    }

    /// Column definition for an auto-incrementing 64-bit primary key
    pub fn id_column(&self) -> &'static str {
        match self {
            DbBackend::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
            DbBackend::Postgres => "id BIGSERIAL PRIMARY KEY",
        }
    }
}

/// Database client for Beacon
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
    backend: DbBackend,
}

impl DbClient {
    /// Create a new database client from the application configuration
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The database configuration is missing
    /// * The database URL is missing or unsupported
    /// * The database connection fails
    pub async fn new(config: &AppConfig) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;

        Self::from_config(db_config).await
    }

    /// Create a new database client from a database configuration
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }

        Self::connect(
            &db_config.url,
            db_config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        )
        .await
    }

    /// Create a new database client from a database URL
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }

        Self::connect(db_url, DEFAULT_MAX_CONNECTIONS).await
    }

    async fn connect(db_url: &str, max_connections: u32) -> Result<Self, DbError> {
        let backend = DbBackend::from_url(db_url)?;
        let pool = Self::create_pool(db_url, backend, max_connections).await?;
        Ok(Self { pool, backend })
    }

    /// Create a connection pool
    ///
    /// An in-memory SQLite database lives only as long as its connection, so
    /// such pools hold exactly one connection that is never retired.
    async fn create_pool(
        db_url: &str,
        backend: DbBackend,
        max_connections: u32,
    ) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating {:?} database pool", backend);

        sqlx::any::install_default_drivers();

        let in_memory = backend == DbBackend::Sqlite && is_sqlite_memory(db_url);

        let mut pool_options = PoolOptions::<sqlx::Any>::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600));

        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else if backend == DbBackend::Sqlite {
            ensure_sqlite_file(db_url)?;
        }

        let connect_options = AnyConnectOptions::from_str(db_url)
            .map_err(|e| DbError::UrlError(e.to_string()))?;

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// The engine this client talks to
    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    /// Begin a transaction
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionAborted`] when no connection can be
    /// acquired or the transaction cannot be started.
    pub async fn begin(&self) -> Result<DbTransaction<'static>, DbError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionAborted(e.to_string()))
    }

    /// Execute a statement that returns no rows, returning the affected row count
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database is healthy
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient({:?})", self.backend)
    }
}

fn is_sqlite_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// Strips the scheme and query string from a SQLite URL.
fn sqlite_path(db_url: &str) -> &str {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
        .unwrap_or(db_url);
    path.split('?').next().unwrap_or(path)
}

/// SQLite refuses to open a missing file by default; create it and its
/// directory up front.
fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
    let path = Path::new(sqlite_path(db_url));
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory for SQLite database: {}", e);
            DbError::PoolError(format!("Failed to create directory: {}", e))
        })?;
    }

    debug!("Creating empty SQLite database file: {}", path.display());
    std::fs::File::create(path).map_err(|e| {
        error!("Failed to create SQLite database file: {}", e);
        DbError::PoolError(format!("Failed to create database file: {}", e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_from_url() {
        assert_eq!(DbBackend::from_url("sqlite::memory:").unwrap(), DbBackend::Sqlite);
        assert_eq!(
            DbBackend::from_url("postgres://u:p@localhost/db").unwrap(),
            DbBackend::Postgres
        );
        assert_eq!(
            DbBackend::from_url("postgresql://localhost/db").unwrap(),
            DbBackend::Postgres
        );
        assert!(matches!(
            DbBackend::from_url("mysql://localhost/db"),
            Err(DbError::UrlError(_))
        ));
    }

    #[test]
    fn sqlite_paths() {
        assert_eq!(sqlite_path("sqlite://data/beacon.db"), "data/beacon.db");
        assert_eq!(sqlite_path("sqlite:beacon.db?mode=rwc"), "beacon.db");
        assert!(is_sqlite_memory("sqlite::memory:"));
        assert!(is_sqlite_memory("sqlite:file:test?mode=memory&cache=shared"));
    }

    #[tokio::test]
    async fn in_memory_client_is_healthy() {
        let client = DbClient::from_url("sqlite::memory:").await.unwrap();
        assert!(client.is_healthy().await);
        assert_eq!(client.backend(), DbBackend::Sqlite);
    }
}
