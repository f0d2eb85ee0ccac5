//! # Connection Pool & Database Handle
//!
//! Opens the SQLite file, applies the pragmas the schema relies on, and
//! hands out repositories.
//!
//! Three kinds of callers share this handle: request handlers reading
//! dashboards, the reconciliation paths writing sales, and the seed
//! tool. The journal runs in WAL mode so dashboard reads never wait on
//! a sale being written. Writes still serialize at the store, which is
//! exactly what the stock counter needs: two simultaneous sales against
//! one product are applied one after the other and can never race the
//! counter below zero.
//!
//! Foreign keys are switched on explicitly. SQLite leaves them off by
//! default, and without them the SET NULL rule that preserves the sales
//! history across a product delete would silently do nothing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::branch::BranchRepository;
use crate::repository::product::ProductRepository;
use crate::repository::report::ReportRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for [`Database::new`].
///
/// `DbConfig::new(path)` picks defaults suited to a small shop backend
/// (five connections, 30s acquire timeout, migrations on connect); the
/// builder methods override individual settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, created on first connect.
    pub database_path: PathBuf,

    /// Pool size ceiling. Five covers a handful of concurrent request
    /// handlers; raise it if the dashboard fan-out grows.
    pub max_connections: u32,

    /// Connections kept warm between requests.
    pub min_connections: u32,

    /// How long an acquire may wait before failing with `PoolExhausted`.
    pub connect_timeout: Duration,

    /// Idle time before a spare connection is dropped.
    pub idle_timeout: Duration,

    /// Apply pending migrations during `Database::new`. Disable when an
    /// external process owns the schema.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Defaults for a database file at `path`.
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

    /// Overrides the pool size ceiling.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Overrides the warm-connection floor.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Overrides the acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Controls whether `Database::new` applies pending migrations.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Configuration for an isolated in-memory database.
    ///
    /// Every test gets a fresh schema and nothing touches disk. The pool
    /// is pinned to a single connection because each `:memory:`
    /// connection would otherwise open its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to an open Tally database.
///
/// Owns the pool and vends repositories; clones share the pool, so
/// handing one to each request handler is free.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database described by `config`,
    /// applies the pragmas, and runs pending migrations unless the
    /// config says otherwise.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // mode=rwc: read-write, create the file on first open
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            // Dashboard reads proceed while a sale commits
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL is corruption-safe under WAL; at worst the final
            // commit before a power cut is lost
            .synchronous(SqliteSynchronous::Normal)
            // Required for the schema's SET NULL / CASCADE rules
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
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

    /// Applies pending migrations. `new()` already does this unless the
    /// config opted out.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// The raw pool, for one-off queries the repositories don't cover
    /// (migration status, diagnostics).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Branch CRUD.
    pub fn branches(&self) -> BranchRepository {
        BranchRepository::new(self.pool.clone())
    }

    /// Product catalogue and stock adjustments.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Sale recording and the stock reconciliation around it.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Accounts, groups, and shopkeeper permissions.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Revenue/profit aggregation for the dashboards.
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Closes the pool; every repository call afterwards fails.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// True when the store still answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }
}
