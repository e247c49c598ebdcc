//! # Connection Pool
//!
//! One [`Database`] per process, shared by every service. All ledger writes
//! go through [`Database::begin`]; reads borrow a connection with
//! [`Database::acquire`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig ──► Database::new ──► SqlitePool ──► migrations applied      │
//! │                                     │                                   │
//! │           ┌─────────────────────────┴──────────────────────┐            │
//! │           ▼                                                ▼            │
//! │   begin(): one sale / payment / order            acquire(): balance,    │
//! │   with its credit entry, stock and offer use     listings, summaries    │
//! │   committed together                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A file-backed ledger uses WAL so balance reads keep going while a sale is
//! being written. Every ledger operation reads before it writes, so
//! [`Database::begin`] takes the write lock up front with `BEGIN IMMEDIATE`.
//! A deferred transaction that later tries to upgrade gets SQLITE_BUSY
//! straight away; an immediate one waits on `busy_timeout` for the current
//! writer to finish.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;

const MEMORY: &str = ":memory:";

/// Where the ledger lives and how the pool around it is sized.
///
/// ```rust,ignore
/// let config = DbConfig::new("./khata.db").max_connections(8);
/// let db = Database::new(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// How long a caller waits for a pooled connection.
    pub connect_timeout: Duration,
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A private, empty ledger for tests.
    ///
    /// The data lives only as long as its single connection, so the pool is
    /// pinned at one connection that never idles out or expires. Callers
    /// must release a connection before asking for another.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            ..DbConfig::new(MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens the pool without touching the schema.
    pub fn skip_migrations(mut self) -> Self {
        self.run_migrations = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            // Parsed per call: every in-memory pool gets its own database
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // Credit entries and order lines rely on FK enforcement
        Ok(options.foreign_keys(true).busy_timeout(self.busy_timeout))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(1)
            .acquire_timeout(self.connect_timeout);

        if self.is_in_memory() {
            options.idle_timeout(None).max_lifetime(None)
        } else {
            options
                .idle_timeout(Duration::from_secs(10 * 60))
                .max_lifetime(Duration::from_secs(30 * 60))
        }
    }
}

/// Shared handle to the ledger database. Cheap to clone.
///
/// Repositories hold no state. A service opens a transaction here and hands
/// it to every repository call that belongs to the same operation:
///
/// ```rust,ignore
/// let mut tx = db.begin().await?;
/// SaleRepository::insert(&mut tx, &sale).await?;
/// CreditRepository::insert(&mut tx, &entry).await?;
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the ledger and brings its schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening ledger database"
        );

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        } else {
            debug!("Migrations skipped");
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts the write transaction for one ledger operation, holding the
    /// database write lock until it ends. Dropping it without `commit()`
    /// rolls everything back.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub async fn acquire(&self) -> DbResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    pub async fn close(&self) {
        info!("Closing ledger database");
        self.pool.close().await;
    }

    /// True if the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_ledger_opens_with_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(sales, 0);
    }

    #[tokio::test]
    async fn test_each_in_memory_ledger_is_private() {
        let first = Database::new(DbConfig::in_memory()).await.unwrap();
        let second = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query(
            "INSERT INTO shops (id, name, owner_id, created_at) \
             VALUES ('shop-1', 'Kirana', 'owner-1', '2024-04-01T09:00:00+00:00')",
        )
        .execute(first.pool())
        .await
        .unwrap();

        let visible: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops")
            .fetch_one(second.pool())
            .await
            .unwrap();
        assert_eq!(visible, 0);
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_transactions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(db.begin().await.is_err());
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_file_config_builder() {
        let config = DbConfig::new("/var/lib/khata/shop.db")
            .max_connections(8)
            .busy_timeout(Duration::from_secs(2))
            .skip_migrations();

        assert!(!config.is_in_memory());
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_secs(2));
        assert!(!config.run_migrations);
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
