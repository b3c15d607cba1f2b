//! # Release Database
//!
//! Opens the SQLite database that holds ingested releases and brings its
//! schema up to date.
//!
//! Every pool returned from here has:
//! - foreign keys enforced, so deleting a release drops its attribute rows
//! - the embedded migrations applied
//! - answered one round trip before being handed out
//!
//! File databases run in WAL mode and are created on first use.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("catalog.db")).await?;
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the release database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// Private to the pool's single connection; gone when the pool closes
    Memory,
}

/// How to open the release database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub location: DatabaseLocation,
    pub max_connections: u32,
    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// File database at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DatabaseLocation::File(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// In-memory database
    ///
    /// The database lives only as long as its connection, so the pool holds
    /// exactly one connection and never retires it.
    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
        }
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = match &self.location {
            DatabaseLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            DatabaseLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
        };

        Ok(options.foreign_keys(true).busy_timeout(self.busy_timeout))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().max_connections(self.max_connections);

        match self.location {
            DatabaseLocation::File(_) => options,
            DatabaseLocation::Memory => options
                .min_connections(1)
                .max_lifetime(None)
                .idle_timeout(None),
        }
    }
}

/// Open the release database and apply pending migrations
///
/// # Errors
///
/// [`LibraryError::Database`] if the database cannot be opened or does not
/// answer, [`LibraryError::Migration`] if the schema cannot be brought up to
/// date.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool> {
    info!(
        location = ?config.location,
        max_connections = config.max_connections,
        "Opening release database"
    );

    let pool = config
        .pool_options()
        .connect_with(config.connect_options()?)
        .await
        .map_err(|e| {
            warn!(error = %e, "Could not open release database");
            LibraryError::Database(e)
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        warn!(error = %e, "Schema migration failed");
        LibraryError::Migration(e.to_string())
    })?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    debug!(connections = pool.size(), "Release database ready");

    Ok(pool)
}

/// Fresh in-memory database with the schema applied
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(DatabaseConfig::in_memory()).await
}
