//! Connection pool creation.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a reader waits on a writer's lock, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when creating the database pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Failed to build the connection pool.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Puts a fresh connection in WAL mode so that feed readers never block
/// event producers, and sets the busy timeout.
///
/// In-memory databases cannot use WAL and report `memory`; that is accepted.
fn init_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("audit log needs WAL journal mode, got: {journal_mode}")),
        ));
    }
    conn.execute_batch(&format!("PRAGMA busy_timeout = {busy_timeout_ms};"))
}

/// Creates the pool shared by the directory and the event store.
///
/// `db_path` may be `:memory:`, but every pooled connection then gets its
/// own private database. Tests that share state across connections should
/// use a file.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the first connection cannot be opened.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let busy_timeout_ms = settings.busy_timeout_ms;
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(move |conn| init_connection(conn, busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        pool_max_size = settings.pool_max_size,
        "database pool ready"
    );

    Ok(pool)
}
