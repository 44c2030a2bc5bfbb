//! SQLite persistence module
//!
//! Repository pattern over a single SQLite database.

pub mod repos;
pub mod schema;

use crate::error::PersistenceResult;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Open (creating if missing) the database at `path`.
///
/// WAL mode plus a busy timeout: writers from different pool connections
/// queue at the database write lock instead of failing fast.
pub async fn connect(path: impl AsRef<Path>) -> PersistenceResult<SqlitePool> {
    debug!(path = %path.as_ref().display(), "opening database");
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> PersistenceResult<()> {
    for statement in schema::SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
