//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the sales database file and applies pending migrations.
///
/// Missing parent directories are created first.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let result = ensure_parent_dir(path)
        .and_then(|()| Connection::open(path).map_err(DbError::from))
        .and_then(|mut conn| bootstrap_connection(&mut conn).map(|()| conn));
    log_outcome("file", started_at, &result);
    result
}

/// Opens an in-memory database with the full schema applied.
///
/// Used by tests and by `:memory:` connection strings.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| bootstrap_connection(&mut conn).map(|()| conn));
    log_outcome("memory", started_at, &result);
    result
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}

fn log_outcome(mode: &str, started_at: Instant, result: &DbResult<Connection>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error={err}"
        ),
    }
}
