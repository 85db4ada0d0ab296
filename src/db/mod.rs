use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::AppResult;

pub mod migrations;

pub mod repositories;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Handle to the scheduling database. Connections are opened per call; SQLite
/// in WAL mode with a busy timeout handles the single-writer access pattern
/// the scheduling service relies on.
#[derive(Clone, Debug)]
pub struct DbPool {
    path: PathBuf,
}

impl DbPool {
    pub fn new<P: Into<PathBuf>>(path: P) -> AppResult<Self> {
        let path = path.into();
        info!(target: "app::db", db_path = %path.display(), "initializing scheduling database");
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let pool = Self { path };
        // Open once eagerly so schema and migration failures surface here
        // instead of on the first scheduling operation.
        pool.get_connection()?;
        Ok(pool)
    }

    pub fn get_connection(&self) -> AppResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", &1)?;
        conn.pragma_update(None, "journal_mode", &"WAL")?;
        conn.execute_batch(SCHEMA_SQL)?;
        migrations::run(&conn)?;
        debug!(target: "app::db", db_path = %self.path.display(), "connection ready");
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn pool_bootstraps_schema_and_migrations() -> AppResult<()> {
        let dir = tempdir().expect("temp dir");
        let pool = DbPool::new(dir.path().join("scheduler.sqlite"))?;

        // Reopening must be idempotent: schema and migrations already applied.
        let conn = pool.get_connection()?;
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        assert_eq!(version, 2);

        let items: i64 =
            conn.query_row("SELECT COUNT(*) FROM schedule_items", [], |row| row.get(0))?;
        assert_eq!(items, 0);
        Ok(())
    }
}
