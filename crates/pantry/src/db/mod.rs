//! Catalog storage: products, import history and run metadata.
//!
//! One rusqlite connection per process behind a `Mutex`. Every repository
//! function borrows it through [`Database::with_conn`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

pub mod error;
pub mod history_repo;
pub mod meta_repo;
pub mod migrations;
pub mod product_repo;

pub use error::DatabaseError;

/// How long a writer waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the catalog database.
///
/// Clones share one connection. Sync only; async callers go through
/// `spawn_blocking`.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database file, creating parent directories and applying
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self::prepare(conn)?;

        log::info!("Catalog database ready at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the connection locked.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }

    /// True if a trivial query succeeds.
    pub fn check_read(&self) -> bool {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
            Ok(())
        })
        .is_ok()
    }

    /// True if a write lock can be taken. Nothing is written.
    pub fn check_write(&self) -> bool {
        self.with_conn(|conn| {
            conn.execute_batch("BEGIN IMMEDIATE; ROLLBACK;")?;
            Ok(())
        })
        .is_ok()
    }
}

/// Returns the canonical database path: `~/.pantry/data/pantry.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".pantry").join("data").join("pantry.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_has_catalog_tables() {
        let db = Database::open_in_memory().unwrap();
        let tables: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |r| r.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .unwrap();
        assert!(tables.contains(&"products".to_string()));
        assert!(tables.contains(&"import_histories".to_string()));
        assert!(tables.contains(&"pantry_meta".to_string()));
    }

    #[test]
    fn test_open_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");
        let db = Database::open(&path).unwrap();
        assert!(db.check_read());
        assert!(path.exists());
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path().unwrap();
        assert!(path.ends_with("pantry.db"));
        assert!(path.to_string_lossy().contains(".pantry"));
    }

    #[test]
    fn test_read_write_checks() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.check_read());
        assert!(db.check_write());
    }

    #[test]
    fn test_clones_share_connection() {
        let db = Database::open_in_memory().unwrap();
        meta_repo::set(&db.clone(), "k", "v").unwrap();
        assert_eq!(meta_repo::get(&db, "k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pantry.db");
        meta_repo::set(&Database::open(&path).unwrap(), "k", "v").unwrap();

        let reopened = Database::open(&path).unwrap();
        assert_eq!(meta_repo::get(&reopened, "k").unwrap().as_deref(), Some("v"));
    }
}
