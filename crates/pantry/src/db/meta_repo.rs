//! Key/value store for small pieces of run state (`pantry_meta`).

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};

/// Key under which the last successful batch run timestamp is kept.
pub const LAST_BATCH_EXECUTION: &str = "last_batch_execution";

/// Reads a value by key.
pub fn get(db: &Database, key: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let value = conn
            .query_row(
                "SELECT value FROM pantry_meta WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    })
}

/// Writes a value, replacing any previous one.
pub fn set(db: &Database, key: &str, value: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO pantry_meta (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let db = Database::open_in_memory().unwrap();
        assert!(get(&db, LAST_BATCH_EXECUTION).unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let db = Database::open_in_memory().unwrap();
        set(&db, LAST_BATCH_EXECUTION, "2026-01-01T03:00:00Z").unwrap();
        set(&db, LAST_BATCH_EXECUTION, "2026-01-02T03:00:00Z").unwrap();

        assert_eq!(
            get(&db, LAST_BATCH_EXECUTION).unwrap().as_deref(),
            Some("2026-01-02T03:00:00Z")
        );
    }
}
