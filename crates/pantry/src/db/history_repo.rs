//! Persistence for `import_histories` rows.

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

/// A raw import history row from the database.
#[derive(Debug, Clone)]
pub struct ImportHistoryRow {
    pub id: String,
    pub filename: String,
    pub status: String,
    pub total_records: u64,
    pub imported_records: u64,
    pub failed_records: u64,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ImportHistoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            status: row.get("status")?,
            total_records: row.get("total_records")?,
            imported_records: row.get("imported_records")?,
            failed_records: row.get("failed_records")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            error_message: row.get("error_message")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

fn insert_row(conn: &Connection, row: &ImportHistoryRow) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO import_histories (id, filename, status, total_records, imported_records,
         failed_records, started_at, finished_at, error_message, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            row.id,
            row.filename,
            row.status,
            row.total_records as i64,
            row.imported_records as i64,
            row.failed_records as i64,
            row.started_at,
            row.finished_at,
            row.error_message,
            row.created_at,
            row.updated_at,
        ],
    )?;
    Ok(())
}

fn update_row(conn: &Connection, row: &ImportHistoryRow) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE import_histories SET status=?2, total_records=?3, imported_records=?4,
         failed_records=?5, started_at=?6, finished_at=?7, error_message=?8, updated_at=?9
         WHERE id=?1",
        params![
            row.id,
            row.status,
            row.total_records as i64,
            row.imported_records as i64,
            row.failed_records as i64,
            row.started_at,
            row.finished_at,
            row.error_message,
            row.updated_at,
        ],
    )?;
    Ok(())
}

/// Inserts a new history row.
pub fn insert(db: &Database, row: &ImportHistoryRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| Ok(insert_row(conn, row)?))
}

/// Inserts `created` and applies `next` to it in one transaction. Either
/// both writes land or the row never exists.
pub fn insert_then_update(
    db: &Database,
    created: &ImportHistoryRow,
    next: &ImportHistoryRow,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        insert_row(&tx, created)?;
        update_row(&tx, next)?;
        tx.commit()?;
        Ok(())
    })
}

/// Updates an existing row. All fields except `id`, `filename` and
/// `created_at` are overwritten.
pub fn update(db: &Database, row: &ImportHistoryRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| Ok(update_row(conn, row)?))
}

/// Finds a history row by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ImportHistoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM import_histories WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ImportHistoryRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Most recent rows first.
pub fn recent(db: &Database, limit: u64) -> Result<Vec<ImportHistoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM import_histories ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], ImportHistoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts rows with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM import_histories WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
