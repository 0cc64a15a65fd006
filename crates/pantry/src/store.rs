//! Canonical record storage seen by the import pipeline.

use crate::db::{product_repo, Database, DatabaseError};
use crate::record::ProductRecord;

/// Keyed storage of canonical records.
///
/// Calls are blocking; async callers should run them on a blocking thread.
pub trait RecordStore: Send + Sync {
    /// Inserts or fully overwrites the record with the same code.
    fn upsert(&self, record: &ProductRecord) -> Result<(), DatabaseError>;

    fn find(&self, code: &str) -> Result<Option<ProductRecord>, DatabaseError>;

    fn count(&self) -> Result<u64, DatabaseError>;

    /// One page of all stored records, in a stable order.
    fn all_paginated(&self, limit: u64, offset: u64) -> Result<Vec<ProductRecord>, DatabaseError>;
}

/// [`RecordStore`] backed by the `products` table.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl RecordStore for SqliteRecordStore {
    fn upsert(&self, record: &ProductRecord) -> Result<(), DatabaseError> {
        product_repo::upsert(&self.db, record)
    }

    fn find(&self, code: &str) -> Result<Option<ProductRecord>, DatabaseError> {
        product_repo::find_by_code(&self.db, code)
    }

    fn count(&self) -> Result<u64, DatabaseError> {
        product_repo::count(&self.db)
    }

    fn all_paginated(&self, limit: u64, offset: u64) -> Result<Vec<ProductRecord>, DatabaseError> {
        product_repo::list(&self.db, limit, offset)
    }
}
