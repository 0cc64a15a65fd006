//! Upserts and reads for the `products` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{named_params, params, Row};

use crate::record::{ProductRecord, ProductStatus};

use super::{Database, DatabaseError};

const COLUMNS: &str = "code, status, imported_t, url, creator, created_t, last_modified_t,
    product_name, quantity, brands, categories, labels, cities, purchase_places, stores,
    ingredients_text, traces, serving_size, serving_quantity, nutriscore_score,
    nutriscore_grade, main_category, image_url";

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Corrupt {
            column: column.to_string(),
            reason: e.to_string(),
        })
}

/// Raw column values, before timestamp and status parsing.
struct ProductRow {
    status: String,
    imported_t: String,
    record: ProductRecord,
}

impl ProductRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let code: String = row.get("code")?;
        let mut record = ProductRecord::new(code, DateTime::<Utc>::UNIX_EPOCH);
        record.url = row.get("url")?;
        record.creator = row.get("creator")?;
        record.created_t = row.get("created_t")?;
        record.last_modified_t = row.get("last_modified_t")?;
        record.product_name = row.get("product_name")?;
        record.quantity = row.get("quantity")?;
        record.brands = row.get("brands")?;
        record.categories = row.get("categories")?;
        record.labels = row.get("labels")?;
        record.cities = row.get("cities")?;
        record.purchase_places = row.get("purchase_places")?;
        record.stores = row.get("stores")?;
        record.ingredients_text = row.get("ingredients_text")?;
        record.traces = row.get("traces")?;
        record.serving_size = row.get("serving_size")?;
        record.serving_quantity = row.get("serving_quantity")?;
        record.nutriscore_score = row.get("nutriscore_score")?;
        record.nutriscore_grade = row.get("nutriscore_grade")?;
        record.main_category = row.get("main_category")?;
        record.image_url = row.get("image_url")?;

        Ok(Self {
            status: row.get("status")?,
            imported_t: row.get("imported_t")?,
            record,
        })
    }

    fn into_record(self) -> Result<ProductRecord, DatabaseError> {
        let mut record = self.record;
        record.status = self
            .status
            .parse::<ProductStatus>()
            .map_err(|e| DatabaseError::Corrupt {
                column: "status".to_string(),
                reason: e.to_string(),
            })?;
        record.imported_t = parse_timestamp("imported_t", &self.imported_t)?;
        Ok(record)
    }
}

/// Inserts the record, or overwrites every attribute of the existing row
/// with the same `code`. There is never more than one row per code.
pub fn upsert(db: &Database, record: &ProductRecord) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO products (code, status, imported_t, url, creator, created_t,
             last_modified_t, product_name, quantity, brands, categories, labels, cities,
             purchase_places, stores, ingredients_text, traces, serving_size, serving_quantity,
             nutriscore_score, nutriscore_grade, main_category, image_url, created_at, updated_at)
             VALUES (:code, :status, :imported_t, :url, :creator, :created_t, :last_modified_t,
             :product_name, :quantity, :brands, :categories, :labels, :cities, :purchase_places,
             :stores, :ingredients_text, :traces, :serving_size, :serving_quantity,
             :nutriscore_score, :nutriscore_grade, :main_category, :image_url, :now, :now)
             ON CONFLICT(code) DO UPDATE SET
                status = excluded.status,
                imported_t = excluded.imported_t,
                url = excluded.url,
                creator = excluded.creator,
                created_t = excluded.created_t,
                last_modified_t = excluded.last_modified_t,
                product_name = excluded.product_name,
                quantity = excluded.quantity,
                brands = excluded.brands,
                categories = excluded.categories,
                labels = excluded.labels,
                cities = excluded.cities,
                purchase_places = excluded.purchase_places,
                stores = excluded.stores,
                ingredients_text = excluded.ingredients_text,
                traces = excluded.traces,
                serving_size = excluded.serving_size,
                serving_quantity = excluded.serving_quantity,
                nutriscore_score = excluded.nutriscore_score,
                nutriscore_grade = excluded.nutriscore_grade,
                main_category = excluded.main_category,
                image_url = excluded.image_url,
                updated_at = excluded.updated_at",
            named_params! {
                ":code": record.code,
                ":status": record.status.as_str(),
                ":imported_t": record.imported_t.to_rfc3339_opts(SecondsFormat::Micros, true),
                ":url": record.url,
                ":creator": record.creator,
                ":created_t": record.created_t,
                ":last_modified_t": record.last_modified_t,
                ":product_name": record.product_name,
                ":quantity": record.quantity,
                ":brands": record.brands,
                ":categories": record.categories,
                ":labels": record.labels,
                ":cities": record.cities,
                ":purchase_places": record.purchase_places,
                ":stores": record.stores,
                ":ingredients_text": record.ingredients_text,
                ":traces": record.traces,
                ":serving_size": record.serving_size,
                ":serving_quantity": record.serving_quantity,
                ":nutriscore_score": record.nutriscore_score,
                ":nutriscore_grade": record.nutriscore_grade,
                ":main_category": record.main_category,
                ":image_url": record.image_url,
                ":now": now,
            },
        )?;
        Ok(())
    })
}

/// Finds a product by its code.
pub fn find_by_code(db: &Database, code: &str) -> Result<Option<ProductRecord>, DatabaseError> {
    let row = db.with_conn(|conn| {
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM products WHERE code = ?1", COLUMNS))?;
        let mut rows = stmt.query_map(params![code], ProductRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })?;
    row.map(ProductRow::into_record).transpose()
}

/// Counts all stored products.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;
        Ok(count)
    })
}

/// Lists products in insertion order, for paginated reindexing.
pub fn list(db: &Database, limit: u64, offset: u64) -> Result<Vec<ProductRecord>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM products ORDER BY id ASC LIMIT ?1 OFFSET ?2",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], ProductRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;
    rows.into_iter().map(ProductRow::into_record).collect()
}

/// Most recently imported products first.
pub fn recent(db: &Database, limit: u64) -> Result<Vec<ProductRecord>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM products ORDER BY imported_t DESC, id DESC LIMIT ?1",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![limit as i64], ProductRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;
    rows.into_iter().map(ProductRow::into_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample(code: &str, name: &str) -> ProductRecord {
        let mut record = ProductRecord::new(code, Utc::now());
        record.product_name = Some(name.to_string());
        record.serving_quantity = Some(30.0);
        record.nutriscore_grade = Some("b".to_string());
        record
    }

    #[test]
    fn test_upsert_and_find() {
        let db = test_db();
        upsert(&db, &sample("123", "Oat milk")).unwrap();

        let found = find_by_code(&db, "123").unwrap().unwrap();
        assert_eq!(found.product_name.as_deref(), Some("Oat milk"));
        assert_eq!(found.status, ProductStatus::Draft);
        assert_eq!(found.serving_quantity, Some(30.0));
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_code(&db, "missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_overwrites_same_code() {
        let db = test_db();
        upsert(&db, &sample("123", "Oat milk")).unwrap();

        let mut second = sample("123", "Oat drink");
        second.nutriscore_grade = None;
        upsert(&db, &second).unwrap();

        assert_eq!(count(&db).unwrap(), 1);
        let found = find_by_code(&db, "123").unwrap().unwrap();
        assert_eq!(found.product_name.as_deref(), Some("Oat drink"));
        assert!(found.nutriscore_grade.is_none());
    }

    #[test]
    fn test_upsert_resets_status_to_draft() {
        let db = test_db();
        let mut published = sample("9", "Bread");
        published.status = ProductStatus::Published;
        upsert(&db, &published).unwrap();
        assert_eq!(
            find_by_code(&db, "9").unwrap().unwrap().status,
            ProductStatus::Published
        );

        upsert(&db, &sample("9", "Bread")).unwrap();
        assert_eq!(
            find_by_code(&db, "9").unwrap().unwrap().status,
            ProductStatus::Draft
        );
    }

    #[test]
    fn test_list_paginates_in_insertion_order() {
        let db = test_db();
        for i in 0..5 {
            upsert(&db, &sample(&format!("c{}", i), "x")).unwrap();
        }

        let first = list(&db, 2, 0).unwrap();
        let rest = list(&db, 10, 2).unwrap();
        assert_eq!(
            first.iter().map(|r| r.code.as_str()).collect::<Vec<_>>(),
            vec!["c0", "c1"]
        );
        assert_eq!(rest.len(), 3);
    }

    #[test]
    fn test_recent_orders_by_import_time() {
        let db = test_db();
        let base = Utc::now();
        for (i, code) in ["old", "newest", "mid"].iter().enumerate() {
            let offset = [0, 120, 60][i];
            let record = ProductRecord::new(*code, base + chrono::Duration::seconds(offset));
            upsert(&db, &record).unwrap();
        }

        let codes: Vec<String> = recent(&db, 2).unwrap().into_iter().map(|r| r.code).collect();
        assert_eq!(codes, vec!["newest", "mid"]);
    }
}
