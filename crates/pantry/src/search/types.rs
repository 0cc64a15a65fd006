use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::record::{ProductRecord, ProductStatus};

/// The indexed subset of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub code: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub labels: Option<String>,
    #[serde(default)]
    pub ingredients_text: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub stores: Option<String>,
    #[serde(default)]
    pub nutriscore_grade: Option<String>,
    #[serde(default)]
    pub imported_t: Option<String>,
}

impl From<&ProductRecord> for SearchDocument {
    fn from(record: &ProductRecord) -> Self {
        Self {
            code: record.code.clone(),
            status: record.status,
            product_name: record.product_name.clone(),
            brands: record.brands.clone(),
            categories: record.categories.clone(),
            labels: record.labels.clone(),
            ingredients_text: record.ingredients_text.clone(),
            quantity: record.quantity.clone(),
            stores: record.stores.clone(),
            nutriscore_grade: record.nutriscore_grade.clone(),
            imported_t: Some(record.imported_t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: Option<f64>,
    pub document: SearchDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self {
            total: 0,
            hits: Vec::new(),
        }
    }
}

/// Result of a cluster health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub available: bool,
    pub status: String,
}

impl HealthStatus {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            status: "unavailable".to_string(),
        }
    }
}
