//! Canonical product record and its mapping from decoded source objects.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::extract::RawRecord;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("Product code is required")]
    MissingCode,

    #[error("Unknown product status: {0}")]
    UnknownStatus(String),
}

/// Publication state of a product. Imports always write `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
    Trash,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
            ProductStatus::Trash => "trash",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "published" => Ok(ProductStatus::Published),
            "trash" => Ok(ProductStatus::Trash),
            other => Err(RecordError::UnknownStatus(other.to_string())),
        }
    }
}

/// A product as stored in the catalog, keyed by `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub code: String,
    pub status: ProductStatus,
    pub imported_t: DateTime<Utc>,
    pub url: Option<String>,
    pub creator: Option<String>,
    pub created_t: Option<i64>,
    pub last_modified_t: Option<i64>,
    pub product_name: Option<String>,
    pub quantity: Option<String>,
    pub brands: Option<String>,
    pub categories: Option<String>,
    pub labels: Option<String>,
    pub cities: Option<String>,
    pub purchase_places: Option<String>,
    pub stores: Option<String>,
    pub ingredients_text: Option<String>,
    pub traces: Option<String>,
    pub serving_size: Option<String>,
    pub serving_quantity: Option<f64>,
    pub nutriscore_score: Option<i64>,
    pub nutriscore_grade: Option<String>,
    pub main_category: Option<String>,
    pub image_url: Option<String>,
}

impl ProductRecord {
    /// Creates a draft record with only an identifier set.
    pub fn new(code: impl Into<String>, imported_t: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            status: ProductStatus::Draft,
            imported_t,
            url: None,
            creator: None,
            created_t: None,
            last_modified_t: None,
            product_name: None,
            quantity: None,
            brands: None,
            categories: None,
            labels: None,
            cities: None,
            purchase_places: None,
            stores: None,
            ingredients_text: None,
            traces: None,
            serving_size: None,
            serving_quantity: None,
            nutriscore_score: None,
            nutriscore_grade: None,
            main_category: None,
            image_url: None,
        }
    }

    /// Maps a decoded source object onto a draft record.
    ///
    /// Only `code` is required. Attribute values are coerced loosely: numbers
    /// become text where text is expected, numeric strings become numbers,
    /// and anything else is dropped.
    pub fn from_raw(raw: &RawRecord, imported_t: DateTime<Utc>) -> Result<Self, RecordError> {
        let code = extract_code(raw).ok_or(RecordError::MissingCode)?;

        Ok(Self {
            code,
            status: ProductStatus::Draft,
            imported_t,
            url: text(raw, "url"),
            creator: text(raw, "creator"),
            created_t: integer(raw, "created_t"),
            last_modified_t: integer(raw, "last_modified_t"),
            product_name: text(raw, "product_name"),
            quantity: text(raw, "quantity"),
            brands: text(raw, "brands"),
            categories: text(raw, "categories"),
            labels: text(raw, "labels"),
            cities: text(raw, "cities"),
            purchase_places: text(raw, "purchase_places"),
            stores: text(raw, "stores"),
            ingredients_text: text(raw, "ingredients_text"),
            traces: text(raw, "traces"),
            serving_size: text(raw, "serving_size"),
            serving_quantity: float(raw, "serving_quantity"),
            nutriscore_score: integer(raw, "nutriscore_score"),
            nutriscore_grade: text(raw, "nutriscore_grade"),
            main_category: text(raw, "main_category"),
            image_url: text(raw, "image_url"),
        })
    }
}

/// Reads the identifier, which upstream files carry as a string or a number.
pub fn extract_code(raw: &RawRecord) -> Option<String> {
    match raw.get("code")? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(raw: &RawRecord, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer(raw: &RawRecord, key: &str) -> Option<i64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn float(raw: &RawRecord, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
