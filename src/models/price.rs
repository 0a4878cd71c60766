//! Competitor price record models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// A competitor price captured via OCR
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub id: i32,
    pub competitor: String,
    pub product_name: String,
    pub price: f64,
    pub currency: String,
    pub raw_text: Option<String>,
    pub image_sha256: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceRecord {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            competitor: row.get("competitor"),
            product_name: row.get("product_name"),
            price: row.get("price"),
            currency: row.get("currency"),
            raw_text: row.get("raw_text"),
            image_sha256: row.get("image_sha256"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Capture result returned to the caller
///
/// `id` is present only when the row was persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCapture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub competitor: String,
    pub product_name: String,
    pub price: f64,
    pub currency: String,
    pub raw_text: String,
    pub image_sha256: String,
}

/// Request to manually correct an OCR'd price record
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriceRecordRequest {
    pub product_name: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Query parameters for the price records list endpoint
#[derive(Debug, Deserialize)]
pub struct ListPriceRecordsQuery {
    pub competitor: Option<String>,
    pub product: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
