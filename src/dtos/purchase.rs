// src/dtos/purchase.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::purchase::{ProductLine, PurchaseInvoice, QtyType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseInvoiceRequest {
    pub date: NaiveDate,
    pub vendor: String,
    pub phone: String,
    #[serde(default)]
    pub products: Vec<ProductLineRequest>,
}

/// A submitted product line. Any caller-supplied `totalCost` is ignored;
/// the server recomputes it from quantity and cost.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLineRequest {
    pub name: String,
    pub hsn: String,
    #[serde(default)]
    pub qty_type: QtyType,
    pub quantity: i64,
    pub cost: f64,
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub expenses: Vec<String>,
}

// Full replace: same shape as create
pub type UpdatePurchaseInvoiceRequest = CreatePurchaseInvoiceRequest;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInvoiceResponse {
    pub id: i64,
    pub date: NaiveDate,
    pub vendor: String,
    pub phone: String,
    pub products: Vec<ProductLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PurchaseInvoice> for PurchaseInvoiceResponse {
    fn from(invoice: PurchaseInvoice) -> Self {
        Self {
            id: invoice.id,
            date: invoice.date,
            vendor: invoice.vendor,
            phone: invoice.phone,
            products: invoice.products.0,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VendorResponse {
    pub name: String,
    pub phone: String,
}
