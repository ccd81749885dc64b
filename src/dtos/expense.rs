// src/dtos/expense.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::expense::{Expense, ExpenseItem, ProductDetails};
use crate::models::purchase::QtyType;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachExpensesRequest {
    pub purchase_invoice_id: i64,
    pub product_index: usize,
    pub product_details: ProductDetails,
    #[serde(default)]
    pub new_expenses: Vec<NewExpenseItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpenseItemRequest {
    #[serde(rename = "type")]
    pub expense_type: String,
    pub amount_per_unit: f64,
    pub total_amount: Option<f64>,
    pub note: Option<String>,
}

/// Partial update: absent fields are left unchanged. A new `amountPerUnit`
/// recomputes the item's `totalAmount` from the stored snapshot quantity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseItemRequest {
    #[serde(rename = "type")]
    pub expense_type: Option<String>,
    pub amount_per_unit: Option<f64>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    pub vendor: Option<String>,
    pub hsn: Option<String>,
    pub product_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: i64,
    pub purchase_invoice_id: i64,
    pub product_details: ProductDetails,
    pub additional_expenses: Vec<ExpenseItem>,
    pub total_additional_expenses: f64,
    pub final_total_cost: f64,
    pub final_cost_per_unit: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Mirrors updatedAt; kept as its own field for dashboard compatibility
    pub last_updated: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            purchase_invoice_id: expense.purchase_invoice_id,
            product_details: expense.product_details.0,
            additional_expenses: expense.additional_expenses.0,
            total_additional_expenses: expense.total_additional_expenses,
            final_total_cost: expense.final_total_cost,
            final_cost_per_unit: expense.final_cost_per_unit,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
            last_updated: expense.updated_at,
        }
    }
}

/// One row per (invoice, productIndex) pair, denormalized so the expense
/// entry form needs no second query.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackableProductResponse {
    pub id: String,
    pub purchase_invoice_id: i64,
    pub product_index: usize,
    pub name: String,
    pub vendor: String,
    pub phone: String,
    pub hsn: String,
    pub qty_type: QtyType,
    pub quantity: i64,
    pub unit_cost: f64,
    pub original_total_cost: f64,
    pub purchase_date: NaiveDate,
    pub invoice_date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsResponse {
    pub vendors: Vec<String>,
    pub hsn_codes: Vec<String>,
    pub product_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::purchase::QtyType;
    use chrono::{NaiveDate, Utc};
    use sqlx::types::Json;

    #[test]
    fn expense_response_carries_both_update_timestamps() {
        let now = Utc::now();
        let record = Expense {
            id: 1,
            purchase_invoice_id: 7,
            product_name: "Widget".to_string(),
            product_hsn: "1234".to_string(),
            product_vendor: "Acme".to_string(),
            product_details: Json(ProductDetails {
                name: "Widget".to_string(),
                hsn: "1234".to_string(),
                vendor: "Acme".to_string(),
                original_quantity: 10.0,
                original_unit_cost: 5.0,
                original_total_cost: 50.0,
                qty_type: QtyType::Pcs,
                purchase_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            }),
            additional_expenses: Json(Vec::new()),
            total_additional_expenses: 0.0,
            final_total_cost: 50.0,
            final_cost_per_unit: 5.0,
            created_at: now,
            updated_at: now,
        };

        let response = ExpenseResponse::from(record);
        assert_eq!(response.updated_at, response.last_updated);

        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("lastUpdated").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
