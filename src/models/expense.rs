// src/models/expense.rs
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::dtos::expense::NewExpenseItemRequest;
use crate::models::purchase::QtyType;

pub const DEFAULT_NOTE: &str = "No note provided";

/// Snapshot of the purchased product taken when the expense record is
/// created. Intentionally not live-joined to the invoice: later invoice
/// edits do not retroactively change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub name: String,
    pub hsn: String,
    pub vendor: String,
    pub original_quantity: f64,
    pub original_unit_cost: f64,
    pub original_total_cost: f64,
    pub qty_type: QtyType,
    pub purchase_date: NaiveDate,
}

/// One additional-expense line (packing, transport, labor, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItem {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub amount_per_unit: f64,
    pub total_amount: f64,
    pub note: String,
    pub date_added: DateTime<Utc>,
}

/// Expense record accumulating additional-expense items for one purchased
/// product. The three derived totals are recomputed from `additional_expenses`
/// on every mutation and are never independently settable.
#[derive(Debug, FromRow)]
pub struct Expense {
    pub id: i64,
    pub purchase_invoice_id: i64,
    pub product_name: String,
    pub product_hsn: String,
    pub product_vendor: String,
    pub product_details: Json<ProductDetails>,
    pub additional_expenses: Json<Vec<ExpenseItem>>,
    pub total_additional_expenses: f64,
    pub final_total_cost: f64,
    pub final_cost_per_unit: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseTotals {
    pub total_additional_expenses: f64,
    pub final_total_cost: f64,
    pub final_cost_per_unit: f64,
}

/// Recomputes the derived totals from the expense items. Invoked before
/// every persist so the stored aggregates can never drift from their
/// defining sums.
pub fn recompute_totals(details: &ProductDetails, items: &[ExpenseItem]) -> ExpenseTotals {
    let total_additional_expenses: f64 = items.iter().map(|item| item.total_amount).sum();
    let final_total_cost = details.original_total_cost + total_additional_expenses;
    let final_cost_per_unit = if details.original_quantity > 0.0 {
        final_total_cost / details.original_quantity
    } else {
        0.0
    };

    ExpenseTotals {
        total_additional_expenses,
        final_total_cost,
        final_cost_per_unit,
    }
}

/// Builds a stored expense item from an incoming one. `total_amount`
/// defaults to `amount_per_unit * original_quantity` from the stored
/// snapshot, not from anything in the payload.
pub fn build_expense_item(req: &NewExpenseItemRequest, original_quantity: f64) -> ExpenseItem {
    ExpenseItem {
        id: Uuid::new_v4(),
        expense_type: req.expense_type.clone(),
        amount_per_unit: req.amount_per_unit,
        total_amount: req
            .total_amount
            .unwrap_or(req.amount_per_unit * original_quantity),
        note: req
            .note
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTE.to_string()),
        date_added: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(quantity: f64, total_cost: f64) -> ProductDetails {
        ProductDetails {
            name: "Widget".to_string(),
            hsn: "1234".to_string(),
            vendor: "Acme".to_string(),
            original_quantity: quantity,
            original_unit_cost: if quantity > 0.0 { total_cost / quantity } else { 0.0 },
            original_total_cost: total_cost,
            qty_type: QtyType::Pcs,
            purchase_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    fn new_item(expense_type: &str, amount_per_unit: f64) -> NewExpenseItemRequest {
        NewExpenseItemRequest {
            expense_type: expense_type.to_string(),
            amount_per_unit,
            total_amount: None,
            note: None,
        }
    }

    #[test]
    fn item_total_defaults_to_per_unit_times_quantity() {
        let item = build_expense_item(&new_item("Packing", 1.0), 10.0);
        assert_eq!(item.total_amount, 10.0);
        assert_eq!(item.note, DEFAULT_NOTE);
    }

    #[test]
    fn caller_supplied_item_total_is_kept() {
        let mut req = new_item("Transport", 2.0);
        req.total_amount = Some(25.0);
        req.note = Some("Shared truck".to_string());
        let item = build_expense_item(&req, 10.0);
        assert_eq!(item.total_amount, 25.0);
        assert_eq!(item.note, "Shared truck");
    }

    #[test]
    fn single_packing_expense_lands_the_cost() {
        // 10 pcs at 5.0 = 50.0, plus packing at 1.0/unit
        let details = details(10.0, 50.0);
        let items = vec![build_expense_item(&new_item("Packing", 1.0), 10.0)];
        let totals = recompute_totals(&details, &items);
        assert_eq!(items[0].total_amount, 10.0);
        assert_eq!(totals.final_total_cost, 60.0);
        assert_eq!(totals.final_cost_per_unit, 6.0);
    }

    #[test]
    fn totals_follow_the_defining_sums() {
        let details = details(10.0, 50.0);
        let items = vec![
            build_expense_item(&new_item("Packing", 1.0), 10.0),
            build_expense_item(&new_item("Transport", 2.0), 10.0),
        ];

        let totals = recompute_totals(&details, &items);
        assert_eq!(totals.total_additional_expenses, 30.0);
        assert_eq!(totals.final_total_cost, 80.0);
        assert_eq!(totals.final_cost_per_unit, 8.0);
    }

    #[test]
    fn totals_with_no_items_reduce_to_original_cost() {
        let details = details(10.0, 50.0);
        let totals = recompute_totals(&details, &[]);
        assert_eq!(totals.total_additional_expenses, 0.0);
        assert_eq!(totals.final_total_cost, 50.0);
        assert_eq!(totals.final_cost_per_unit, 5.0);
    }

    #[test]
    fn zero_quantity_guards_cost_per_unit() {
        let details = details(0.0, 0.0);
        let items = vec![build_expense_item(&new_item("Packing", 1.0), 0.0)];
        let totals = recompute_totals(&details, &items);
        assert_eq!(totals.final_cost_per_unit, 0.0);
        assert!(totals.final_cost_per_unit.is_finite());
    }

    #[test]
    fn recompute_is_idempotent() {
        let details = details(10.0, 50.0);
        let items = vec![build_expense_item(&new_item("Packing", 1.0), 10.0)];
        let first = recompute_totals(&details, &items);
        let second = recompute_totals(&details, &items);
        assert_eq!(first, second);
    }

    #[test]
    fn updating_per_unit_amount_scales_item_total() {
        let details = details(10.0, 50.0);
        let mut items = vec![build_expense_item(&new_item("Packing", 1.0), 10.0)];

        // Mirror the update path: new amountPerUnit recomputes totalAmount
        items[0].amount_per_unit = 1.5;
        items[0].total_amount = 1.5 * details.original_quantity;

        let totals = recompute_totals(&details, &items);
        assert_eq!(items[0].total_amount, 15.0);
        assert_eq!(totals.final_total_cost, 65.0);
        assert_eq!(totals.final_cost_per_unit, 6.5);
    }
}
