// src/handlers/expense.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use sqlx::Error as SqlxError;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::dtos::expense::{
    AttachExpensesRequest, ExpenseListQuery, ExpenseResponse, FilterOptionsResponse,
    NewExpenseItemRequest, TrackableProductResponse, UpdateExpenseItemRequest,
};
use crate::error::AppError;
use crate::models::expense::{build_expense_item, recompute_totals, Expense};
use crate::models::purchase::{collect_filter_options, flatten_products, PurchaseInvoice};
use crate::state::AppState;

const EXPENSE_COLUMNS: &str = "id, purchase_invoice_id, product_name, product_hsn, product_vendor, \
     product_details, additional_expenses, total_additional_expenses, final_total_cost, \
     final_cost_per_unit, created_at, updated_at";

fn map_unique_violation(err: SqlxError, message: &str) -> AppError {
    match err {
        SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict(message)
        }
        other => other.into(),
    }
}

// A malformed item id can never match a stored item, so it reads as
// not-found rather than a path extraction error
fn parse_expense_item_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::not_found("Expense item not found"))
}

fn validate_new_items(items: &[NewExpenseItemRequest]) -> Result<(), AppError> {
    for item in items {
        if item.expense_type.trim().is_empty() {
            return Err(AppError::validation("Expense type is required"));
        }
        if item.amount_per_unit < 0.0 {
            return Err(AppError::validation("Amount per unit cannot be negative"));
        }
    }
    Ok(())
}

// GET /expenses/products - Flatten every invoice product line for expense entry
#[instrument(skip(state))]
pub async fn get_products_for_expense_tracking(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackableProductResponse>>, AppError> {
    let invoices = sqlx::query_as::<_, PurchaseInvoice>(
        "SELECT id, date, vendor, phone, products, created_at, updated_at
         FROM purchase_invoices ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(flatten_products(&invoices)))
}

// GET /expenses/filters - Distinct vendors, HSN codes and product names
#[instrument(skip(state))]
pub async fn get_filter_options(
    State(state): State<AppState>,
) -> Result<Json<FilterOptionsResponse>, AppError> {
    let invoices = sqlx::query_as::<_, PurchaseInvoice>(
        "SELECT id, date, vendor, phone, products, created_at, updated_at FROM purchase_invoices",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(collect_filter_options(&invoices)))
}

// POST /expenses - Create or update the expense record for a product
#[instrument(skip(state, payload))]
pub async fn create_or_update_product_expense(
    State(state): State<AppState>,
    Json(payload): Json<AttachExpensesRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    validate_new_items(&payload.new_expenses)?;

    let mut tx = state.db_pool.begin().await?;

    // The referenced invoice and product line must exist
    let invoice = sqlx::query_as::<_, PurchaseInvoice>(
        "SELECT id, date, vendor, phone, products, created_at, updated_at
         FROM purchase_invoices WHERE id = $1",
    )
    .bind(payload.purchase_invoice_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase invoice not found"))?;

    if invoice.products.0.get(payload.product_index).is_none() {
        return Err(AppError::not_found("Product not found in invoice"));
    }

    // Match key is (invoiceId, product name, hsn), backed by a unique index
    let existing = sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses
         WHERE purchase_invoice_id = $1 AND product_name = $2 AND product_hsn = $3
         FOR UPDATE"
    ))
    .bind(payload.purchase_invoice_id)
    .bind(&payload.product_details.name)
    .bind(&payload.product_details.hsn)
    .fetch_optional(&mut *tx)
    .await?;

    let saved = match existing {
        Some(mut record) => {
            // Append to the existing record; item totals come from the stored
            // snapshot quantity, not the incoming payload
            let quantity = record.product_details.0.original_quantity;
            for item in &payload.new_expenses {
                record
                    .additional_expenses
                    .0
                    .push(build_expense_item(item, quantity));
            }

            let totals = recompute_totals(&record.product_details.0, &record.additional_expenses.0);

            sqlx::query_as::<_, Expense>(&format!(
                "UPDATE expenses
                 SET additional_expenses = $1,
                     total_additional_expenses = $2,
                     final_total_cost = $3,
                     final_cost_per_unit = $4,
                     updated_at = NOW()
                 WHERE id = $5
                 RETURNING {EXPENSE_COLUMNS}"
            ))
            .bind(SqlJson(record.additional_expenses.0))
            .bind(totals.total_additional_expenses)
            .bind(totals.final_total_cost)
            .bind(totals.final_cost_per_unit)
            .bind(record.id)
            .fetch_one(&mut *tx)
            .await?
        }
        None => {
            let details = payload.product_details;
            let items: Vec<_> = payload
                .new_expenses
                .iter()
                .map(|item| build_expense_item(item, details.original_quantity))
                .collect();
            let totals = recompute_totals(&details, &items);

            sqlx::query_as::<_, Expense>(&format!(
                "INSERT INTO expenses
                     (purchase_invoice_id, product_name, product_hsn, product_vendor,
                      product_details, additional_expenses, total_additional_expenses,
                      final_total_cost, final_cost_per_unit)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING {EXPENSE_COLUMNS}"
            ))
            .bind(payload.purchase_invoice_id)
            .bind(details.name.clone())
            .bind(details.hsn.clone())
            .bind(details.vendor.clone())
            .bind(SqlJson(details))
            .bind(SqlJson(items))
            .bind(totals.total_additional_expenses)
            .bind(totals.final_total_cost)
            .bind(totals.final_cost_per_unit)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                map_unique_violation(e, "Expense record already exists for this product")
            })?
        }
    };

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(saved))))
}

// GET /expenses/product/:purchaseInvoiceId/:productName/:hsn
// A miss here is the normal "no expense yet" state, signaled as 404
#[instrument(skip(state))]
pub async fn get_product_expense(
    Path((purchase_invoice_id, product_name, hsn)): Path<(i64, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let record = sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses
         WHERE purchase_invoice_id = $1 AND product_name = $2 AND product_hsn = $3"
    ))
    .bind(purchase_invoice_id)
    .bind(&product_name)
    .bind(&hsn)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Expense record not found"))?;

    Ok(Json(ExpenseResponse::from(record)))
}

// GET /expenses - List expense records with optional filters, newest first
#[instrument(skip(state))]
pub async fn get_all_expense_records(
    Query(query): Query<ExpenseListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExpenseResponse>>, AppError> {
    let mut sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE 1=1");
    let mut param = 0;

    if query.vendor.is_some() {
        param += 1;
        sql.push_str(&format!(" AND product_vendor = ${param}"));
    }
    if query.hsn.is_some() {
        param += 1;
        sql.push_str(&format!(" AND product_hsn = ${param}"));
    }
    if query.product_name.is_some() {
        param += 1;
        sql.push_str(&format!(" AND product_name = ${param}"));
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut db_query = sqlx::query_as::<_, Expense>(&sql);
    if let Some(vendor) = &query.vendor {
        db_query = db_query.bind(vendor);
    }
    if let Some(hsn) = &query.hsn {
        db_query = db_query.bind(hsn);
    }
    if let Some(product_name) = &query.product_name {
        db_query = db_query.bind(product_name);
    }

    match db_query.fetch_all(&state.db_pool).await {
        Ok(records) => Ok(Json(records.into_iter().map(ExpenseResponse::from).collect())),
        Err(e) => {
            error!(?e, "Failed to fetch expense records");
            Err(e.into())
        }
    }
}

// PUT /expenses/:expenseRecordId/expense/:expenseItemId - Update one item
#[instrument(skip(state, payload), fields(expense_record_id, expense_item_id))]
pub async fn update_expense_item(
    Path((expense_record_id, expense_item_id)): Path<(i64, String)>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateExpenseItemRequest>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let expense_item_id = parse_expense_item_id(&expense_item_id)?;

    if payload.amount_per_unit.is_some_and(|amount| amount < 0.0) {
        return Err(AppError::validation("Amount per unit cannot be negative"));
    }

    let mut tx = state.db_pool.begin().await?;

    let mut record = sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 FOR UPDATE"
    ))
    .bind(expense_record_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Expense record not found"))?;

    let original_quantity = record.product_details.0.original_quantity;
    let item = record
        .additional_expenses
        .0
        .iter_mut()
        .find(|item| item.id == expense_item_id)
        .ok_or_else(|| AppError::not_found("Expense item not found"))?;

    if let Some(expense_type) = payload.expense_type {
        item.expense_type = expense_type;
    }
    if let Some(amount_per_unit) = payload.amount_per_unit {
        item.amount_per_unit = amount_per_unit;
        item.total_amount = amount_per_unit * original_quantity;
    }
    if let Some(note) = payload.note {
        item.note = note;
    }

    let totals = recompute_totals(&record.product_details.0, &record.additional_expenses.0);

    let updated = sqlx::query_as::<_, Expense>(&format!(
        "UPDATE expenses
         SET additional_expenses = $1,
             total_additional_expenses = $2,
             final_total_cost = $3,
             final_cost_per_unit = $4,
             updated_at = NOW()
         WHERE id = $5
         RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(SqlJson(record.additional_expenses.0))
    .bind(totals.total_additional_expenses)
    .bind(totals.final_total_cost)
    .bind(totals.final_cost_per_unit)
    .bind(expense_record_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(ExpenseResponse::from(updated)))
}

// DELETE /expenses/:expenseRecordId/expense/:expenseItemId - Remove one item
#[instrument(skip(state), fields(expense_record_id, expense_item_id))]
pub async fn delete_expense_item(
    Path((expense_record_id, expense_item_id)): Path<(i64, String)>,
    State(state): State<AppState>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let expense_item_id = parse_expense_item_id(&expense_item_id)?;

    let mut tx = state.db_pool.begin().await?;

    let mut record = sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 FOR UPDATE"
    ))
    .bind(expense_record_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Expense record not found"))?;

    let before = record.additional_expenses.0.len();
    record.additional_expenses.0.retain(|item| item.id != expense_item_id);
    if record.additional_expenses.0.len() == before {
        return Err(AppError::not_found("Expense item not found"));
    }

    let totals = recompute_totals(&record.product_details.0, &record.additional_expenses.0);

    let updated = sqlx::query_as::<_, Expense>(&format!(
        "UPDATE expenses
         SET additional_expenses = $1,
             total_additional_expenses = $2,
             final_total_cost = $3,
             final_cost_per_unit = $4,
             updated_at = NOW()
         WHERE id = $5
         RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(SqlJson(record.additional_expenses.0))
    .bind(totals.total_additional_expenses)
    .bind(totals.final_total_cost)
    .bind(totals.final_cost_per_unit)
    .bind(expense_record_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(ExpenseResponse::from(updated)))
}

// DELETE /expenses/:expenseRecordId - Delete whole expense record
#[instrument(skip(state), fields(expense_record_id))]
pub async fn delete_expense_record(
    Path(expense_record_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
        .bind(expense_record_id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Expense record not found"));
    }

    Ok(Json(json!({ "message": "Expense record deleted successfully" })))
}
