// src/handlers/report.rs
use axum::{
    extract::{Query, State},
    Json,
};
use tracing::instrument;

use crate::dtos::report::{
    ExpenseSummaryResponse, HsnReportRow, MonthlyReportRow, RollupQuery, SummaryQuery,
};
use crate::error::AppError;
use crate::models::expense::Expense;
use crate::models::purchase::PurchaseInvoice;
use crate::models::report::{hsn_rollup, monthly_rollup, summarize_expenses};
use crate::state::AppState;

const EXPENSE_COLUMNS: &str = "id, purchase_invoice_id, product_name, product_hsn, product_vendor, \
     product_details, additional_expenses, total_additional_expenses, final_total_cost, \
     final_cost_per_unit, created_at, updated_at";

// GET /expenses/summary - Aggregate report over expense records
#[instrument(skip(state))]
pub async fn get_expense_summary(
    Query(query): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> Result<Json<ExpenseSummaryResponse>, AppError> {
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
    if query.start_date.is_some() {
        param += 1;
        sql.push_str(&format!(" AND created_at::date >= ${param}"));
    }
    if query.end_date.is_some() {
        param += 1;
        sql.push_str(&format!(" AND created_at::date <= ${param}"));
    }

    let mut db_query = sqlx::query_as::<_, Expense>(&sql);
    if let Some(vendor) = &query.vendor {
        db_query = db_query.bind(vendor);
    }
    if let Some(hsn) = &query.hsn {
        db_query = db_query.bind(hsn);
    }
    if let Some(start_date) = query.start_date {
        db_query = db_query.bind(start_date);
    }
    if let Some(end_date) = query.end_date {
        db_query = db_query.bind(end_date);
    }

    let records = db_query.fetch_all(&state.db_pool).await?;

    Ok(Json(summarize_expenses(&records)))
}

async fn fetch_invoices_and_expenses(
    state: &AppState,
    vendor: Option<&str>,
) -> Result<(Vec<PurchaseInvoice>, Vec<Expense>), AppError> {
    let invoices = match vendor {
        Some(vendor) => {
            sqlx::query_as::<_, PurchaseInvoice>(
                "SELECT id, date, vendor, phone, products, created_at, updated_at
                 FROM purchase_invoices WHERE vendor = $1 ORDER BY date DESC",
            )
            .bind(vendor)
            .fetch_all(&state.db_pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, PurchaseInvoice>(
                "SELECT id, date, vendor, phone, products, created_at, updated_at
                 FROM purchase_invoices ORDER BY date DESC",
            )
            .fetch_all(&state.db_pool)
            .await?
        }
    };

    let expenses = sqlx::query_as::<_, Expense>(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses"))
        .fetch_all(&state.db_pool)
        .await?;

    Ok((invoices, expenses))
}

// GET /reports/monthly - Month-wise purchase rollup
#[instrument(skip(state))]
pub async fn get_monthly_report(
    Query(query): Query<RollupQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlyReportRow>>, AppError> {
    let (invoices, expenses) =
        fetch_invoices_and_expenses(&state, query.vendor.as_deref()).await?;
    Ok(Json(monthly_rollup(&invoices, &expenses)))
}

// GET /reports/hsn - HSN-wise purchase rollup
#[instrument(skip(state))]
pub async fn get_hsn_report(
    Query(query): Query<RollupQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<HsnReportRow>>, AppError> {
    let (invoices, expenses) =
        fetch_invoices_and_expenses(&state, query.vendor.as_deref()).await?;
    Ok(Json(hsn_rollup(&invoices, &expenses)))
}
