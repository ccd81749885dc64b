// src/dtos/report.rs
use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub vendor: Option<String>,
    pub hsn: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RollupQuery {
    pub vendor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummaryResponse {
    pub overall: OverallSummary,
    pub by_vendor: Vec<VendorSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub total_records: i64,
    pub total_original_cost: f64,
    pub total_additional_expenses: f64,
    pub total_final_cost: f64,
    pub avg_additional_expense_percentage: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSummary {
    pub vendor: String,
    pub total_records: i64,
    pub total_original_cost: f64,
    pub total_additional_expenses: f64,
    pub total_final_cost: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReportRow {
    pub month: String,
    pub total_purchases: i64,
    pub total_amount: f64,
    pub total_expenses: f64,
    pub vendors: i64,
    pub products: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HsnReportRow {
    pub hsn: String,
    pub total_quantity: i64,
    pub total_amount: f64,
    pub total_expenses: f64,
    pub vendors: i64,
    pub avg_cost_per_unit: f64,
}
