use axum::{routing::get, Router};
use crate::handlers::report::{get_expense_summary, get_hsn_report, get_monthly_report};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses/summary", get(get_expense_summary))
        .route("/reports/monthly", get(get_monthly_report))
        .route("/reports/hsn", get(get_hsn_report))
}
