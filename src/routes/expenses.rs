use axum::{
    routing::{delete, get, put},
    Router,
};
use crate::handlers::expense::{
    create_or_update_product_expense, delete_expense_item, delete_expense_record,
    get_all_expense_records, get_filter_options, get_product_expense,
    get_products_for_expense_tracking, update_expense_item,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(get_all_expense_records).post(create_or_update_product_expense))
        .route("/expenses/products", get(get_products_for_expense_tracking))
        .route("/expenses/filters", get(get_filter_options))
        .route(
            "/expenses/product/{purchaseInvoiceId}/{productName}/{hsn}",
            get(get_product_expense),
        )
        .route(
            "/expenses/{expenseRecordId}/expense/{expenseItemId}",
            put(update_expense_item).delete(delete_expense_item),
        )
        .route("/expenses/{expenseRecordId}", delete(delete_expense_record))
}
