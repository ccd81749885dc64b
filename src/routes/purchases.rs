use axum::{
    routing::get,
    Router,
};
use crate::handlers::purchase::{
    create_purchase_invoice, delete_purchase_invoice, get_all_purchase_invoices,
    get_purchase_invoice, list_vendors, update_purchase_invoice,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(get_all_purchase_invoices).post(create_purchase_invoice))
        .route("/purchases/vendors/list", get(list_vendors))
        .route(
            "/purchases/{id}",
            get(get_purchase_invoice)
                .put(update_purchase_invoice)
                .delete(delete_purchase_invoice),
        )
}
