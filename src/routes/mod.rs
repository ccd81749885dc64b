pub mod purchases;
pub mod expenses;
pub mod reports;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(purchases::routes())
        .merge(expenses::routes())
        .merge(reports::routes())
}
