use axum::routing::{get, post};
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// POST   /checkout                -> checkout
/// GET    /orders                  -> list_orders
/// GET    /orders/{id}             -> get_order
/// GET    /orders/{id}/pdf         -> get_order_pdf
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/pdf", get(orders::get_order_pdf))
}
