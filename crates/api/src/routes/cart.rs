//! Route definitions for the `/user/cart` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::cart;
use crate::state::AppState;

/// Routes mounted at `/user/cart`.
///
/// ```text
/// GET    /                        -> get_cart
/// DELETE /                        -> clear_cart
/// GET    /summary                 -> get_summary
/// POST   /items                   -> add_item
/// PUT    /items/{id}              -> update_item
/// DELETE /items/{id}              -> remove_item
/// POST   /refresh-prices          -> refresh_prices
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::get_cart).delete(cart::clear_cart))
        .route("/summary", get(cart::get_summary))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/refresh-prices", post(cart::refresh_prices))
}
