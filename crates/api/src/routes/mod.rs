pub mod admin;
pub mod cart;
pub mod generation;
pub mod health;
pub mod images;
pub mod orders;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /user/ai/images/generate                          generate candidates (POST)
/// /user/images/{filename}                           private image bytes
///
/// /user/cart                                        get, clear
/// /user/cart/summary                                totals only
/// /user/cart/items                                  add (POST)
/// /user/cart/items/{id}                             update quantity, remove
/// /user/cart/refresh-prices                         re-read live prices (POST)
///
/// /user/checkout                                    cart -> order (POST)
/// /user/orders                                      paginated list
/// /user/orders/{id}                                 get
/// /user/orders/{id}/pdf                             render + upload + download
///
/// /admin/prompts/{id}/test-generate                 prompt test run (POST)
/// /admin/prompt-test-images/{filename}              prompt test outputs
/// /admin/prompts/{id}/example-image                 upload (POST)
/// /admin/prompt-slot-variants/{id}/example-image    upload (POST)
/// /admin/articles/{a}/variants/{v}/example-image    upload, WebP (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/user/ai/images", generation::router())
        .nest("/user/images", images::router())
        .nest("/user/cart", cart::router())
        .nest("/user", orders::router())
        .nest("/admin", admin::router())
}
