use axum::routing::get;
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/user/images`.
///
/// ```text
/// GET    /{filename}              -> get_user_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{filename}", get(images::get_user_image))
}
