//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{admin, images};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `ADMIN` role (enforced by handler extractors).
///
/// ```text
/// POST   /prompts/{id}/test-generate                       -> test_generate
/// GET    /prompt-test-images/{filename}                    -> get_prompt_test_image
/// POST   /prompts/{id}/example-image                       -> upload_prompt_example
/// POST   /prompt-slot-variants/{id}/example-image          -> upload_slot_variant_example
/// POST   /articles/{article_id}/variants/{variant_id}/example-image
///                                                          -> upload_variant_example
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prompts/{id}/test-generate", post(admin::test_generate))
        .route(
            "/prompt-test-images/{filename}",
            get(images::get_prompt_test_image),
        )
        .route(
            "/prompts/{id}/example-image",
            post(admin::upload_prompt_example),
        )
        .route(
            "/prompt-slot-variants/{id}/example-image",
            post(admin::upload_slot_variant_example),
        )
        .route(
            "/articles/{article_id}/variants/{variant_id}/example-image",
            post(admin::upload_variant_example),
        )
}
