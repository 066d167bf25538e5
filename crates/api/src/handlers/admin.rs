//! Admin-only handlers: prompt test runs and example images.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use printshop_core::types::DbId;
use printshop_pipeline::example_images::{self, StoredExampleImage};
use printshop_pipeline::generation::{GenerationOutput, PromptTestRequest};
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::handlers::upload::{read_image_part, GenerationForm};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Prompt test runs
// ---------------------------------------------------------------------------

/// POST /api/admin/prompts/{id}/test-generate
///
/// Multipart `image` plus optional `provider`. Outputs land in the shared
/// prompt-test directory and are not tied to any user.
pub async fn test_generate(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(prompt_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<GenerationOutput>> {
    let mut form = GenerationForm::read(multipart).await?;
    let image = form.take_image()?;

    tracing::info!(admin_id = admin.user_id, prompt_id, "Prompt test generation requested");

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let output = state
        .generation
        .test_prompt(
            &cancel,
            PromptTestRequest {
                prompt_id,
                image: image.bytes,
                content_type: image.content_type,
                provider: form.provider,
            },
        )
        .await?;
    Ok(Json(output))
}

// ---------------------------------------------------------------------------
// Example images
// ---------------------------------------------------------------------------

/// POST /api/admin/prompts/{id}/example-image
pub async fn upload_prompt_example(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(prompt_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<StoredExampleImage>> {
    let image = read_image_part(multipart).await?;
    let stored =
        example_images::store_prompt_example(&state.pool, &state.layout, prompt_id, &image.bytes)
            .await?;
    Ok(Json(stored))
}

/// POST /api/admin/prompt-slot-variants/{id}/example-image
pub async fn upload_slot_variant_example(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(slot_variant_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<StoredExampleImage>> {
    let image = read_image_part(multipart).await?;
    let stored = example_images::store_slot_variant_example(
        &state.pool,
        &state.layout,
        slot_variant_id,
        &image.bytes,
    )
    .await?;
    Ok(Json(stored))
}

/// POST /api/admin/articles/{article_id}/variants/{variant_id}/example-image
///
/// Converted to WebP.
pub async fn upload_variant_example(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path((article_id, variant_id)): Path<(DbId, DbId)>,
    multipart: Multipart,
) -> AppResult<Json<StoredExampleImage>> {
    let image = read_image_part(multipart).await?;
    let stored = example_images::store_variant_example(
        &state.pool,
        &state.layout,
        article_id,
        variant_id,
        &image.bytes,
    )
    .await?;
    Ok(Json(stored))
}
