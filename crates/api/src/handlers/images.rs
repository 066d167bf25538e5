//! Serving of private user images.

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use printshop_core::storage::{load_bytes_and_type, safe_filename};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// User images
// ---------------------------------------------------------------------------

/// GET /api/user/images/{filename}
///
/// Only files in the caller's own directory are reachable.
pub async fn get_user_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let path = state.layout.user_file(auth.user_id, &filename)?;
    let (bytes, content_type) = load_bytes_and_type(&path).await?;
    Ok(([(CONTENT_TYPE, content_type)], bytes))
}

// ---------------------------------------------------------------------------
// Prompt test images
// ---------------------------------------------------------------------------

/// GET /api/admin/prompt-test-images/{filename}
pub async fn get_prompt_test_image(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let name = safe_filename(&filename)?;
    let path = state.layout.prompt_test_dir().join(name);
    let (bytes, content_type) = load_bytes_and_type(&path).await?;
    Ok(([(CONTENT_TYPE, content_type)], bytes))
}
