//! Handlers for artwork generation.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use printshop_pipeline::generation::{GenerationOutput, GenerationRequest};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::handlers::upload::GenerationForm;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// POST /api/user/ai/images/generate
///
/// Multipart: `image` (required), `promptId` (required), optional
/// `cropX`/`cropY`/`cropWidth`/`cropHeight` and `provider`. Returns the URLs
/// and ids of the stored candidates.
pub async fn generate(
    auth: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    multipart: Multipart,
) -> AppResult<Json<GenerationOutput>> {
    let mut form = GenerationForm::read(multipart).await?;
    let image = form.take_image()?;
    let prompt_id = form
        .prompt_id
        .ok_or_else(|| AppError::BadRequest("Missing 'promptId'".into()))?;
    let crop = form.crop()?;

    let peer = connect_info.map(|Extension(ConnectInfo(addr))| addr);
    let request = GenerationRequest {
        user_id: auth.user_id,
        prompt_id,
        image: image.bytes,
        content_type: image.content_type,
        original_filename: image.filename,
        crop,
        provider: form.provider,
        client_ip: client_ip(&headers, peer),
    };

    // Dropping the future (client gone, outer timeout) cancels provider calls.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let output = state.generation.generate(&cancel, request).await?;
    Ok(Json(output))
}

/// Best-effort client address: proxy headers first, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}
