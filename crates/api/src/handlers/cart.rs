//! Handlers for the caller's shopping cart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use printshop_core::pricing::CartSummary;
use printshop_core::types::DbId;
use printshop_pipeline::cart::{self, AddCartItem, CartView, UpdateCartItem};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Cart reads
// ---------------------------------------------------------------------------

/// GET /api/user/cart
pub async fn get_cart(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CartView>> {
    Ok(Json(cart::get_cart(&state.pool, auth.user_id).await?))
}

/// GET /api/user/cart/summary
pub async fn get_summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CartSummary>> {
    Ok(Json(cart::summary(&state.pool, auth.user_id).await?))
}

// ---------------------------------------------------------------------------
// Cart mutations
// ---------------------------------------------------------------------------

/// POST /api/user/cart/items
///
/// Lines with the same article, variant, prompt and custom data are merged.
pub async fn add_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AddCartItem>,
) -> AppResult<(StatusCode, Json<CartView>)> {
    let view = cart::add_item(&state.pool, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/user/cart/items/{id}
pub async fn update_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
    Json(input): Json<UpdateCartItem>,
) -> AppResult<Json<CartView>> {
    let view = cart::update_item(&state.pool, auth.user_id, item_id, input.quantity).await?;
    Ok(Json(view))
}

/// DELETE /api/user/cart/items/{id}
pub async fn remove_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
) -> AppResult<Json<CartView>> {
    Ok(Json(cart::remove_item(&state.pool, auth.user_id, item_id).await?))
}

/// DELETE /api/user/cart
pub async fn clear_cart(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    cart::clear(&state.pool, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/user/cart/refresh-prices
pub async fn refresh_prices(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CartView>> {
    Ok(Json(cart::refresh_prices(&state.pool, auth.user_id).await?))
}
