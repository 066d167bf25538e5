//! Handlers for checkout and the caller's orders.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use printshop_pipeline::checkout::{self, CheckoutRequest};
use printshop_pipeline::orders::{self, OrderView, Page, PageParams};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

/// POST /api/user/checkout
///
/// Converts the active cart into a `PENDING` order.
pub async fn checkout(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<OrderView>)> {
    let order = checkout::create_order_from_cart(&state.pool, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

// ---------------------------------------------------------------------------
// Order reads
// ---------------------------------------------------------------------------

/// GET /api/user/orders?page=&size=
pub async fn list_orders(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<OrderView>>> {
    Ok(Json(
        orders::list_orders(&state.pool, auth.user_id, params).await?,
    ))
}

/// GET /api/user/orders/{id}
pub async fn get_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderView>> {
    Ok(Json(
        orders::get_order(&state.pool, auth.user_id, order_id).await?,
    ))
}

// ---------------------------------------------------------------------------
// Print PDF
// ---------------------------------------------------------------------------

/// GET /api/user/orders/{id}/pdf
///
/// Renders the print PDF, uploads it to the print shop and only then
/// returns it as an attachment.
pub async fn get_order_pdf(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let dispatched = orders::render_and_dispatch(
        &state.pool,
        &state.layout,
        &state.pdf_dispatcher,
        auth.user_id,
        order_id,
        state.config.qr_pixels,
    )
    .await?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", dispatched.filename),
            ),
        ],
        dispatched.bytes,
    ))
}
