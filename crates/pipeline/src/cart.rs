//! Cart engine.
//!
//! Every operation works on the caller's active cart, which is created on
//! first use. Mutations go through [`CartItemRepo`], which serializes them
//! per cart, bumps the cart version and refuses carts that checkout has
//! already converted.

use printshop_core::canonical_json::{canonicalize_value, parse_stored};
use printshop_core::naming;
use printshop_core::pricing::{
    self, drifted, normalize_add_quantity, validate_update_quantity, CartSummary, DriftFlags,
    LineSnapshot,
};
use printshop_core::types::{Cents, DbId, Timestamp};
use printshop_db::models::cart::{Cart, CartItemDetail, LiveLinePrice, NewCartItem};
use printshop_db::repositories::cart_item_repo::OriginalPriceUpdate;
use printshop_db::repositories::{
    ArticleRepo, CartItemRepo, CartRepo, GeneratedImageRepo, PriceRepo, PromptRepo,
};
use printshop_db::DbPool;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItem {
    pub article_id: DbId,
    pub variant_id: DbId,
    /// Missing or non-positive quantities count as one.
    pub quantity: Option<i32>,
    pub prompt_id: Option<DbId>,
    pub generated_image_id: Option<DbId>,
    pub custom_data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: DbId,
    pub article_id: DbId,
    pub article_name: String,
    pub article_type: String,
    pub variant_id: DbId,
    pub variant_name: String,
    pub quantity: i32,
    pub price_at_time: Cents,
    pub original_price: Cents,
    pub prompt_price_at_time: Cents,
    pub prompt_original_price: Cents,
    #[serde(flatten)]
    pub drift: DriftFlags,
    /// `(price + prompt price) * quantity` at the snapshot prices.
    pub total_price: Cents,
    pub prompt_id: Option<DbId>,
    pub prompt_title: Option<String>,
    pub generated_image_id: Option<DbId>,
    pub generated_image_url: Option<String>,
    pub custom_data: Value,
    pub position: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<CartItemDetail> for CartItemView {
    fn from(detail: CartItemDetail) -> Self {
        let snapshot = detail.item.snapshot();
        let item = detail.item;
        Self {
            id: item.id,
            article_id: item.article_id,
            article_name: detail.article_name,
            article_type: detail.article_type,
            variant_id: item.variant_id,
            variant_name: detail.variant_name,
            quantity: item.quantity,
            price_at_time: item.price_at_time,
            original_price: item.original_price,
            prompt_price_at_time: item.prompt_price_at_time,
            prompt_original_price: item.prompt_original_price,
            drift: snapshot.drift(),
            total_price: snapshot.line_total(),
            prompt_id: item.prompt_id,
            prompt_title: detail.prompt_title,
            generated_image_id: item.generated_image_id,
            generated_image_url: detail
                .generated_image_filename
                .as_deref()
                .map(naming::user_image_url),
            custom_data: parse_stored(&item.custom_data),
            position: item.position,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: DbId,
    pub user_id: DbId,
    pub status: String,
    pub version: i64,
    pub expires_at: Timestamp,
    pub items: Vec<CartItemView>,
    #[serde(flatten)]
    pub summary: CartSummary,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartView {
    fn build(cart: Cart, details: Vec<CartItemDetail>) -> Self {
        let snapshots: Vec<LineSnapshot> = details.iter().map(|d| d.item.snapshot()).collect();
        let summary = pricing::summarize(&snapshots);
        Self {
            id: cart.id,
            user_id: cart.user_id,
            status: cart.status,
            version: cart.version,
            expires_at: cart.expires_at,
            items: details.into_iter().map(CartItemView::from).collect(),
            summary,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// The caller's active cart with item details, drift flags and totals.
pub async fn get_cart(pool: &DbPool, user_id: DbId) -> Result<CartView, PipelineError> {
    let cart = CartRepo::get_or_create_active(pool, user_id).await?;
    load_view(pool, cart).await
}

pub async fn summary(pool: &DbPool, user_id: DbId) -> Result<CartSummary, PipelineError> {
    let cart = CartRepo::get_or_create_active(pool, user_id).await?;
    let snapshots: Vec<LineSnapshot> = CartItemRepo::list(pool, cart.id)
        .await?
        .iter()
        .map(|i| i.snapshot())
        .collect();
    Ok(pricing::summarize(&snapshots))
}

/// Add a line, merging it into an identical existing line.
pub async fn add_item(
    pool: &DbPool,
    user_id: DbId,
    input: &AddCartItem,
) -> Result<CartView, PipelineError> {
    ArticleRepo::find_by_id(pool, input.article_id)
        .await?
        .ok_or(PipelineError::not_found("Article", input.article_id))?;
    let variant = ArticleRepo::find_variant(pool, input.variant_id)
        .await?
        .ok_or(PipelineError::not_found("ArticleVariant", input.variant_id))?;
    if variant.article_id != input.article_id {
        return Err(PipelineError::validation(format!(
            "Variant {} does not belong to article {}",
            input.variant_id, input.article_id
        )));
    }

    let prompt_price = match input.prompt_id {
        Some(prompt_id) => {
            PromptRepo::find_by_id(pool, prompt_id)
                .await?
                .ok_or(PipelineError::not_found("Prompt", prompt_id))?;
            PriceRepo::prompt_gross(pool, prompt_id).await?
        }
        None => 0,
    };

    if let Some(image_id) = input.generated_image_id {
        let image = GeneratedImageRepo::find_by_id(pool, image_id).await?;
        if image.and_then(|i| i.user_id) != Some(user_id) {
            return Err(PipelineError::not_found("GeneratedImage", image_id));
        }
    }

    let article_price = PriceRepo::article_gross(pool, input.article_id).await?;
    let new_line = NewCartItem {
        article_id: input.article_id,
        variant_id: input.variant_id,
        quantity: normalize_add_quantity(input.quantity),
        article_price,
        prompt_price,
        prompt_id: input.prompt_id,
        generated_image_id: input.generated_image_id,
        custom_data: canonicalize_value(input.custom_data.as_ref()),
    };

    let cart = CartRepo::get_or_create_active(pool, user_id).await?;
    let (cart, line) = match CartItemRepo::add_or_merge(pool, cart.id, &new_line).await {
        Ok(line) => (cart, line),
        // Checkout converted the cart after it was resolved; the line goes
        // into the fresh active cart instead.
        Err(sqlx::Error::RowNotFound) => {
            let cart = CartRepo::get_or_create_active(pool, user_id).await?;
            let line = CartItemRepo::add_or_merge(pool, cart.id, &new_line).await?;
            (cart, line)
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        user_id,
        cart_id = cart.id,
        item_id = line.id,
        quantity = line.quantity,
        "Cart item added",
    );
    reload(pool, cart.id).await
}

pub async fn update_item(
    pool: &DbPool,
    user_id: DbId,
    item_id: DbId,
    quantity: i32,
) -> Result<CartView, PipelineError> {
    let quantity = validate_update_quantity(quantity)?;
    let cart = CartRepo::get_or_create_active(pool, user_id).await?;
    CartItemRepo::update_quantity(pool, cart.id, item_id, quantity)
        .await?
        .ok_or(PipelineError::not_found("CartItem", item_id))?;
    reload(pool, cart.id).await
}

/// Remove a line and re-pack the remaining positions.
pub async fn remove_item(
    pool: &DbPool,
    user_id: DbId,
    item_id: DbId,
) -> Result<CartView, PipelineError> {
    let cart = CartRepo::get_or_create_active(pool, user_id).await?;
    if !CartItemRepo::delete_and_repack(pool, cart.id, item_id).await? {
        return Err(PipelineError::not_found("CartItem", item_id));
    }
    reload(pool, cart.id).await
}

pub async fn clear(pool: &DbPool, user_id: DbId) -> Result<(), PipelineError> {
    let cart = CartRepo::get_or_create_active(pool, user_id).await?;
    let removed = CartItemRepo::clear(pool, cart.id).await?;
    tracing::info!(user_id, cart_id = cart.id, removed, "Cart cleared");
    Ok(())
}

/// Re-read live prices and move the `*_original` snapshots to them.
///
/// The contractual `*_at_time` prices are never touched.
pub async fn refresh_prices(pool: &DbPool, user_id: DbId) -> Result<CartView, PipelineError> {
    let cart = CartRepo::get_or_create_active(pool, user_id).await?;
    let live = CartItemRepo::live_prices(pool, cart.id).await?;
    let updates = original_price_updates(&live);
    if !updates.is_empty() {
        CartItemRepo::apply_original_prices(pool, cart.id, &updates).await?;
        tracing::info!(user_id, cart_id = cart.id, drifted = updates.len(), "Cart prices refreshed");
    }
    reload(pool, cart.id).await
}

/// The snapshot updates needed to bring every line to its live price.
pub fn original_price_updates(live: &[LiveLinePrice]) -> Vec<OriginalPriceUpdate> {
    live.iter()
        .filter_map(|line| {
            let article = drifted(line.original_price, line.article_gross);
            let prompt = drifted(line.prompt_original_price, line.prompt_gross);
            if article.is_none() && prompt.is_none() {
                return None;
            }
            Some(OriginalPriceUpdate {
                item_id: line.item_id,
                original_price: article.unwrap_or(line.original_price),
                prompt_original_price: prompt.unwrap_or(line.prompt_original_price),
            })
        })
        .collect()
}

async fn reload(pool: &DbPool, cart_id: DbId) -> Result<CartView, PipelineError> {
    let cart = CartRepo::find_by_id(pool, cart_id)
        .await?
        .ok_or(PipelineError::not_found("Cart", cart_id))?;
    load_view(pool, cart).await
}

async fn load_view(pool: &DbPool, cart: Cart) -> Result<CartView, PipelineError> {
    let details = CartItemRepo::list_detailed(pool, cart.id).await?;
    Ok(CartView::build(cart, details))
}
