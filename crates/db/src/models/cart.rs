//! Cart and cart line models.

use serde::Serialize;
use sqlx::FromRow;
use printshop_core::pricing::LineSnapshot;
use printshop_core::types::{Cents, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

/// A row from the `carts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cart {
    pub id: DbId,
    pub user_id: DbId,
    pub status: String,
    /// Incremented on every item mutation.
    pub version: i64,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// CartItem
// ---------------------------------------------------------------------------

/// A row from the `cart_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartItem {
    pub id: DbId,
    pub cart_id: DbId,
    pub article_id: DbId,
    pub variant_id: DbId,
    pub quantity: i32,
    pub price_at_time: Cents,
    pub original_price: Cents,
    pub prompt_price_at_time: Cents,
    pub prompt_original_price: Cents,
    pub prompt_id: Option<DbId>,
    pub generated_image_id: Option<DbId>,
    /// Canonical JSON text.
    pub custom_data: String,
    pub position: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartItem {
    pub fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            quantity: self.quantity,
            price_at_time: self.price_at_time,
            original_price: self.original_price,
            prompt_price_at_time: self.prompt_price_at_time,
            prompt_original_price: self.prompt_original_price,
        }
    }
}

/// A cart line joined with the display names it is rendered with.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartItemDetail {
    #[sqlx(flatten)]
    pub item: CartItem,
    pub article_name: String,
    pub article_type: String,
    pub variant_name: String,
    pub prompt_title: Option<String>,
    pub generated_image_filename: Option<String>,
}

/// DTO for adding a line. `custom_data` must already be canonical.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub article_id: DbId,
    pub variant_id: DbId,
    pub quantity: i32,
    pub article_price: Cents,
    pub prompt_price: Cents,
    pub prompt_id: Option<DbId>,
    pub generated_image_id: Option<DbId>,
    pub custom_data: String,
}

/// Live catalog prices for one cart line.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct LiveLinePrice {
    pub item_id: DbId,
    pub original_price: Cents,
    pub prompt_original_price: Cents,
    pub article_gross: Cents,
    pub prompt_gross: Cents,
}
