//! Order models.
//!
//! Orders are immutable snapshots of a converted cart. Addresses are stored
//! as JSONB.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use printshop_core::types::{Cents, DbId, Timestamp};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A postal address as captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_address_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address_2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: DbId,
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Json<Address>,
    pub billing_address: Json<Address>,
    pub notes: Option<String>,
    pub subtotal: Cents,
    pub tax_amount: Cents,
    pub shipping_amount: Cents,
    pub total_amount: Cents,
    pub status: String,
    pub cart_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Customer and address data for converting a cart. Totals and lines are
/// taken from the cart inside the conversion transaction.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: DbId,
    pub cart_id: DbId,
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// OrderItem
// ---------------------------------------------------------------------------

/// A row from the `order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub article_id: DbId,
    pub variant_id: DbId,
    pub quantity: i32,
    pub price_per_item: Cents,
    pub total_price: Cents,
    pub generated_image_id: Option<DbId>,
    pub prompt_id: Option<DbId>,
    pub custom_data: String,
    pub position: i32,
    pub created_at: Timestamp,
}

/// An order line joined with everything needed to render or print it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItemDetail {
    #[sqlx(flatten)]
    pub item: OrderItem,
    pub article_name: String,
    pub article_type: String,
    pub supplier_article_name: Option<String>,
    pub supplier_article_number: Option<String>,
    pub variant_name: String,
    pub generated_image_filename: Option<String>,
    pub generated_image_user_id: Option<DbId>,
    pub print_template_width_mm: Option<f64>,
    pub print_template_height_mm: Option<f64>,
    pub document_format_width_mm: Option<f64>,
    pub document_format_height_mm: Option<f64>,
    pub document_format_margin_bottom_mm: Option<f64>,
}
