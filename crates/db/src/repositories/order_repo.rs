//! Repository for `orders` and `order_items`.

use sqlx::types::Json;
use sqlx::PgPool;
use printshop_core::canonical_json::canonicalize_json;
use printshop_core::pricing::{order_totals, LineSnapshot};
use printshop_core::types::DbId;
use uuid::Uuid;

use crate::models::cart::CartItem;
use crate::models::order::{CreateOrder, Order, OrderItem, OrderItemDetail};
use crate::models::status::{CartStatus, OrderStatus};
use crate::repositories::cart_item_repo::COLUMNS as CART_ITEM_COLUMNS;

const COLUMNS: &str = "id, order_number, user_id, customer_email, customer_first_name, \
    customer_last_name, customer_phone, shipping_address, billing_address, notes, subtotal, \
    tax_amount, shipping_amount, total_amount, status, cart_id, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, article_id, variant_id, quantity, price_per_item, \
    total_price, generated_image_id, prompt_id, custom_data, position, created_at";

/// Outcome of [`OrderRepo::create_from_cart`].
#[derive(Debug)]
pub enum Conversion {
    Created(Order),
    /// The cart was already converted (or abandoned) when the lock was taken.
    CartInactive,
    /// The cart is active but has no lines.
    CartEmpty,
}

pub struct OrderRepo;

impl OrderRepo {
    /// Whether any order already references the cart.
    pub async fn exists_for_cart(pool: &PgPool, cart_id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM orders WHERE cart_id = $1)")
                .bind(cart_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Convert an active cart into an order in one transaction.
    ///
    /// The cart row is locked first and the lines and totals are read under
    /// that lock. A concurrent cart mutation either commits before the lock
    /// is granted and is part of the order, or fails against the converted
    /// cart. Nothing is written unless the result is [`Conversion::Created`].
    /// The order number is assigned by the database.
    pub async fn create_from_cart(
        pool: &PgPool,
        input: &CreateOrder,
    ) -> Result<Conversion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM carts WHERE id = $1 AND status = $2 FOR UPDATE")
                .bind(input.cart_id)
                .bind(CartStatus::Active.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(Conversion::CartInactive);
        }

        let lines = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY position, id"
        ))
        .bind(input.cart_id)
        .fetch_all(&mut *tx)
        .await?;
        if lines.is_empty() {
            tx.rollback().await?;
            return Ok(Conversion::CartEmpty);
        }
        let snapshots: Vec<LineSnapshot> = lines.iter().map(CartItem::snapshot).collect();
        let totals = order_totals(&snapshots);

        sqlx::query(
            "UPDATE carts SET status = $2, version = version + 1, updated_at = now()
             WHERE id = $1",
        )
        .bind(input.cart_id)
        .bind(CartStatus::Converted.as_str())
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO orders (id, user_id, customer_email, customer_first_name,
                customer_last_name, customer_phone, shipping_address, billing_address, notes,
                subtotal, tax_amount, shipping_amount, total_amount, status, cart_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(Uuid::new_v4())
            .bind(input.user_id)
            .bind(&input.customer_email)
            .bind(&input.customer_first_name)
            .bind(&input.customer_last_name)
            .bind(&input.customer_phone)
            .bind(Json(&input.shipping_address))
            .bind(Json(&input.billing_address))
            .bind(&input.notes)
            .bind(totals.subtotal)
            .bind(totals.tax)
            .bind(totals.shipping)
            .bind(totals.total)
            .bind(OrderStatus::Pending.as_str())
            .bind(input.cart_id)
            .fetch_one(&mut *tx)
            .await?;

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, article_id, variant_id, quantity,
                    price_per_item, total_price, generated_image_id, prompt_id, custom_data,
                    position)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(line.article_id)
            .bind(line.variant_id)
            .bind(line.quantity)
            .bind(line.price_at_time)
            .bind(line.price_at_time * i64::from(line.quantity))
            .bind(line.generated_image_id)
            .bind(line.prompt_id)
            .bind(canonicalize_json(&line.custom_data))
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Conversion::Created(order))
    }

    /// Find an order only if it belongs to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_cart(pool: &PgPool, cart_id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE cart_id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(cart_id)
            .fetch_optional(pool)
            .await
    }

    /// A page of the user's orders, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, order_number DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY position"
        );
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Order lines joined with catalog, artwork and mug geometry, in position order.
    pub async fn item_details(
        pool: &PgPool,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
        sqlx::query_as::<_, OrderItemDetail>(
            "SELECT oi.id, oi.order_id, oi.article_id, oi.variant_id, oi.quantity,
                    oi.price_per_item, oi.total_price, oi.generated_image_id, oi.prompt_id,
                    oi.custom_data, oi.position, oi.created_at,
                    a.name AS article_name, a.article_type,
                    a.supplier_article_name, a.supplier_article_number,
                    v.name AS variant_name,
                    g.filename AS generated_image_filename,
                    g.user_id AS generated_image_user_id,
                    m.print_template_width_mm, m.print_template_height_mm,
                    m.document_format_width_mm, m.document_format_height_mm,
                    m.document_format_margin_bottom_mm
             FROM order_items oi
             JOIN articles a ON a.id = oi.article_id
             JOIN article_variants v ON v.id = oi.variant_id
             LEFT JOIN generated_images g ON g.id = oi.generated_image_id
             LEFT JOIN mug_details m ON m.article_id = oi.article_id
             WHERE oi.order_id = $1
             ORDER BY oi.position",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }
}
