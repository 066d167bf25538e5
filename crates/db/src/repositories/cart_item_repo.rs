//! Repository for the `cart_items` table.
//!
//! Every mutation runs in a transaction that locks the parent cart row and
//! bumps its `version`. Only an `active` cart can be locked; mutating a cart
//! that checkout has converted fails with [`sqlx::Error::RowNotFound`].
//! Positions form a dense `0..n-1` sequence.

use sqlx::{PgConnection, PgPool};
use printshop_core::types::{Cents, DbId};

use crate::models::cart::{CartItem, CartItemDetail, LiveLinePrice, NewCartItem};
use crate::models::status::CartStatus;

pub(crate) const COLUMNS: &str = "id, cart_id, article_id, variant_id, quantity, price_at_time, \
    original_price, prompt_price_at_time, prompt_original_price, prompt_id, \
    generated_image_id, custom_data, position, created_at, updated_at";

const DETAIL_SELECT: &str = "SELECT ci.id, ci.cart_id, ci.article_id, ci.variant_id, \
    ci.quantity, ci.price_at_time, ci.original_price, ci.prompt_price_at_time, \
    ci.prompt_original_price, ci.prompt_id, ci.generated_image_id, ci.custom_data, \
    ci.position, ci.created_at, ci.updated_at, \
    a.name AS article_name, a.article_type, v.name AS variant_name, \
    p.title AS prompt_title, g.filename AS generated_image_filename
    FROM cart_items ci
    JOIN articles a ON a.id = ci.article_id
    JOIN article_variants v ON v.id = ci.variant_id
    LEFT JOIN prompts p ON p.id = ci.prompt_id
    LEFT JOIN generated_images g ON g.id = ci.generated_image_id";

/// New original-price snapshots for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalPriceUpdate {
    pub item_id: DbId,
    pub original_price: Cents,
    pub prompt_original_price: Cents,
}

pub struct CartItemRepo;

impl CartItemRepo {
    /// Lines of a cart in position order.
    pub async fn list(pool: &PgPool, cart_id: DbId) -> Result<Vec<CartItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(cart_id)
            .fetch_all(pool)
            .await
    }

    /// Lines of a cart with display names, in position order.
    pub async fn list_detailed(
        pool: &PgPool,
        cart_id: DbId,
    ) -> Result<Vec<CartItemDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.position, ci.id");
        sqlx::query_as::<_, CartItemDetail>(&query)
            .bind(cart_id)
            .fetch_all(pool)
            .await
    }

    /// Add a line or merge it into an identical one.
    ///
    /// Lines merge when article, variant, prompt, canonical custom data and
    /// both price snapshots are equal.
    pub async fn add_or_merge(
        pool: &PgPool,
        cart_id: DbId,
        input: &NewCartItem,
    ) -> Result<CartItem, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_cart(&mut *tx, cart_id).await?;

        let find = format!(
            "SELECT {COLUMNS} FROM cart_items
             WHERE cart_id = $1
               AND article_id = $2
               AND variant_id = $3
               AND prompt_id IS NOT DISTINCT FROM $4
               AND custom_data = $5
               AND price_at_time = $6
               AND prompt_price_at_time = $7
             ORDER BY position
             LIMIT 1"
        );
        let existing = sqlx::query_as::<_, CartItem>(&find)
            .bind(cart_id)
            .bind(input.article_id)
            .bind(input.variant_id)
            .bind(input.prompt_id)
            .bind(&input.custom_data)
            .bind(input.article_price)
            .bind(input.prompt_price)
            .fetch_optional(&mut *tx)
            .await?;

        let item = match existing {
            Some(line) => {
                let query = format!(
                    "UPDATE cart_items SET quantity = quantity + $2, updated_at = now()
                     WHERE id = $1
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, CartItem>(&query)
                    .bind(line.id)
                    .bind(input.quantity)
                    .fetch_one(&mut *tx)
                    .await?
            }
            None => {
                let query = format!(
                    "INSERT INTO cart_items (cart_id, article_id, variant_id, quantity,
                        price_at_time, original_price, prompt_price_at_time, prompt_original_price,
                        prompt_id, generated_image_id, custom_data, position)
                     VALUES ($1, $2, $3, $4, $5, $5, $6, $6, $7, $8, $9,
                        (SELECT COUNT(*)::int FROM cart_items WHERE cart_id = $1))
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, CartItem>(&query)
                    .bind(cart_id)
                    .bind(input.article_id)
                    .bind(input.variant_id)
                    .bind(input.quantity)
                    .bind(input.article_price)
                    .bind(input.prompt_price)
                    .bind(input.prompt_id)
                    .bind(input.generated_image_id)
                    .bind(&input.custom_data)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        bump_version(&mut *tx, cart_id).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Set a line's quantity. Returns `None` if the line is not in the cart.
    pub async fn update_quantity(
        pool: &PgPool,
        cart_id: DbId,
        item_id: DbId,
        quantity: i32,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_cart(&mut *tx, cart_id).await?;

        let query = format!(
            "UPDATE cart_items SET quantity = $3, updated_at = now()
             WHERE id = $1 AND cart_id = $2
             RETURNING {COLUMNS}"
        );
        let item = sqlx::query_as::<_, CartItem>(&query)
            .bind(item_id)
            .bind(cart_id)
            .bind(quantity)
            .fetch_optional(&mut *tx)
            .await?;

        if item.is_some() {
            bump_version(&mut *tx, cart_id).await?;
        }
        tx.commit().await?;
        Ok(item)
    }

    /// Remove a line and re-pack the remaining positions to `0..n-1`.
    ///
    /// Returns `true` if a line was removed.
    pub async fn delete_and_repack(
        pool: &PgPool,
        cart_id: DbId,
        item_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_cart(&mut *tx, cart_id).await?;

        let removed = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed {
            sqlx::query(
                "UPDATE cart_items ci SET position = (ranked.rn - 1)::int
                 FROM (
                    SELECT id, ROW_NUMBER() OVER (ORDER BY position, id) AS rn
                    FROM cart_items WHERE cart_id = $1
                 ) ranked
                 WHERE ci.id = ranked.id AND ci.position <> (ranked.rn - 1)::int",
            )
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
            bump_version(&mut *tx, cart_id).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    /// Remove every line. The cart itself stays. Returns the removed count.
    pub async fn clear(pool: &PgPool, cart_id: DbId) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_cart(&mut *tx, cart_id).await?;

        let removed = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        bump_version(&mut *tx, cart_id).await?;

        tx.commit().await?;
        Ok(removed)
    }

    /// Current catalog gross of every line's article and prompt.
    ///
    /// A prompt's gross comes from the price it owns, else from its legacy
    /// `price_id`; anything missing is 0.
    pub async fn live_prices(
        pool: &PgPool,
        cart_id: DbId,
    ) -> Result<Vec<LiveLinePrice>, sqlx::Error> {
        sqlx::query_as::<_, LiveLinePrice>(
            "SELECT ci.id AS item_id,
                    ci.original_price,
                    ci.prompt_original_price,
                    COALESCE(ap.sales_total_gross, 0) AS article_gross,
                    CASE WHEN ci.prompt_id IS NULL THEN 0
                         ELSE COALESCE(pp.sales_total_gross, lp.sales_total_gross, 0)
                    END AS prompt_gross
             FROM cart_items ci
             LEFT JOIN prices ap ON ap.article_id = ci.article_id
             LEFT JOIN prompts p ON p.id = ci.prompt_id
             LEFT JOIN prices pp ON pp.prompt_id = p.id
             LEFT JOIN prices lp ON lp.id = p.price_id
             WHERE ci.cart_id = $1
             ORDER BY ci.position, ci.id",
        )
        .bind(cart_id)
        .fetch_all(pool)
        .await
    }

    /// Rewrite the original-price snapshots of the given lines.
    ///
    /// `price_at_time` and `prompt_price_at_time` are never touched.
    pub async fn apply_original_prices(
        pool: &PgPool,
        cart_id: DbId,
        updates: &[OriginalPriceUpdate],
    ) -> Result<(), sqlx::Error> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut tx = pool.begin().await?;
        lock_cart(&mut *tx, cart_id).await?;

        for update in updates {
            sqlx::query(
                "UPDATE cart_items
                 SET original_price = $3, prompt_original_price = $4, updated_at = now()
                 WHERE id = $1 AND cart_id = $2",
            )
            .bind(update.item_id)
            .bind(cart_id)
            .bind(update.original_price)
            .bind(update.prompt_original_price)
            .execute(&mut *tx)
            .await?;
        }
        bump_version(&mut *tx, cart_id).await?;

        tx.commit().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lock the cart row; fails with `RowNotFound` unless the cart is still active.
async fn lock_cart(conn: &mut PgConnection, cart_id: DbId) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT id FROM carts WHERE id = $1 AND status = $2 FOR UPDATE")
        .bind(cart_id)
        .bind(CartStatus::Active.as_str())
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or(sqlx::Error::RowNotFound)
}

async fn bump_version(conn: &mut PgConnection, cart_id: DbId) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE carts SET version = version + 1, updated_at = now() WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}
