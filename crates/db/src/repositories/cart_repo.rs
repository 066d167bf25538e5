//! Repository for the `carts` table.
//!
//! A user has at most one `active` cart, enforced by the partial unique
//! index `uq_carts_active_user`.

use sqlx::PgPool;
use printshop_core::pricing::CART_TTL_DAYS;
use printshop_core::types::DbId;

use crate::models::cart::Cart;
use crate::models::status::CartStatus;

const COLUMNS: &str = "id, user_id, status, version, expires_at, created_at, updated_at";

pub struct CartRepo;

impl CartRepo {
    /// The user's active cart, if any.
    pub async fn find_active(pool: &PgPool, user_id: DbId) -> Result<Option<Cart>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM carts WHERE user_id = $1 AND status = $2");
        sqlx::query_as::<_, Cart>(&query)
            .bind(user_id)
            .bind(CartStatus::Active.as_str())
            .fetch_optional(pool)
            .await
    }

    /// The user's active cart, created with a fresh expiry if none exists.
    ///
    /// Concurrent callers race on the partial unique index; the loser's insert
    /// is a no-op and both read back the same row.
    pub async fn get_or_create_active(pool: &PgPool, user_id: DbId) -> Result<Cart, sqlx::Error> {
        if let Some(cart) = Self::find_active(pool, user_id).await? {
            return Ok(cart);
        }

        let ttl_days = i32::try_from(CART_TTL_DAYS).unwrap_or(i32::MAX);
        sqlx::query(
            "INSERT INTO carts (user_id, status, expires_at)
             VALUES ($1, $2, now() + make_interval(days => $3))
             ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING",
        )
        .bind(user_id)
        .bind(CartStatus::Active.as_str())
        .bind(ttl_days)
        .execute(pool)
        .await?;

        Self::find_active(pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Cart>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM carts WHERE id = $1");
        sqlx::query_as::<_, Cart>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
