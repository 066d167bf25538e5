//! Repository for the `prices` table.
//!
//! The current gross of an article or prompt is its owned price's
//! `sales_total_gross`; prompts fall back to their legacy `price_id`.
//! Missing prices resolve to 0.

use sqlx::PgPool;
use printshop_core::error::CoreError;
use printshop_core::pricing::{PriceAmounts, PriceOwner};
use printshop_core::types::{Cents, DbId};

use crate::models::price::{CreatePrice, Price};

const COLUMNS: &str = "id, article_id, prompt_id, purchase_total_net, purchase_total_tax, \
    purchase_total_gross, sales_total_net, sales_total_tax, sales_total_gross, \
    purchase_vat_rate_id, sales_vat_rate_id, calc_mode, corresponds_to, created_at, updated_at";

/// Failure of an owner reassignment.
#[derive(Debug, thiserror::Error)]
pub enum AssignOwnerError {
    #[error(transparent)]
    Rule(#[from] CoreError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub struct PriceRepo;

impl PriceRepo {
    pub async fn create(pool: &PgPool, input: &CreatePrice) -> Result<Price, sqlx::Error> {
        let (article_id, prompt_id) = owner_columns(input.owner);
        let query = format!(
            "INSERT INTO prices (article_id, prompt_id,
                purchase_total_net, purchase_total_tax, purchase_total_gross,
                sales_total_net, sales_total_tax, sales_total_gross,
                calc_mode, corresponds_to)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Price>(&query)
            .bind(article_id)
            .bind(prompt_id)
            .bind(input.purchase.net)
            .bind(input.purchase.tax)
            .bind(input.purchase.gross)
            .bind(input.sales.net)
            .bind(input.sales.tax)
            .bind(input.sales.gross)
            .bind(input.calc_mode.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Price>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prices WHERE id = $1");
        sqlx::query_as::<_, Price>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the sales side of a price. Returns `None` if the row is gone.
    pub async fn update_sales(
        pool: &PgPool,
        id: DbId,
        sales: PriceAmounts,
    ) -> Result<Option<Price>, sqlx::Error> {
        let query = format!(
            "UPDATE prices SET
                sales_total_net = $2,
                sales_total_tax = $3,
                sales_total_gross = $4,
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Price>(&query)
            .bind(id)
            .bind(sales.net)
            .bind(sales.tax)
            .bind(sales.gross)
            .fetch_optional(pool)
            .await
    }

    /// Attach a price to its owner.
    ///
    /// An unowned price may be claimed by anyone; an owned price may only be
    /// re-assigned to the same owner.
    pub async fn assign_owner(
        pool: &PgPool,
        id: DbId,
        owner: PriceOwner,
    ) -> Result<Option<Price>, AssignOwnerError> {
        let mut tx = pool.begin().await?;

        let current: Option<(Option<DbId>, Option<DbId>)> =
            sqlx::query_as("SELECT article_id, prompt_id FROM prices WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((article_id, prompt_id)) = current else {
            return Ok(None);
        };
        PriceOwner::ensure_assignable(PriceOwner::from_columns(article_id, prompt_id)?, owner)?;

        let (article_id, prompt_id) = owner_columns(Some(owner));
        let query = format!(
            "UPDATE prices SET article_id = $2, prompt_id = $3, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let price = sqlx::query_as::<_, Price>(&query)
            .bind(id)
            .bind(article_id)
            .bind(prompt_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(price))
    }

    /// Current gross of an article, 0 when it has no price.
    pub async fn article_gross(pool: &PgPool, article_id: DbId) -> Result<Cents, sqlx::Error> {
        let row: Option<(Cents,)> =
            sqlx::query_as("SELECT sales_total_gross FROM prices WHERE article_id = $1")
                .bind(article_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map_or(0, |r| r.0))
    }

    /// Current gross of a prompt: its owned price, else its legacy `price_id`, else 0.
    pub async fn prompt_gross(pool: &PgPool, prompt_id: DbId) -> Result<Cents, sqlx::Error> {
        let row: Option<(Option<Cents>,)> = sqlx::query_as(
            "SELECT COALESCE(owned.sales_total_gross, legacy.sales_total_gross)
             FROM prompts p
             LEFT JOIN prices owned ON owned.prompt_id = p.id
             LEFT JOIN prices legacy ON legacy.id = p.price_id
             WHERE p.id = $1",
        )
        .bind(prompt_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.and_then(|r| r.0).unwrap_or(0))
    }
}

fn owner_columns(owner: Option<PriceOwner>) -> (Option<DbId>, Option<DbId>) {
    match owner {
        Some(PriceOwner::Article(id)) => (Some(id), None),
        Some(PriceOwner::Prompt(id)) => (None, Some(id)),
        None => (None, None),
    }
}
