//! Repository for `prompts` and their slot variants.

use sqlx::PgPool;
use printshop_core::types::DbId;

use crate::models::prompt::{CreatePrompt, CreateSlotVariant, Prompt, SlotType, SlotVariant};

const COLUMNS: &str = "id, title, prompt_text, category_id, subcategory_id, price_id, active, \
    example_image, created_at, updated_at";

const VARIANT_SELECT: &str = "SELECT v.id, v.slot_type_id, v.name, v.prompt, v.llm_id, \
    v.example_image, t.position AS slot_position
    FROM prompt_slot_variants v
    LEFT JOIN prompt_slot_types t ON t.id = v.slot_type_id";

pub struct PromptRepo;

impl PromptRepo {
    pub async fn create(pool: &PgPool, input: &CreatePrompt) -> Result<Prompt, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompts (title, prompt_text) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(&input.title)
            .bind(&input.prompt_text)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE id = $1");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Point a prompt at a legacy price row.
    pub async fn set_legacy_price(
        pool: &PgPool,
        id: DbId,
        price_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE prompts SET price_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(price_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_example_image(
        pool: &PgPool,
        id: DbId,
        filename: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE prompts SET example_image = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(filename)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Slot types and variants
    // -----------------------------------------------------------------------

    pub async fn create_slot_type(
        pool: &PgPool,
        name: &str,
        position: i32,
    ) -> Result<SlotType, sqlx::Error> {
        sqlx::query_as::<_, SlotType>(
            "INSERT INTO prompt_slot_types (name, position) VALUES ($1, $2)
             RETURNING id, name, position",
        )
        .bind(name)
        .bind(position)
        .fetch_one(pool)
        .await
    }

    pub async fn create_slot_variant(
        pool: &PgPool,
        input: &CreateSlotVariant,
    ) -> Result<SlotVariant, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO prompt_slot_variants (slot_type_id, name, prompt)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(input.slot_type_id)
        .bind(&input.name)
        .bind(&input.prompt)
        .fetch_one(pool)
        .await?;
        Self::find_slot_variant(pool, row.0)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_slot_variant(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SlotVariant>, sqlx::Error> {
        let query = format!("{VARIANT_SELECT} WHERE v.id = $1");
        sqlx::query_as::<_, SlotVariant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Attach a slot variant to a prompt; attaching twice is a no-op.
    pub async fn attach_slot_variant(
        pool: &PgPool,
        prompt_id: DbId,
        slot_variant_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO prompt_slot_variant_refs (prompt_id, slot_variant_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(prompt_id)
        .bind(slot_variant_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Slot variants of a prompt, unordered; composition sorts them.
    pub async fn slot_variants_for(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<SlotVariant>, sqlx::Error> {
        let query = format!(
            "{VARIANT_SELECT}
             JOIN prompt_slot_variant_refs r ON r.slot_variant_id = v.id
             WHERE r.prompt_id = $1"
        );
        sqlx::query_as::<_, SlotVariant>(&query)
            .bind(prompt_id)
            .fetch_all(pool)
            .await
    }

    pub async fn set_slot_variant_example_image(
        pool: &PgPool,
        id: DbId,
        filename: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE prompt_slot_variants SET example_image = $2 WHERE id = $1")
                .bind(id)
                .bind(filename)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
