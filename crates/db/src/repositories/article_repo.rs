//! Repository for `articles`, `article_variants` and `mug_details`.

use sqlx::PgPool;
use printshop_core::types::DbId;

use crate::models::catalog::{
    Article, ArticleVariant, CreateArticle, CreateArticleVariant, MugDetails,
};

const ARTICLE_COLUMNS: &str = "id, name, article_type, supplier_id, supplier_article_name, \
    supplier_article_number, active, created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, article_id, name, example_image, active, created_at";

const MUG_COLUMNS: &str = "article_id, print_template_width_mm, print_template_height_mm, \
    document_format_width_mm, document_format_height_mm, document_format_margin_bottom_mm";

pub struct ArticleRepo;

impl ArticleRepo {
    pub async fn create(pool: &PgPool, input: &CreateArticle) -> Result<Article, sqlx::Error> {
        let query = format!(
            "INSERT INTO articles (name, article_type, supplier_article_name, supplier_article_number)
             VALUES ($1, $2, $3, $4)
             RETURNING {ARTICLE_COLUMNS}"
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(&input.name)
            .bind(&input.article_type)
            .bind(&input.supplier_article_name)
            .bind(&input.supplier_article_number)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Article>, sqlx::Error> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_variant(
        pool: &PgPool,
        input: &CreateArticleVariant,
    ) -> Result<ArticleVariant, sqlx::Error> {
        let query = format!(
            "INSERT INTO article_variants (article_id, name)
             VALUES ($1, $2)
             RETURNING {VARIANT_COLUMNS}"
        );
        sqlx::query_as::<_, ArticleVariant>(&query)
            .bind(input.article_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_variant(
        pool: &PgPool,
        variant_id: DbId,
    ) -> Result<Option<ArticleVariant>, sqlx::Error> {
        let query = format!("SELECT {VARIANT_COLUMNS} FROM article_variants WHERE id = $1");
        sqlx::query_as::<_, ArticleVariant>(&query)
            .bind(variant_id)
            .fetch_optional(pool)
            .await
    }

    /// Record the example image filename of a variant.
    pub async fn set_variant_example_image(
        pool: &PgPool,
        variant_id: DbId,
        filename: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE article_variants SET example_image = $2 WHERE id = $1")
            .bind(variant_id)
            .bind(filename)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert or replace the print geometry of a mug article.
    pub async fn upsert_mug_details(
        pool: &PgPool,
        details: &MugDetails,
    ) -> Result<MugDetails, sqlx::Error> {
        let query = format!(
            "INSERT INTO mug_details ({MUG_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (article_id) DO UPDATE SET
                print_template_width_mm = EXCLUDED.print_template_width_mm,
                print_template_height_mm = EXCLUDED.print_template_height_mm,
                document_format_width_mm = EXCLUDED.document_format_width_mm,
                document_format_height_mm = EXCLUDED.document_format_height_mm,
                document_format_margin_bottom_mm = EXCLUDED.document_format_margin_bottom_mm
             RETURNING {MUG_COLUMNS}"
        );
        sqlx::query_as::<_, MugDetails>(&query)
            .bind(details.article_id)
            .bind(details.print_template_width_mm)
            .bind(details.print_template_height_mm)
            .bind(details.document_format_width_mm)
            .bind(details.document_format_height_mm)
            .bind(details.document_format_margin_bottom_mm)
            .fetch_one(pool)
            .await
    }
}
