//! Catalog entity models: articles, their variants and mug print geometry.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use printshop_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Article {
    pub id: DbId,
    pub name: String,
    /// `MUG` or `SHIRT`.
    pub article_type: String,
    pub supplier_id: Option<DbId>,
    pub supplier_article_name: Option<String>,
    pub supplier_article_number: Option<String>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new article.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticle {
    pub name: String,
    pub article_type: String,
    pub supplier_article_name: Option<String>,
    pub supplier_article_number: Option<String>,
}

// ---------------------------------------------------------------------------
// ArticleVariant
// ---------------------------------------------------------------------------

/// A row from the `article_variants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArticleVariant {
    pub id: DbId,
    pub article_id: DbId,
    pub name: String,
    pub example_image: Option<String>,
    pub active: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a new article variant.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticleVariant {
    pub article_id: DbId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// MugDetails
// ---------------------------------------------------------------------------

/// Print geometry of a mug article, all lengths in millimetres.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct MugDetails {
    pub article_id: DbId,
    pub print_template_width_mm: Option<f64>,
    pub print_template_height_mm: Option<f64>,
    pub document_format_width_mm: Option<f64>,
    pub document_format_height_mm: Option<f64>,
    pub document_format_margin_bottom_mm: Option<f64>,
}
