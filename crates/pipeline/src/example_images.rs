//! Admin-provided example images for prompts, slot variants and article
//! variants. These live under `public/` and are served without auth.

use std::path::Path;

use printshop_core::imaging;
use printshop_core::storage::{store_bytes, ProductKind, StorageLayout};
use printshop_core::types::DbId;
use printshop_db::repositories::{ArticleRepo, PromptRepo};
use printshop_db::DbPool;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;

/// URL prefix under which `<root>/public` is served.
pub const PUBLIC_URL_PREFIX: &str = "/public";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredExampleImage {
    pub filename: String,
    pub url: String,
}

/// Store a prompt's example image as PNG.
pub async fn store_prompt_example(
    pool: &DbPool,
    layout: &StorageLayout,
    prompt_id: DbId,
    bytes: &[u8],
) -> Result<StoredExampleImage, PipelineError> {
    PromptRepo::find_by_id(pool, prompt_id)
        .await?
        .ok_or(PipelineError::not_found("Prompt", prompt_id))?;

    let png = imaging::to_png(bytes)?;
    let stored = store(
        layout,
        &layout.prompt_example_dir(),
        &format!("prompt_{prompt_id}"),
        "png",
        &png,
    )
    .await?;
    PromptRepo::set_example_image(pool, prompt_id, &stored.filename).await?;

    tracing::info!(prompt_id, filename = %stored.filename, "Prompt example image stored");
    Ok(stored)
}

/// Store a slot variant's example image as PNG.
pub async fn store_slot_variant_example(
    pool: &DbPool,
    layout: &StorageLayout,
    slot_variant_id: DbId,
    bytes: &[u8],
) -> Result<StoredExampleImage, PipelineError> {
    PromptRepo::find_slot_variant(pool, slot_variant_id)
        .await?
        .ok_or(PipelineError::not_found("PromptSlotVariant", slot_variant_id))?;

    let png = imaging::to_png(bytes)?;
    let stored = store(
        layout,
        &layout.slot_variant_example_dir(),
        &format!("slot_variant_{slot_variant_id}"),
        "png",
        &png,
    )
    .await?;
    PromptRepo::set_slot_variant_example_image(pool, slot_variant_id, &stored.filename).await?;

    tracing::info!(
        slot_variant_id,
        filename = %stored.filename,
        "Slot variant example image stored",
    );
    Ok(stored)
}

/// Store an article variant's example image as WebP in the directory of the
/// article's product family.
pub async fn store_variant_example(
    pool: &DbPool,
    layout: &StorageLayout,
    article_id: DbId,
    variant_id: DbId,
    bytes: &[u8],
) -> Result<StoredExampleImage, PipelineError> {
    let article = ArticleRepo::find_by_id(pool, article_id)
        .await?
        .ok_or(PipelineError::not_found("Article", article_id))?;
    let variant = ArticleRepo::find_variant(pool, variant_id)
        .await?
        .filter(|v| v.article_id == article_id)
        .ok_or(PipelineError::not_found("ArticleVariant", variant_id))?;
    let kind = ProductKind::from_article_type(&article.article_type).ok_or_else(|| {
        PipelineError::validation(format!(
            "Article {article_id} has unsupported type '{}'",
            article.article_type
        ))
    })?;

    let webp = imaging::to_webp(bytes)?;
    let stored = store(
        layout,
        &layout.variant_example_dir(kind),
        &format!("variant_{}", variant.id),
        "webp",
        &webp,
    )
    .await?;
    ArticleRepo::set_variant_example_image(pool, variant.id, &stored.filename).await?;

    tracing::info!(
        article_id,
        variant_id,
        filename = %stored.filename,
        "Variant example image stored",
    );
    Ok(stored)
}

async fn store(
    layout: &StorageLayout,
    dir: &Path,
    stem: &str,
    ext: &str,
    bytes: &[u8],
) -> Result<StoredExampleImage, PipelineError> {
    let filename = format!("{stem}_{}.{ext}", Uuid::new_v4().simple());
    store_bytes(bytes, dir, &filename, ext, false).await?;
    Ok(StoredExampleImage {
        url: public_url(layout, dir, &filename),
        filename,
    })
}

/// URL of a file stored below `<root>/public`.
pub fn public_url(layout: &StorageLayout, dir: &Path, filename: &str) -> String {
    let public_root = layout.root().join("public");
    let relative = dir.strip_prefix(&public_root).unwrap_or(dir);
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{PUBLIC_URL_PREFIX}/{}/{filename}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_urls_mirror_the_layout() {
        let layout = StorageLayout::new("/srv/storage");
        assert_eq!(
            public_url(&layout, &layout.prompt_example_dir(), "p.png"),
            "/public/images/prompt-example-images/p.png"
        );
        assert_eq!(
            public_url(&layout, &layout.slot_variant_example_dir(), "s.png"),
            "/public/images/prompt-slot-variant-example-images/s.png"
        );
        assert_eq!(
            public_url(&layout, &layout.variant_example_dir(ProductKind::Shirt), "v.webp"),
            "/public/images/articles/shirts/variant-example-images/v.webp"
        );
    }
}
