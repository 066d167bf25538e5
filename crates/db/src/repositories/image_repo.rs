//! Repositories for `uploaded_images` and `generated_images`.

use sqlx::PgPool;
use printshop_core::types::DbId;

use crate::models::image::{
    CreateGeneratedImage, CreateUploadedImage, GeneratedImage, UploadedImage,
};

const UPLOADED_COLUMNS: &str = "id, uuid, original_filename, stored_filename, content_type, \
    file_size, user_id, created_at";

const GENERATED_COLUMNS: &str =
    "id, uuid, filename, prompt_id, user_id, uploaded_image_id, ip_address, created_at";

pub struct UploadedImageRepo;

impl UploadedImageRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateUploadedImage,
    ) -> Result<UploadedImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO uploaded_images
                (uuid, original_filename, stored_filename, content_type, file_size, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {UPLOADED_COLUMNS}"
        );
        sqlx::query_as::<_, UploadedImage>(&query)
            .bind(input.uuid)
            .bind(&input.original_filename)
            .bind(&input.stored_filename)
            .bind(&input.content_type)
            .bind(input.file_size)
            .bind(input.user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UploadedImage>, sqlx::Error> {
        let query = format!("SELECT {UPLOADED_COLUMNS} FROM uploaded_images WHERE id = $1");
        sqlx::query_as::<_, UploadedImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

pub struct GeneratedImageRepo;

impl GeneratedImageRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateGeneratedImage,
    ) -> Result<GeneratedImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO generated_images
                (uuid, filename, prompt_id, user_id, uploaded_image_id, ip_address)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {GENERATED_COLUMNS}"
        );
        sqlx::query_as::<_, GeneratedImage>(&query)
            .bind(input.uuid)
            .bind(&input.filename)
            .bind(input.prompt_id)
            .bind(input.user_id)
            .bind(input.uploaded_image_id)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<GeneratedImage>, sqlx::Error> {
        let query = format!("SELECT {GENERATED_COLUMNS} FROM generated_images WHERE id = $1");
        sqlx::query_as::<_, GeneratedImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All candidates derived from one upload, oldest first.
    pub async fn list_by_upload(
        pool: &PgPool,
        uploaded_image_id: DbId,
    ) -> Result<Vec<GeneratedImage>, sqlx::Error> {
        let query = format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_images
             WHERE uploaded_image_id = $1
             ORDER BY id"
        );
        sqlx::query_as::<_, GeneratedImage>(&query)
            .bind(uploaded_image_id)
            .fetch_all(pool)
            .await
    }
}
