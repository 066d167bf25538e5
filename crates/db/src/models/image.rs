//! Image entity models.
//!
//! - `uploaded_images` -- canonicalized user uploads
//! - `generated_images` -- AI-produced candidates derived from an upload

use serde::Serialize;
use sqlx::FromRow;
use printshop_core::types::{DbId, Timestamp};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// UploadedImage
// ---------------------------------------------------------------------------

/// A row from the `uploaded_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UploadedImage {
    pub id: DbId,
    pub uuid: Uuid,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub user_id: DbId,
    pub created_at: Timestamp,
}

/// DTO for recording an upload.
#[derive(Debug, Clone)]
pub struct CreateUploadedImage {
    pub uuid: Uuid,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub user_id: DbId,
}

// ---------------------------------------------------------------------------
// GeneratedImage
// ---------------------------------------------------------------------------

/// A row from the `generated_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeneratedImage {
    pub id: DbId,
    pub uuid: Uuid,
    pub filename: String,
    pub prompt_id: DbId,
    pub user_id: Option<DbId>,
    pub uploaded_image_id: Option<DbId>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for recording a generated candidate.
#[derive(Debug, Clone)]
pub struct CreateGeneratedImage {
    pub uuid: Uuid,
    pub filename: String,
    pub prompt_id: DbId,
    pub user_id: Option<DbId>,
    pub uploaded_image_id: Option<DbId>,
    pub ip_address: Option<String>,
}
