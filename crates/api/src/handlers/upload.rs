//! Multipart helpers shared by the upload endpoints.

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use printshop_core::imaging::CropRect;
use printshop_core::types::DbId;
use printshop_pipeline::generation::{ensure_image_content_type, upload_content_type};

use crate::error::{AppError, AppResult};

/// A file part read fully into memory.
#[derive(Debug)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    /// Declared type, else inferred from the filename.
    pub content_type: String,
}

impl UploadedFile {
    pub async fn read(field: Field<'_>) -> AppResult<Self> {
        let filename = field.file_name().map(str::to_string);
        let declared = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
            content_type: upload_content_type(declared.as_deref(), filename.as_deref()),
            filename,
        })
    }
}

/// Fields of an artwork generation form.
#[derive(Debug, Default)]
pub struct GenerationForm {
    pub image: Option<UploadedFile>,
    pub prompt_id: Option<DbId>,
    pub crop_x: Option<f64>,
    pub crop_y: Option<f64>,
    pub crop_width: Option<f64>,
    pub crop_height: Option<f64>,
    pub provider: Option<String>,
}

impl GenerationForm {
    /// Collect the known fields; unknown parts are skipped.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => form.image = Some(UploadedFile::read(field).await?),
                "promptId" => form.prompt_id = Some(parse_text(field, "promptId").await?),
                "cropX" => form.crop_x = Some(parse_text(field, "cropX").await?),
                "cropY" => form.crop_y = Some(parse_text(field, "cropY").await?),
                "cropWidth" => form.crop_width = Some(parse_text(field, "cropWidth").await?),
                "cropHeight" => form.crop_height = Some(parse_text(field, "cropHeight").await?),
                "provider" => {
                    form.provider = Some(text(field).await?).filter(|p| !p.trim().is_empty())
                }
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn take_image(&mut self) -> AppResult<UploadedFile> {
        self.image
            .take()
            .ok_or_else(|| AppError::BadRequest("Missing 'image' file".into()))
    }

    /// The crop rectangle; all four coordinates or none.
    pub fn crop(&self) -> AppResult<Option<CropRect>> {
        match (self.crop_x, self.crop_y, self.crop_width, self.crop_height) {
            (Some(x), Some(y), Some(width), Some(height)) => Ok(Some(CropRect {
                x,
                y,
                width,
                height,
            })),
            (None, None, None, None) => Ok(None),
            _ => Err(AppError::BadRequest(
                "cropX, cropY, cropWidth and cropHeight must be given together".into(),
            )),
        }
    }
}

/// Read the single `image` part of an admin upload; it must be an image.
pub async fn read_image_part(mut multipart: Multipart) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("image") {
            let file = UploadedFile::read(field).await?;
            ensure_image_content_type(&file.content_type)?;
            return Ok(file);
        }
    }
    Err(AppError::BadRequest("Missing 'image' file".into()))
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn parse_text<T: std::str::FromStr>(field: Field<'_>, name: &str) -> AppResult<T> {
    let raw = text(field).await?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid value for '{name}': {raw:?}")))
}
