//! Artwork generation.
//!
//! An upload is canonicalized to PNG, stored next to its generated
//! candidates in the owner's private directory, and sent to the selected
//! provider through the [`Orchestrator`]. Every candidate the provider
//! returns is stored as `<upload uuid>_generated_<k>.png` and recorded as a
//! `generated_images` row.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use printshop_ai::{ImageProvider, Orchestrator, ProviderError, ProviderRegistry};
use printshop_core::error::CoreError;
use printshop_core::imaging::{self, CropRect};
use printshop_core::naming;
use printshop_core::prompt_compose::{compose_with_title_fallback, SlotVariantPart};
use printshop_core::storage::{store_bytes, StorageLayout};
use printshop_core::types::DbId;
use printshop_db::models::image::{CreateGeneratedImage, CreateUploadedImage};
use printshop_db::repositories::{GeneratedImageRepo, PromptRepo, UploadedImageRepo};
use printshop_db::DbPool;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::PipelineError;

/// Candidates requested per generation.
pub const GENERATION_CANDIDATES: i32 = 4;

/// Upper bound on the whole provider fan-out.
pub const GENERATION_DEADLINE: Duration = Duration::from_secs(120);

/// URL prefix of the admin prompt-test outputs.
pub const PROMPT_TEST_IMAGE_URL_PREFIX: &str = "/api/admin/prompt-test-images/";

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// A user generation request as received from the transport.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_id: DbId,
    pub prompt_id: DbId,
    pub image: Vec<u8>,
    /// Declared or inferred content type of the upload.
    pub content_type: String,
    pub original_filename: Option<String>,
    pub crop: Option<CropRect>,
    pub provider: Option<String>,
    /// Best-effort client address, recorded on every candidate row.
    pub client_ip: Option<String>,
}

/// An admin prompt test: no owner, no upload row.
#[derive(Debug, Clone)]
pub struct PromptTestRequest {
    pub prompt_id: DbId,
    pub image: Vec<u8>,
    pub content_type: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub image_urls: Vec<String>,
    pub generated_image_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GenerationService {
    pool: DbPool,
    layout: StorageLayout,
    registry: Arc<ProviderRegistry>,
    deadline: Duration,
}

impl GenerationService {
    pub fn new(pool: DbPool, layout: StorageLayout, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            pool,
            layout,
            registry,
            deadline: GENERATION_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Generate candidates for a user upload.
    ///
    /// Cancelling `cancel` aborts every in-flight provider call. Files and
    /// rows written before a failure are left in place.
    pub async fn generate(
        &self,
        cancel: &CancellationToken,
        req: GenerationRequest,
    ) -> Result<GenerationOutput, PipelineError> {
        ensure_image_content_type(&req.content_type)?;
        let prompt = self.composed_prompt(req.prompt_id).await?;
        let provider = self.provider(req.provider.as_deref())?;
        let (image, crop) = (req.image, req.crop);
        let source = run_blocking(move || prepare_source(&image, crop)).await?;

        let upload_uuid = Uuid::new_v4();
        let dir = self.layout.user_dir(req.user_id);
        let stored_filename = naming::original_filename(upload_uuid);
        store_bytes(&source, &dir, &stored_filename, "png", false).await?;

        let uploaded = UploadedImageRepo::create(
            &self.pool,
            &CreateUploadedImage {
                uuid: upload_uuid,
                original_filename: req
                    .original_filename
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| stored_filename.clone()),
                stored_filename,
                content_type: imaging::DEFAULT_MIME.to_string(),
                file_size: source.len() as i64,
                user_id: req.user_id,
            },
        )
        .await?;

        let images = self.run(cancel, provider, &source, &prompt).await?;

        let files = run_blocking(move || candidate_files(upload_uuid, images).collect::<Vec<_>>())
            .await?;

        let mut output = GenerationOutput::default();
        for (filename, bytes) in files {
            store_bytes(&bytes, &dir, &filename, "png", false).await?;
            let row = GeneratedImageRepo::create(
                &self.pool,
                &CreateGeneratedImage {
                    uuid: Uuid::new_v4(),
                    filename: filename.clone(),
                    prompt_id: req.prompt_id,
                    user_id: Some(req.user_id),
                    uploaded_image_id: Some(uploaded.id),
                    ip_address: req.client_ip.clone(),
                },
            )
            .await?;
            output.image_urls.push(naming::user_image_url(&filename));
            output.generated_image_ids.push(row.id);
        }

        tracing::info!(
            user_id = req.user_id,
            prompt_id = req.prompt_id,
            uploaded_image_id = uploaded.id,
            candidates = output.generated_image_ids.len(),
            "Generated artwork candidates",
        );
        Ok(output)
    }

    /// Run a prompt against a sample image into the shared prompt-test directory.
    pub async fn test_prompt(
        &self,
        cancel: &CancellationToken,
        req: PromptTestRequest,
    ) -> Result<GenerationOutput, PipelineError> {
        ensure_image_content_type(&req.content_type)?;
        let prompt = self.composed_prompt(req.prompt_id).await?;
        let provider = self.provider(req.provider.as_deref())?;
        let image = req.image;
        let source = run_blocking(move || prepare_source(&image, None)).await?;

        let upload_uuid = Uuid::new_v4();
        let dir = self.layout.prompt_test_dir();
        store_bytes(&source, &dir, &naming::original_filename(upload_uuid), "png", false).await?;

        let images = self.run(cancel, provider, &source, &prompt).await?;

        let files = run_blocking(move || candidate_files(upload_uuid, images).collect::<Vec<_>>())
            .await?;

        let mut output = GenerationOutput::default();
        for (filename, bytes) in files {
            store_bytes(&bytes, &dir, &filename, "png", false).await?;
            let row = GeneratedImageRepo::create(
                &self.pool,
                &CreateGeneratedImage {
                    uuid: Uuid::new_v4(),
                    filename: filename.clone(),
                    prompt_id: req.prompt_id,
                    user_id: None,
                    uploaded_image_id: None,
                    ip_address: None,
                },
            )
            .await?;
            output
                .image_urls
                .push(format!("{PROMPT_TEST_IMAGE_URL_PREFIX}{filename}"));
            output.generated_image_ids.push(row.id);
        }

        tracing::info!(
            prompt_id = req.prompt_id,
            candidates = output.generated_image_ids.len(),
            "Prompt test generation finished",
        );
        Ok(output)
    }

    /// The prompt text sent to the provider, falling back to the title.
    pub async fn composed_prompt(&self, prompt_id: DbId) -> Result<String, PipelineError> {
        let prompt = PromptRepo::find_by_id(&self.pool, prompt_id)
            .await?
            .ok_or(PipelineError::not_found("Prompt", prompt_id))?;
        let variants = PromptRepo::slot_variants_for(&self.pool, prompt_id).await?;
        let parts: Vec<SlotVariantPart> = variants.iter().map(SlotVariantPart::from).collect();

        let composed =
            compose_with_title_fallback(&prompt.title, prompt.prompt_text.as_deref(), &parts);
        if composed.is_empty() {
            return Err(PipelineError::validation(format!(
                "Prompt {prompt_id} has no text"
            )));
        }
        Ok(composed)
    }

    /// Resolve the provider; an unknown hint is a client error.
    fn provider(&self, hint: Option<&str>) -> Result<Arc<dyn ImageProvider>, PipelineError> {
        self.registry.resolve(hint).map_err(|e| match e {
            ProviderError::Unsupported(name) => {
                PipelineError::validation(format!("Unknown image provider '{name}'"))
            }
            other => other.into(),
        })
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        provider: Arc<dyn ImageProvider>,
        source: &[u8],
        prompt: &str,
    ) -> Result<Vec<Vec<u8>>, PipelineError> {
        let orchestrator = Orchestrator::new(provider).with_deadline(self.deadline);
        tracing::debug!(
            provider = orchestrator.provider_name(),
            candidates = GENERATION_CANDIDATES,
            "Dispatching generation",
        );
        let images = orchestrator
            .edit(cancel, source, prompt, GENERATION_CANDIDATES)
            .await?;
        if images.is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }
        Ok(images)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject uploads that do not declare an `image/*` content type.
pub fn ensure_image_content_type(content_type: &str) -> Result<(), PipelineError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !essence.starts_with("image/") {
        return Err(PipelineError::validation(format!(
            "Uploaded file must be an image (got '{content_type}')"
        )));
    }
    Ok(())
}

/// Content type of an upload: the declared one, else inferred from its name.
pub fn upload_content_type(declared: Option<&str>, filename: Option<&str>) -> String {
    match declared.map(str::trim).filter(|c| !c.is_empty()) {
        Some(declared) => declared.to_string(),
        None => filename
            .map(|f| printshop_core::storage::content_type_for(Path::new(f)))
            .unwrap_or_default(),
    }
}

/// Crop (when asked) and canonicalize to PNG, passing bytes through on
/// decode failures.
pub fn prepare_source(bytes: &[u8], crop: Option<CropRect>) -> Vec<u8> {
    let cropped = match crop {
        Some(rect) => imaging::crop(bytes, rect).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Crop failed, using the uncropped upload");
            bytes.to_vec()
        }),
        None => bytes.to_vec(),
    };
    canonical_png(cropped)
}

fn canonical_png(bytes: Vec<u8>) -> Vec<u8> {
    match imaging::to_png(&bytes) {
        Ok(png) => png,
        Err(e) => {
            tracing::warn!(error = %e, "PNG canonicalization failed, keeping raw bytes");
            bytes
        }
    }
}

/// Decode and encode work runs off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, PipelineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CoreError::Internal(format!("Image task failed: {e}")).into())
}

/// Pair every candidate with its 1-based filename, in completion order.
fn candidate_files(
    upload_uuid: Uuid,
    images: Vec<Vec<u8>>,
) -> impl Iterator<Item = (String, Vec<u8>)> {
    images
        .into_iter()
        .enumerate()
        .map(move |(i, bytes)| (naming::generated_filename(upload_uuid, i + 1), canonical_png(bytes)))
}
