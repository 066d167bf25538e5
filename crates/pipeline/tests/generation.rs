mod common;

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::{mock_registry, png, seed_prompt, seed_user};
use printshop_ai::{ImageProvider, ProviderError, ProviderRegistry};
use printshop_core::error::CoreError;
use printshop_core::storage::StorageLayout;
use printshop_db::repositories::GeneratedImageRepo;
use printshop_pipeline::generation::{GenerationRequest, GenerationService, PromptTestRequest};
use printshop_pipeline::PipelineError;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Echoes the input image and remembers every prompt it saw.
#[derive(Default)]
struct RecordingProvider {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn edit_single(
        &self,
        _cancel: &CancellationToken,
        image: &[u8],
        prompt: &str,
    ) -> Result<Vec<Vec<u8>>, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(vec![image.to_vec()])
    }
}

struct BlockedProvider;

#[async_trait]
impl ImageProvider for BlockedProvider {
    fn name(&self) -> &'static str {
        "blocked"
    }

    async fn edit_single(
        &self,
        _cancel: &CancellationToken,
        _image: &[u8],
        _prompt: &str,
    ) -> Result<Vec<Vec<u8>>, ProviderError> {
        Err(ProviderError::SafetyBlocked {
            reason: "SAFETY".into(),
        })
    }
}

fn request(user_id: i64, prompt_id: i64) -> GenerationRequest {
    GenerationRequest {
        user_id,
        prompt_id,
        image: png(512, 512),
        content_type: "image/png".into(),
        original_filename: Some("holiday.png".into()),
        crop: None,
        provider: None,
        client_ip: Some("203.0.113.7".into()),
    }
}

fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_mode_stores_four_candidates(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    let user = seed_user(&pool, "gen@example.com").await;
    let prompt = seed_prompt(&pool, "Snowy Scene", Some("snow")).await;
    let service = GenerationService::new(pool.clone(), layout.clone(), mock_registry());

    let out = service
        .generate(&CancellationToken::new(), request(user, prompt))
        .await
        .unwrap();

    assert_eq!(out.image_urls.len(), 4);
    assert_eq!(out.generated_image_ids.len(), 4);
    assert!(out
        .image_urls
        .iter()
        .all(|u| u.starts_with("/api/user/images/") && u.ends_with(".png")));

    let names = files_in(&layout.user_dir(user));
    assert_eq!(names.len(), 5);
    assert_eq!(names.iter().filter(|n| n.ends_with("_original.png")).count(), 1);
    for k in 1..=4 {
        let suffix = format!("_generated_{k}.png");
        assert_eq!(names.iter().filter(|n| n.ends_with(&suffix)).count(), 1);
    }

    let row = GeneratedImageRepo::find_by_id(&pool, out.generated_image_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.user_id, Some(user));
    assert_eq!(row.prompt_id, prompt);
    assert_eq!(row.ip_address.as_deref(), Some("203.0.113.7"));
    let siblings = GeneratedImageRepo::list_by_upload(&pool, row.uploaded_image_id.unwrap())
        .await
        .unwrap();
    assert_eq!(siblings.len(), 4);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn title_is_used_when_prompt_has_no_text(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "title@example.com").await;
    let prompt = seed_prompt(&pool, "Snowy Scene", None).await;
    let provider = Arc::new(RecordingProvider::default());
    let registry = Arc::new(ProviderRegistry::fixed(provider.clone()));
    let service = GenerationService::new(pool.clone(), StorageLayout::new(tmp.path()), registry);

    service
        .generate(&CancellationToken::new(), request(user, prompt))
        .await
        .unwrap();

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 4);
    assert!(prompts.iter().all(|p| p == "Snowy Scene"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn safety_block_is_surfaced(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "blocked@example.com").await;
    let prompt = seed_prompt(&pool, "Snowy Scene", Some("snow")).await;
    let registry = Arc::new(ProviderRegistry::fixed(Arc::new(BlockedProvider)));
    let service = GenerationService::new(pool.clone(), StorageLayout::new(tmp.path()), registry);

    let err = service
        .generate(&CancellationToken::new(), request(user, prompt))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        PipelineError::Provider(ProviderError::SafetyBlocked { reason }) if reason == "SAFETY"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejects_non_images_and_unknown_prompts(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "bad@example.com").await;
    let prompt = seed_prompt(&pool, "Snowy Scene", Some("snow")).await;
    let service = GenerationService::new(pool.clone(), StorageLayout::new(tmp.path()), mock_registry());

    let mut pdf = request(user, prompt);
    pdf.content_type = "application/pdf".into();
    assert_matches!(
        service.generate(&CancellationToken::new(), pdf).await,
        Err(PipelineError::Core(CoreError::Validation(_)))
    );

    assert_matches!(
        service
            .generate(&CancellationToken::new(), request(user, prompt + 1000))
            .await,
        Err(PipelineError::Core(CoreError::NotFound { entity: "Prompt", .. }))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_provider_hint_is_a_validation_error(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "hint@example.com").await;
    let prompt = seed_prompt(&pool, "Snowy Scene", Some("snow")).await;
    let registry = Arc::new(ProviderRegistry::new(Default::default()));
    let service = GenerationService::new(pool.clone(), StorageLayout::new(tmp.path()), registry);

    let mut req = request(user, prompt);
    req.provider = Some("dalle-9000".into());
    assert_matches!(
        service.generate(&CancellationToken::new(), req).await,
        Err(PipelineError::Core(CoreError::Validation(_)))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn prompt_test_writes_to_shared_directory(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    let prompt = seed_prompt(&pool, "Snowy Scene", Some("snow")).await;
    let service = GenerationService::new(pool.clone(), layout.clone(), mock_registry());

    let out = service
        .test_prompt(
            &CancellationToken::new(),
            PromptTestRequest {
                prompt_id: prompt,
                image: png(64, 64),
                content_type: "image/png".into(),
                provider: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(out.generated_image_ids.len(), 4);
    assert!(out.image_urls[0].starts_with("/api/admin/prompt-test-images/"));
    assert_eq!(files_in(&layout.prompt_test_dir()).len(), 5);

    let row = GeneratedImageRepo::find_by_id(&pool, out.generated_image_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.user_id, None);
    assert_eq!(row.uploaded_image_id, None);
}
