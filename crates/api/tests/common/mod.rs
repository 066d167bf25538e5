#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgba, RgbaImage};
use printshop_ai::{ProviderRegistry, ProviderSettings};
use printshop_api::auth::jwt::{generate_access_token, JwtConfig};
use printshop_api::config::ServerConfig;
use printshop_api::router::build_app_router;
use printshop_api::state::AppState;
use printshop_core::pricing::{CalcMode, PriceAmounts, PriceOwner};
use printshop_core::roles::{ROLE_ADMIN, ROLE_USER};
use printshop_core::storage::StorageLayout;
use printshop_core::types::{Cents, DbId};
use printshop_db::models::catalog::{CreateArticle, CreateArticleVariant};
use printshop_db::models::price::CreatePrice;
use printshop_db::models::prompt::CreatePrompt;
use printshop_db::models::user::CreateUser;
use printshop_db::repositories::{ArticleRepo, PriceRepo, PromptRepo, UserRepo};
use printshop_pipeline::generation::GenerationService;
use printshop_print::{FtpError, PdfDispatcher, PdfUploader};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// A `ServerConfig` with safe defaults rooted at `storage_root`.
pub fn test_config(storage_root: &Path) -> ServerConfig {
    ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        database_url: "postgres://unused".to_string(),
        storage_root: storage_root.to_path_buf(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 5 * 1024 * 1024,
        qr_pixels: 100,
        frontend_dist: None,
        providers: ProviderSettings {
            test_mode: true,
            ..Default::default()
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A registry in test mode: every hint resolves to the mock provider.
pub fn mock_registry() -> Arc<ProviderRegistry> {
    Arc::new(ProviderRegistry::new(ProviderSettings {
        test_mode: true,
        ..Default::default()
    }))
}

/// The full application with the mock provider and a recording uploader.
pub fn build_test_app(pool: PgPool, storage_root: &Path) -> Router {
    build_test_app_with(
        pool,
        storage_root,
        mock_registry(),
        Arc::new(RecordingUploader::default()),
    )
}

/// The full application with the given provider registry and PDF uploader.
pub fn build_test_app_with(
    pool: PgPool,
    storage_root: &Path,
    registry: Arc<ProviderRegistry>,
    uploader: Arc<dyn PdfUploader>,
) -> Router {
    let config = test_config(storage_root);
    let layout = StorageLayout::new(storage_root);
    let state = AppState {
        generation: GenerationService::new(pool.clone(), layout.clone(), registry),
        pdf_dispatcher: PdfDispatcher::new(uploader),
        pool,
        config: Arc::new(config.clone()),
        layout,
    };
    build_app_router(state, &config)
}

pub fn user_token(user_id: DbId) -> String {
    token(user_id, ROLE_USER)
}

pub fn admin_token(user_id: DbId) -> String {
    token(user_id, ROLE_ADMIN)
}

fn token(user_id: DbId, role: &str) -> String {
    let config = JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    };
    generate_access_token(user_id, role, &config).unwrap()
}

// ---------------------------------------------------------------------------
// Uploaders
// ---------------------------------------------------------------------------

/// Accepts every upload and remembers the remote paths.
#[derive(Default)]
pub struct RecordingUploader {
    pub paths: Mutex<Vec<String>>,
}

#[async_trait]
impl PdfUploader for RecordingUploader {
    async fn upload(&self, remote_path: &str, _bytes: Vec<u8>) -> Result<(), FtpError> {
        self.paths.lock().unwrap().push(remote_path.to_string());
        Ok(())
    }
}

/// Fails every upload at the write step.
pub struct FailingUploader;

#[async_trait]
impl PdfUploader for FailingUploader {
    async fn upload(&self, _remote_path: &str, _bytes: Vec<u8>) -> Result<(), FtpError> {
        Err(FtpError::UploadFailed {
            stage: "write",
            message: "permission denied".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn json_auth(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    json_auth(app, Method::POST, uri, token, body).await
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, String),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: Vec<u8>,
    },
}

const BOUNDARY: &str = "printshop-test-boundary";

pub fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    parts: Vec<Part<'_>>,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub fn image_part(bytes: Vec<u8>) -> Part<'static> {
    Part::File {
        name: "image",
        filename: "photo.png",
        content_type: "image/png",
        bytes,
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            role: None,
            first_name: Some("Test".into()),
            last_name: Some("User".into()),
        },
    )
    .await
    .unwrap()
    .id
}

pub fn gross(amount: Cents) -> PriceAmounts {
    PriceAmounts::from_amount(amount, 1900, CalcMode::Gross).unwrap()
}

pub async fn seed_price(pool: &PgPool, owner: PriceOwner, amount: Cents) -> DbId {
    PriceRepo::create(
        pool,
        &CreatePrice {
            owner: Some(owner),
            purchase: gross(0),
            sales: gross(amount),
            calc_mode: CalcMode::Gross,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn set_price(pool: &PgPool, price_id: DbId, amount: Cents) {
    PriceRepo::update_sales(pool, price_id, gross(amount))
        .await
        .unwrap()
        .expect("price exists");
}

/// A mug with one variant and a price. Returns `(article, variant, price)`.
pub async fn seed_mug(pool: &PgPool, name: &str, amount: Cents) -> (DbId, DbId, DbId) {
    let article = ArticleRepo::create(
        pool,
        &CreateArticle {
            name: name.to_string(),
            article_type: "MUG".into(),
            supplier_article_name: Some("Sublimation Mug".into()),
            supplier_article_number: Some("SM-11".into()),
        },
    )
    .await
    .unwrap();
    let variant = ArticleRepo::create_variant(
        pool,
        &CreateArticleVariant {
            article_id: article.id,
            name: "White".into(),
        },
    )
    .await
    .unwrap();
    let price = seed_price(pool, PriceOwner::Article(article.id), amount).await;
    (article.id, variant.id, price)
}

pub async fn seed_prompt(pool: &PgPool, title: &str, text: Option<&str>) -> DbId {
    PromptRepo::create(
        pool,
        &CreatePrompt {
            title: title.to_string(),
            prompt_text: text.map(str::to_string),
        },
    )
    .await
    .unwrap()
    .id
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 220, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn checkout_body() -> Value {
    serde_json::json!({
        "customerEmail": "ada@example.com",
        "customerFirstName": "Ada",
        "customerLastName": "Lovelace",
        "shippingAddress": {
            "streetAddress1": "1 Main St",
            "city": "Springfield",
            "postalCode": "12345",
            "country": "US"
        },
        "useShippingAsBilling": true
    })
}
