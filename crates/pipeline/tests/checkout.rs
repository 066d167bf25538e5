mod common;

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::{add, seed_mug, seed_user};
use printshop_core::storage::StorageLayout;
use printshop_db::repositories::CartRepo;
use printshop_pipeline::checkout::{self, CheckoutRequest};
use printshop_pipeline::orders::{self, PageParams};
use printshop_pipeline::{cart, PipelineError};
use printshop_print::{FtpError, PdfDispatcher, PdfUploader};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn checkout_request() -> CheckoutRequest {
    serde_json::from_value(json!({
        "customerEmail": "ada@example.com",
        "customerFirstName": "Ada",
        "customerLastName": "Lovelace",
        "shippingAddress": {
            "streetAddress1": "1 Main St",
            "city": "Springfield",
            "postalCode": "12345",
            "country": "US"
        }
    }))
    .unwrap()
}

#[derive(Default)]
struct RecordingUploader {
    paths: Mutex<Vec<String>>,
}

#[async_trait]
impl PdfUploader for RecordingUploader {
    async fn upload(&self, remote_path: &str, bytes: Vec<u8>) -> Result<(), FtpError> {
        assert!(bytes.starts_with(b"%PDF"));
        self.paths.lock().unwrap().push(remote_path.to_string());
        Ok(())
    }
}

struct FailingUploader;

#[async_trait]
impl PdfUploader for FailingUploader {
    async fn upload(&self, _remote_path: &str, _bytes: Vec<u8>) -> Result<(), FtpError> {
        Err(FtpError::UploadFailed {
            stage: "write",
            message: "permission denied".into(),
        })
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn checkout_converts_cart_once(pool: PgPool) {
    let user = seed_user(&pool, "buyer@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let before = cart::add_item(&pool, user, &add(article, variant, 2)).await.unwrap();

    let order = checkout::create_order_from_cart(&pool, user, &checkout_request())
        .await
        .unwrap();
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.status, "PENDING");
    assert_eq!(order.cart_id, before.id);
    assert_eq!(order.subtotal, 2000);
    assert_eq!(order.tax_amount, 160);
    assert_eq!(order.shipping_amount, 499);
    assert_eq!(order.total_amount, 2659);
    assert_eq!(order.billing_address, order.shipping_address);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].total_price, 2000);

    let converted = CartRepo::find_by_id(&pool, before.id).await.unwrap().unwrap();
    assert_eq!(converted.status, "converted");

    assert_matches!(
        checkout::create_order_from_cart(&pool, user, &checkout_request()).await,
        Err(PipelineError::CartEmpty)
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_cart_cannot_be_checked_out(pool: PgPool) {
    let user = seed_user(&pool, "empty@example.com").await;
    cart::get_cart(&pool, user).await.unwrap();

    assert_matches!(
        checkout::create_order_from_cart(&pool, user, &checkout_request()).await,
        Err(PipelineError::CartEmpty)
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn orders_are_paginated_and_scoped(pool: PgPool) {
    let user = seed_user(&pool, "pages@example.com").await;
    let other = seed_user(&pool, "other@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;

    for _ in 0..3 {
        cart::add_item(&pool, user, &add(article, variant, 1)).await.unwrap();
        checkout::create_order_from_cart(&pool, user, &checkout_request())
            .await
            .unwrap();
    }

    let page = orders::list_orders(
        &pool,
        user,
        PageParams {
            page: Some(1),
            size: Some(2),
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.content.len(), 1);

    let mine = page.content[0].id;
    assert!(orders::get_order(&pool, user, mine).await.is_ok());
    assert_matches!(
        orders::get_order(&pool, other, mine).await,
        Err(PipelineError::OrderNotFound(id)) if id == mine
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn order_pdf_is_uploaded_before_release(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    let user = seed_user(&pool, "pdf@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    cart::add_item(&pool, user, &add(article, variant, 3)).await.unwrap();
    let order = checkout::create_order_from_cart(&pool, user, &checkout_request())
        .await
        .unwrap();

    let uploader = Arc::new(RecordingUploader::default());
    let dispatcher = PdfDispatcher::new(uploader.clone());
    let pdf = orders::render_and_dispatch(&pool, &layout, &dispatcher, user, order.id, 100)
        .await
        .unwrap();

    assert!(pdf.remote_path.starts_with("orders/"));
    assert!(pdf
        .filename
        .starts_with(&format!("order_{}_", order.order_number)));
    assert_eq!(uploader.paths.lock().unwrap().as_slice(), [pdf.remote_path.clone()]);

    let failing = PdfDispatcher::new(Arc::new(FailingUploader));
    assert_matches!(
        orders::render_and_dispatch(&pool, &layout, &failing, user, order.id, 100).await,
        Err(PipelineError::Ftp(FtpError::UploadFailed { .. }))
    );

    assert_matches!(
        orders::render_and_dispatch(&pool, &layout, &dispatcher, user, Uuid::new_v4(), 100).await,
        Err(PipelineError::OrderNotFound(_))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn lines_added_after_checkout_start_a_new_cart(pool: PgPool) {
    let user = seed_user(&pool, "after@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let first = cart::add_item(&pool, user, &add(article, variant, 1)).await.unwrap();
    let order = checkout::create_order_from_cart(&pool, user, &checkout_request())
        .await
        .unwrap();

    let next = cart::add_item(&pool, user, &add(article, variant, 2)).await.unwrap();
    assert_ne!(next.id, first.id);
    assert_eq!(next.items.len(), 1);
    assert_eq!(next.items[0].quantity, 2);

    let stored = orders::get_order(&pool, user, order.id).await.unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].quantity, 1);
}
