#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use printshop_ai::{ProviderRegistry, ProviderSettings};
use printshop_core::pricing::{CalcMode, PriceAmounts, PriceOwner};
use printshop_core::types::{Cents, DbId};
use printshop_db::models::catalog::{CreateArticle, CreateArticleVariant};
use printshop_db::models::price::CreatePrice;
use printshop_db::models::prompt::CreatePrompt;
use printshop_db::models::user::CreateUser;
use printshop_db::repositories::{ArticleRepo, PriceRepo, PromptRepo, UserRepo};
use printshop_pipeline::cart::AddCartItem;
use sqlx::PgPool;

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

pub fn add(article_id: DbId, variant_id: DbId, quantity: i32) -> AddCartItem {
    AddCartItem {
        article_id,
        variant_id,
        quantity: Some(quantity),
        prompt_id: None,
        generated_image_id: None,
        custom_data: None,
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 220, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn mock_registry() -> Arc<ProviderRegistry> {
    Arc::new(ProviderRegistry::new(ProviderSettings {
        test_mode: true,
        ..Default::default()
    }))
}
