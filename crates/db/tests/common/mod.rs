#![allow(dead_code)]

use printshop_core::pricing::{CalcMode, PriceAmounts, PriceOwner};
use printshop_core::types::{Cents, DbId};
use printshop_db::models::catalog::{CreateArticle, CreateArticleVariant};
use printshop_db::models::cart::NewCartItem;
use printshop_db::models::price::CreatePrice;
use printshop_db::models::prompt::CreatePrompt;
use printshop_db::models::user::CreateUser;
use printshop_db::repositories::{ArticleRepo, PriceRepo, PromptRepo, UserRepo};
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

pub async fn seed_price(pool: &PgPool, owner: Option<PriceOwner>, amount: Cents) -> DbId {
    PriceRepo::create(
        pool,
        &CreatePrice {
            owner,
            purchase: gross(0),
            sales: gross(amount),
            calc_mode: CalcMode::Gross,
        },
    )
    .await
    .unwrap()
    .id
}

/// An article with one variant and an owned price. Returns `(article, variant, price)`.
pub async fn seed_article(pool: &PgPool, name: &str, amount: Cents) -> (DbId, DbId, DbId) {
    let article = ArticleRepo::create(
        pool,
        &CreateArticle {
            name: name.to_string(),
            article_type: "MUG".into(),
            supplier_article_name: Some("Supplier Mug".into()),
            supplier_article_number: Some("SM-1".into()),
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
    let price = seed_price(pool, Some(PriceOwner::Article(article.id)), amount).await;
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

pub fn line(article_id: DbId, variant_id: DbId, quantity: i32, price: Cents) -> NewCartItem {
    NewCartItem {
        article_id,
        variant_id,
        quantity,
        article_price: price,
        prompt_price: 0,
        prompt_id: None,
        generated_image_id: None,
        custom_data: "{}".into(),
    }
}
