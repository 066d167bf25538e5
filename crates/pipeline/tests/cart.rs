mod common;

use assert_matches::assert_matches;
use common::{add, seed_mug, seed_price, seed_prompt, seed_user, set_price};
use printshop_core::error::CoreError;
use printshop_core::pricing::PriceOwner;
use printshop_pipeline::cart;
use printshop_pipeline::PipelineError;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn drift_is_reported_after_refresh(pool: PgPool) {
    let user = seed_user(&pool, "drift@example.com").await;
    let (article, variant, price) = seed_mug(&pool, "Classic Mug", 1000).await;

    cart::add_item(&pool, user, &add(article, variant, 2)).await.unwrap();
    set_price(&pool, price, 1200).await;

    let view = cart::get_cart(&pool, user).await.unwrap();
    let item = &view.items[0];
    assert_eq!(item.price_at_time, 1000);
    assert_eq!(item.original_price, 1000);
    assert!(!item.drift.has_price_changed);

    let view = cart::refresh_prices(&pool, user).await.unwrap();
    let item = &view.items[0];
    assert_eq!(item.price_at_time, 1000);
    assert_eq!(item.original_price, 1200);
    assert!(item.drift.has_price_changed);
    assert!(!item.drift.has_prompt_price_changed);
    assert_eq!(view.summary.total_price, 2000);

    let again = cart::refresh_prices(&pool, user).await.unwrap();
    assert_eq!(again.items[0].original_price, 1200);
    assert_eq!(again.version, view.version);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn prompt_surcharge_counts_towards_total(pool: PgPool) {
    let user = seed_user(&pool, "surcharge@example.com").await;
    let (mug, mug_variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let (big, big_variant, _) = seed_mug(&pool, "Big Mug", 1500).await;
    let prompt = seed_prompt(&pool, "Snowy Scene", Some("snow")).await;
    seed_price(&pool, PriceOwner::Prompt(prompt), 250).await;

    let mut with_prompt = add(mug, mug_variant, 2);
    with_prompt.prompt_id = Some(prompt);
    cart::add_item(&pool, user, &with_prompt).await.unwrap();
    let view = cart::add_item(&pool, user, &add(big, big_variant, 1)).await.unwrap();

    assert_eq!(view.summary.total_price, 4000);
    assert_eq!(view.summary.item_count, 3);
    assert!(view.summary.has_items);
    assert_eq!(view.items.iter().filter(|i| i.prompt_id.is_some()).count(), 1);
    assert_eq!(view.items[0].prompt_price_at_time, 250);
    assert_eq!(view.items[0].total_price, 2500);

    let summary = cart::summary(&pool, user).await.unwrap();
    assert_eq!(summary, view.summary);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn same_line_merges_regardless_of_key_order(pool: PgPool) {
    let user = seed_user(&pool, "merge@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;

    let mut first = add(article, variant, 1);
    first.custom_data = Some(json!({"text": "hi", "color": "red"}));
    let mut second = add(article, variant, 0);
    second.custom_data = Some(json!({"color": "red", "text": "hi"}));

    cart::add_item(&pool, user, &first).await.unwrap();
    let view = cart::add_item(&pool, user, &second).await.unwrap();

    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.items[0].custom_data, json!({"color": "red", "text": "hi"}));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_repacks_positions(pool: PgPool) {
    let user = seed_user(&pool, "repack@example.com").await;
    let (a, av, _) = seed_mug(&pool, "A", 100).await;
    let (b, bv, _) = seed_mug(&pool, "B", 200).await;
    let (c, cv, _) = seed_mug(&pool, "C", 300).await;

    cart::add_item(&pool, user, &add(a, av, 1)).await.unwrap();
    let middle = cart::add_item(&pool, user, &add(b, bv, 1)).await.unwrap().items[1].id;
    cart::add_item(&pool, user, &add(c, cv, 1)).await.unwrap();

    let view = cart::remove_item(&pool, user, middle).await.unwrap();
    let positions: Vec<(i64, i32)> = view.items.iter().map(|i| (i.article_id, i.position)).collect();
    assert_eq!(positions, vec![(a, 0), (c, 1)]);

    assert_matches!(
        cart::remove_item(&pool, user, middle).await,
        Err(PipelineError::Core(CoreError::NotFound { entity: "CartItem", .. }))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn quantity_rules(pool: PgPool) {
    let user = seed_user(&pool, "qty@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let view = cart::add_item(&pool, user, &add(article, variant, -5)).await.unwrap();
    let item = view.items[0].id;
    assert_eq!(view.items[0].quantity, 1);

    assert_matches!(
        cart::update_item(&pool, user, item, 0).await,
        Err(PipelineError::Core(CoreError::Validation(_)))
    );
    let view = cart::update_item(&pool, user, item, 4).await.unwrap();
    assert_eq!(view.items[0].quantity, 4);
    assert_eq!(view.summary.item_count, 4);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn variant_must_belong_to_article(pool: PgPool) {
    let user = seed_user(&pool, "owner@example.com").await;
    let (a, _, _) = seed_mug(&pool, "A", 100).await;
    let (_, bv, _) = seed_mug(&pool, "B", 200).await;

    assert_matches!(
        cart::add_item(&pool, user, &add(a, bv, 1)).await,
        Err(PipelineError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        cart::add_item(&pool, user, &add(a + 1000, bv, 1)).await,
        Err(PipelineError::Core(CoreError::NotFound { entity: "Article", .. }))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn clear_keeps_the_cart(pool: PgPool) {
    let user = seed_user(&pool, "clear@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let before = cart::add_item(&pool, user, &add(article, variant, 2)).await.unwrap();

    cart::clear(&pool, user).await.unwrap();

    let after = cart::get_cart(&pool, user).await.unwrap();
    assert_eq!(after.id, before.id);
    assert!(after.items.is_empty());
    assert!(!after.summary.has_items);
    assert!(after.version > before.version);
}
