//! HTTP-level tests for checkout and order reads.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, checkout_body, get_auth, post_json_auth, seed_mug, seed_user, user_token,
};
use printshop_db::repositories::CartRepo;
use serde_json::json;
use sqlx::PgPool;

const CHECKOUT: &str = "/api/user/checkout";

#[sqlx::test(migrations = "../db/migrations")]
async fn checkout_converts_the_cart_once(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "buyer@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let app = common::build_test_app(pool.clone(), tmp.path());
    let token = user_token(user);

    let cart = body_json(
        post_json_auth(
            app.clone(),
            "/api/user/cart/items",
            &token,
            json!({"articleId": article, "variantId": variant, "quantity": 2}),
        )
        .await,
    )
    .await;
    let cart_id = cart["id"].as_i64().unwrap();

    let response = post_json_auth(app.clone(), CHECKOUT, &token, checkout_body()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["cartId"], cart_id);
    let total = order["totalAmount"].as_i64().unwrap();
    let parts = order["subtotal"].as_i64().unwrap()
        + order["taxAmount"].as_i64().unwrap()
        + order["shippingAmount"].as_i64().unwrap();
    assert_eq!(total, parts);

    let converted = CartRepo::find_by_id(&pool, cart_id).await.unwrap().unwrap();
    assert_eq!(converted.status, "converted");

    let response = post_json_auth(app, CHECKOUT, &token, checkout_body()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "cart-empty");
    assert_eq!(json["code"], "CART_EMPTY");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_checkout_payload_is_400(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "typo@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let app = common::build_test_app(pool, tmp.path());
    let token = user_token(user);
    post_json_auth(
        app.clone(),
        "/api/user/cart/items",
        &token,
        json!({"articleId": article, "variantId": variant}),
    )
    .await;

    let mut body = checkout_body();
    body["customerEmail"] = json!("not-an-email");
    let response = post_json_auth(app, CHECKOUT, &token, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn orders_are_listed_per_user(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "regular@example.com").await;
    let other = seed_user(&pool, "nosy@example.com").await;
    let (article, variant, _) = seed_mug(&pool, "Classic Mug", 1000).await;
    let app = common::build_test_app(pool, tmp.path());
    let token = user_token(user);

    for _ in 0..3 {
        post_json_auth(
            app.clone(),
            "/api/user/cart/items",
            &token,
            json!({"articleId": article, "variantId": variant}),
        )
        .await;
        let response = post_json_auth(app.clone(), CHECKOUT, &token, checkout_body()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let page = body_json(get_auth(app.clone(), "/api/user/orders?page=0&size=2", &token).await)
        .await;
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["content"].as_array().unwrap().len(), 2);

    let id = page["content"][0]["id"].as_str().unwrap().to_string();
    let response = get_auth(app.clone(), &format!("/api/user/orders/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"].as_array().unwrap().len(), 1);

    let response = get_auth(app.clone(), &format!("/api/user/orders/{id}"), &user_token(other))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let empty = body_json(get_auth(app, "/api/user/orders", &user_token(other)).await).await;
    assert_eq!(empty["totalElements"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn out_of_range_order_page_is_a_bad_request(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = seed_user(&pool, "far-page@example.com").await;
    let app = common::build_test_app(pool, tmp.path());

    let uri = format!("/api/user/orders?page={}&size=100", i64::MAX / 2);
    let response = get_auth(app, &uri, &user_token(user)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
