//! Authentication and role checks at the HTTP boundary.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get, get_auth, user_token};
use printshop_api::auth::jwt::{generate_access_token, JwtConfig};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_token_is_401(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let app = common::build_test_app(pool, tmp.path());

    let response = get(app, "/api/user/cart").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert!(json["detail"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn malformed_header_is_401(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let app = common::build_test_app(pool, tmp.path());
    let request = Request::get("/api/user/cart")
        .header("authorization", "Token abc")
        .body(Body::empty())
        .unwrap();

    let response = common::send(app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn token_signed_with_another_secret_is_401(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let app = common::build_test_app(pool, tmp.path());
    let forged = generate_access_token(
        1,
        "ADMIN",
        &JwtConfig {
            secret: "some-other-secret".into(),
            access_token_expiry_mins: 15,
        },
    )
    .unwrap();

    let response = get_auth(app, "/api/user/cart", &forged).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_routes_reject_plain_users(pool: PgPool) {
    let tmp = tempfile::tempdir().unwrap();
    let user = common::seed_user(&pool, "plain@example.com").await;
    let app = common::build_test_app(pool, tmp.path());

    let response = get_auth(
        app,
        "/api/admin/prompt-test-images/whatever.png",
        &user_token(user),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}
