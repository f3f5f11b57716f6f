//! Registration, login and bearer token tests

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, database::*, fixtures::*};
use partnerhub::orm::{api_tokens, partners, users};
use sea_orm::{entity::*, ActiveValue::Set, EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

#[actix_rt::test]
async fn test_register_returns_user_and_token() {
    let ctx = setup_test_context().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Ada Lovelace",
            "email": "Ada@Example.com",
            "password": "correct horse",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "general_user");
    assert_eq!(body["user"]["status"], "active");
    assert!(body["user"].get("password").is_none());

    let token = body["token"].as_str().expect("token is a string");
    let user_id = body["user"]["id"].as_i64().unwrap();
    assert!(token.starts_with(&format!("{}|", user_id)));

    // The token authenticates.
    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Ada Lovelace");
    assert!(body["partner"].is_null());
}

#[actix_rt::test]
async fn test_register_rejects_duplicate_email_and_short_password() {
    let ctx = setup_test_context().await;
    create_general_user(ctx.conn(), "taken", None).await.unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Someone",
            "email": "TAKEN@test.com",
            "password": "password123",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Someone",
            "email": "someone@test.com",
            "password": "short",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["password"].is_array());
}

#[actix_rt::test]
async fn test_register_with_partner_slug() {
    let ctx = setup_test_context().await;
    let partner = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    create_partner(ctx.conn(), "Closed", "closed", partners::Status::Inactive)
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Member",
            "email": "member@acme.test",
            "password": "password123",
            "partner_slug": "acme",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["partner_id"], partner.id);

    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(json!({
            "name": "Late",
            "email": "late@closed.test",
            "password": "password123",
            "partner_slug": "closed",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn test_login_with_valid_and_invalid_credentials() {
    let ctx = setup_test_context().await;
    create_general_user(ctx.conn(), "grace", None).await.unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "grace@test.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["token"].as_str().is_some());

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "grace@test.com", "password": "wrong password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["errors"]["email"][0],
        "These credentials do not match our records."
    );
}

#[actix_rt::test]
async fn test_login_refused_for_banned_and_suspended_accounts() {
    let ctx = setup_test_context().await;
    let banned = create_general_user(ctx.conn(), "banned", None).await.unwrap();
    let suspended = create_general_user(ctx.conn(), "suspended", None).await.unwrap();

    for (user, status) in [
        (&banned, users::Status::Banned),
        (&suspended, users::Status::Suspended),
    ] {
        let mut active: users::ActiveModel = user.model.clone().into();
        active.status = Set(status);
        active.update(ctx.conn()).await.unwrap();
    }
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "banned@test.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Your account has been banned.");

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": "suspended@test.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Your account has been suspended.");

    // Tokens issued before the ban no longer authenticate.
    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&banned.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_logout_revokes_the_presented_token() {
    let ctx = setup_test_context().await;
    let user = create_general_user(ctx.conn(), "leaver", None).await.unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/logout")
        .insert_header(bearer(&user.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Logged out successfully");

    let remaining = api_tokens::Entity::find().count(ctx.conn()).await.unwrap();
    assert_eq!(remaining, 0);

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&user.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_guest_requests_are_unauthenticated() {
    let ctx = setup_test_context().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/user").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Unauthenticated.");

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer("1|not-a-real-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
