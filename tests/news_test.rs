//! News publishing, likes and deletion tests

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, database::*, fixtures::*};
use partnerhub::orm::{news, news_likes, partners};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::Value;

fn news_request(
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> test::TestRequest {
    let (content_type, body) = multipart_body(fields, files);
    test::TestRequest::post()
        .uri("/api/news")
        .insert_header(bearer(token))
        .insert_header(("Content-Type", content_type))
        .set_payload(body)
}

#[actix_rt::test]
async fn test_partner_admin_publishes_for_own_partner_only() {
    let ctx = setup_test_context().await;
    let acme = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    let other = create_partner(ctx.conn(), "Other", "other", partners::Status::Active)
        .await
        .unwrap();
    let admin = create_partner_admin(ctx.conn(), "admin", acme.id)
        .await
        .unwrap();
    let member = create_general_user(ctx.conn(), "member", Some(acme.id))
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = news_request(
        &admin.token,
        &[("title", "Open day"), ("content", "Come visit us.")],
        &[("image", "poster.png", PNG_BYTES)],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "News created successfully");
    assert_eq!(body["news"]["partner_id"], acme.id);
    assert!(body["news"]["image"]
        .as_str()
        .unwrap()
        .starts_with("http://partners.test/storage/news/"));

    let other_id = other.id.to_string();
    let req = news_request(
        &admin.token,
        &[
            ("title", "Hostile takeover"),
            ("content", "Nope"),
            ("partner_id", other_id.as_str()),
        ],
        &[],
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = news_request(&member.token, &[("title", "Hi"), ("content", "Hello")], &[])
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_rt::test]
async fn test_super_admin_publishes_global_or_for_any_partner() {
    let ctx = setup_test_context().await;
    let acme = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    let root = create_super_admin(ctx.conn(), "root").await.unwrap();
    let app = init_app!(ctx);

    let req = news_request(&root.token, &[("title", "Global"), ("content", "Everyone")], &[])
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(body["news"]["partner_id"].is_null());

    let acme_id = acme.id.to_string();
    let req = news_request(
        &root.token,
        &[
            ("title", "For Acme"),
            ("content", "Acme only"),
            ("partner_id", acme_id.as_str()),
        ],
        &[],
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["news"]["partner_id"], acme.id);

    let req = news_request(
        &root.token,
        &[("title", "Ghost"), ("content", "x"), ("partner_id", "9999")],
        &[],
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = news_request(&root.token, &[("content", "No title")], &[]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["title"][0], "The title field is required.");
}

#[actix_rt::test]
async fn test_news_like_toggle() {
    let ctx = setup_test_context().await;
    let root = create_super_admin(ctx.conn(), "root").await.unwrap();
    let reader = create_general_user(ctx.conn(), "reader", None).await.unwrap();
    let item = create_news(ctx.conn(), &root.model, None, "Likeable")
        .await
        .unwrap();
    let app = init_app!(ctx);

    let like = || {
        test::TestRequest::post()
            .uri(&format!("/api/news/{}/like", item.id))
            .insert_header(bearer(&reader.token))
            .to_request()
    };

    let body: Value = test::read_body_json(test::call_service(&app, like()).await).await;
    assert_eq!(body["liked"], true);
    assert_eq!(body["likes_count"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/news/{}", item.id))
        .insert_header(bearer(&reader.token))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["liked"], true);
    assert_eq!(body["likes_count"], 1);
    assert_eq!(body["author"]["name"], "root");

    let body: Value = test::read_body_json(test::call_service(&app, like()).await).await;
    assert_eq!(body["liked"], false);
    assert_eq!(body["likes_count"], 0);
}

#[actix_rt::test]
async fn test_news_delete_requires_moderator_and_removes_likes() {
    let ctx = setup_test_context().await;
    let acme = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    let other = create_partner(ctx.conn(), "Other", "other", partners::Status::Active)
        .await
        .unwrap();
    let admin = create_partner_admin(ctx.conn(), "admin", acme.id)
        .await
        .unwrap();
    let other_admin = create_partner_admin(ctx.conn(), "other admin", other.id)
        .await
        .unwrap();
    let item = create_news(ctx.conn(), &admin.model, Some(acme.id), "Acme news")
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/news/{}/like", item.id))
        .insert_header(bearer(&other_admin.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/news/{}", item.id))
        .insert_header(bearer(&other_admin.token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/news/{}", item.id))
        .insert_header(bearer(&admin.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    assert_eq!(news::Entity::find().count(ctx.conn()).await.unwrap(), 0);
    assert_eq!(news_likes::Entity::find().count(ctx.conn()).await.unwrap(), 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/news/{}", item.id))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}
