//! Tenant isolation of list endpoints

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, database::*, fixtures::*};
use partnerhub::orm::{forum_topics, partners};
use partnerhub::tenant::{all_tenants, for_tenant, TenantScope};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::Value;

#[actix_rt::test]
async fn test_topic_lists_follow_the_callers_partner() {
    let ctx = setup_test_context().await;
    let acme = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    let other = create_partner(ctx.conn(), "Other", "other", partners::Status::Active)
        .await
        .unwrap();
    let acme_member = create_general_user(ctx.conn(), "acme member", Some(acme.id))
        .await
        .unwrap();
    let other_member = create_general_user(ctx.conn(), "other member", Some(other.id))
        .await
        .unwrap();
    let loner = create_general_user(ctx.conn(), "loner", None).await.unwrap();

    create_topic(ctx.conn(), &acme_member.model, "Acme topic")
        .await
        .unwrap();
    create_topic(ctx.conn(), &other_member.model, "Other topic")
        .await
        .unwrap();
    create_topic(ctx.conn(), &loner.model, "Global topic")
        .await
        .unwrap();
    let app = init_app!(ctx);

    let cases = [
        (Some(&acme_member.token), "Acme topic"),
        (Some(&other_member.token), "Other topic"),
        (Some(&loner.token), "Global topic"),
        (None, "Global topic"),
    ];
    for (token, expected) in cases {
        let mut req = test::TestRequest::get().uri("/api/forum-topics");
        if let Some(token) = token {
            req = req.insert_header(bearer(token));
        }
        let body: Value =
            test::read_body_json(test::call_service(&app, req.to_request()).await).await;
        assert_eq!(body["total"], 1, "caller expecting {}", expected);
        assert_eq!(body["data"][0]["title"], expected);
    }
}

#[actix_rt::test]
async fn test_partner_slug_selects_a_public_partner_scope() {
    let ctx = setup_test_context().await;
    let acme = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    create_partner(ctx.conn(), "Hidden", "hidden", partners::Status::Inactive)
        .await
        .unwrap();
    let acme_member = create_general_user(ctx.conn(), "acme member", Some(acme.id))
        .await
        .unwrap();
    let visitor = create_general_user(ctx.conn(), "visitor", None).await.unwrap();
    create_topic(ctx.conn(), &acme_member.model, "Acme topic")
        .await
        .unwrap();
    create_news(ctx.conn(), &acme_member.model, Some(acme.id), "Acme news")
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/forum-topics?partner_slug=acme")
        .insert_header(bearer(&visitor.token))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Acme topic");

    let req = test::TestRequest::get()
        .uri("/api/news?partner_slug=acme")
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["total"], 1);

    let req = test::TestRequest::get()
        .uri("/api/news?partner_slug=hidden")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_scoped_and_unscoped_queries() {
    let db = setup_test_database().await.unwrap();
    let acme = create_partner(&db, "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    let member = create_general_user(&db, "member", Some(acme.id)).await.unwrap();
    let loner = create_general_user(&db, "loner", None).await.unwrap();
    create_topic(&db, &member.model, "Scoped").await.unwrap();
    create_topic(&db, &loner.model, "Global").await.unwrap();

    let scoped = for_tenant::<forum_topics::Entity>(TenantScope::Partner(acme.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(scoped, 1);
    let global = for_tenant::<forum_topics::Entity>(TenantScope::Global)
        .count(&db)
        .await
        .unwrap();
    assert_eq!(global, 1);
    let everything = all_tenants::<forum_topics::Entity>()
        .count(&db)
        .await
        .unwrap();
    assert_eq!(everything, 2);
    assert_eq!(
        forum_topics::Entity::find().count(&db).await.unwrap(),
        everything
    );
}
