//! Report submission, listing and moderation tests

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, database::*, fixtures::*};
use partnerhub::orm::{partners, reports};
use sea_orm::EntityTrait;
use serde_json::{json, Value};

#[actix_rt::test]
async fn test_submit_report() {
    let ctx = setup_test_context().await;
    let partner = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    let member = create_general_user(ctx.conn(), "member", Some(partner.id))
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/reports")
        .insert_header(bearer(&member.token))
        .set_json(json!({
            "title": "Broken window",
            "description": "Room 12 window is cracked.",
            "category": "Infrastructure",
            "urgency": "High",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Report submitted successfully");
    assert_eq!(body["report"]["status"], "pending");
    assert_eq!(body["report"]["partner_id"], partner.id);

    let req = test::TestRequest::post()
        .uri("/api/reports")
        .insert_header(bearer(&member.token))
        .set_json(json!({
            "title": "Unknown",
            "description": "Bad category",
            "category": "Gossip",
            "urgency": "High",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn test_report_list_requires_login_and_filters() {
    let ctx = setup_test_context().await;
    let user = create_general_user(ctx.conn(), "user", None).await.unwrap();
    create_report(ctx.conn(), &user.model, "Leaking roof", reports::Urgency::Critical)
        .await
        .unwrap();
    create_report(ctx.conn(), &user.model, "Squeaky door", reports::Urgency::Low)
        .await
        .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/reports").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/reports")
        .insert_header(bearer(&user.token))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["reporter"]["name"], "user");

    let req = test::TestRequest::get()
        .uri("/api/reports?urgency=Critical")
        .insert_header(bearer(&user.token))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Leaking roof");

    let req = test::TestRequest::get()
        .uri("/api/reports?status=all&search=door")
        .insert_header(bearer(&user.token))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["total"], 1);

    let req = test::TestRequest::get()
        .uri("/api/reports?status=resolved")
        .insert_header(bearer(&user.token))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["total"], 0);
}

#[actix_rt::test]
async fn test_report_status_update_requires_moderator() {
    let ctx = setup_test_context().await;
    let acme = create_partner(ctx.conn(), "Acme", "acme", partners::Status::Active)
        .await
        .unwrap();
    let other = create_partner(ctx.conn(), "Other", "other", partners::Status::Active)
        .await
        .unwrap();
    let member = create_general_user(ctx.conn(), "member", Some(acme.id))
        .await
        .unwrap();
    let acme_admin = create_partner_admin(ctx.conn(), "acme admin", acme.id)
        .await
        .unwrap();
    let other_admin = create_partner_admin(ctx.conn(), "other admin", other.id)
        .await
        .unwrap();
    let report = create_report(ctx.conn(), &member.model, "Leak", reports::Urgency::Medium)
        .await
        .unwrap();
    let app = init_app!(ctx);

    let update = |token: &str| {
        test::TestRequest::put()
            .uri(&format!("/api/reports/{}", report.id))
            .insert_header(bearer(token))
            .set_json(json!({ "status": "in_progress" }))
            .to_request()
    };

    for token in [&member.token, &other_admin.token] {
        let resp = test::call_service(&app, update(token.as_str())).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    let resp = test::call_service(&app, update(acme_admin.token.as_str())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Report status updated successfully");
    assert_eq!(body["report"]["status"], "in_progress");
}

#[actix_rt::test]
async fn test_report_delete_by_owner_or_moderator() {
    let ctx = setup_test_context().await;
    let owner = create_general_user(ctx.conn(), "owner", None).await.unwrap();
    let stranger = create_general_user(ctx.conn(), "stranger", None).await.unwrap();
    let root = create_super_admin(ctx.conn(), "root").await.unwrap();
    let first = create_report(ctx.conn(), &owner.model, "First", reports::Urgency::Low)
        .await
        .unwrap();
    let second = create_report(ctx.conn(), &owner.model, "Second", reports::Urgency::Low)
        .await
        .unwrap();
    let app = init_app!(ctx);

    let delete = |id: i32, token: &str| {
        test::TestRequest::delete()
            .uri(&format!("/api/reports/{}", id))
            .insert_header(bearer(token))
            .to_request()
    };

    let resp = test::call_service(&app, delete(first.id, stranger.token.as_str())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, delete(first.id, owner.token.as_str())).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, delete(second.id, root.token.as_str())).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(reports::Entity::find()
        .all(ctx.conn())
        .await
        .unwrap()
        .is_empty());
}
