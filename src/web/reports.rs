//! Report submission and management endpoints

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::reports::{self, Category, Status, Urgency};
use crate::pagination::{page_number, paginate};
use crate::tenant::{all_tenants, for_tenant};
use crate::user::{load_authors, Author};
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_reports)
        .service(submit_report)
        .service(update_report_status)
        .service(delete_report);
}

#[derive(Deserialize)]
pub struct ReportListQuery {
    pub partner_slug: Option<String>,
    pub status: Option<String>,
    pub urgency: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Deserialize, Validate)]
pub struct ReportForm {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(
        min = 1,
        max = 255,
        message = "The title must be between 1 and 255 characters."
    ))]
    pub title: String,
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "The description field is required."))]
    pub description: String,
    pub category: Category,
    pub urgency: Urgency,
}

#[derive(Deserialize)]
pub struct ReportStatusForm {
    pub status: Status,
}

#[derive(Serialize)]
pub(crate) struct ReportView {
    #[serde(flatten)]
    pub report: reports::Model,
    pub reporter: Option<Author>,
}

pub(crate) async fn report_views<C: ConnectionTrait>(
    db: &C,
    items: Vec<reports::Model>,
    base_url: &str,
) -> Result<Vec<ReportView>, DbErr> {
    let authors = load_authors(db, items.iter().map(|r| r.user_id), base_url).await?;
    Ok(items
        .into_iter()
        .map(|report| ReportView {
            reporter: authors.get(&report.user_id).cloned(),
            report,
        })
        .collect())
}

async fn find_report<C: ConnectionTrait>(db: &C, id: i32) -> Result<reports::Model, ApiError> {
    all_tenants::<reports::Entity>()
        .filter(reports::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Report"))
}

#[get("/api/reports")]
pub async fn list_reports(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<ReportListQuery>,
) -> Result<HttpResponse, ApiError> {
    client.require_login()?;
    let scope = super::listing_scope(db.get_ref(), &client, &query.partner_slug).await?;

    let mut select = for_tenant::<reports::Entity>(scope);
    if let Some(status) = super::parse_filter::<Status>("status", &query.status)? {
        select = select.filter(reports::Column::Status.eq(status));
    }
    if let Some(urgency) = super::parse_filter::<Urgency>("urgency", &query.urgency)? {
        select = select.filter(reports::Column::Urgency.eq(urgency));
    }
    if let Some(category) = super::parse_filter::<Category>("category", &query.category)? {
        select = select.filter(reports::Column::Category.eq(category));
    }
    if let Some(term) = super::search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(reports::Column::Title.like(&term))
                .add(reports::Column::Description.like(&term)),
        );
    }
    let select = select.order_by_desc(reports::Column::Id);

    let mut page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.reports_per_page,
    )
    .await?;

    let rows = std::mem::take(&mut page.data);
    let views = report_views(db.get_ref(), rows, &config.site.base_url).await?;
    Ok(HttpResponse::Ok().json(page.with_data(views)))
}

#[post("/api/reports")]
pub async fn submit_report(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<ReportForm>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    form.validate()?;

    let now = Utc::now().naive_utc();
    let report = reports::ActiveModel {
        partner_id: Set(user.partner_id),
        user_id: Set(user.id),
        title: Set(form.title.trim().to_owned()),
        description: Set(form.description.clone()),
        category: Set(form.category),
        urgency: Set(form.urgency),
        status: Set(Status::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!("Report {} submitted by user {}", report.id, user.id);
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Report submitted successfully",
        "report": report,
    })))
}

#[put("/api/reports/{id}")]
pub async fn update_report_status(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<ReportStatusForm>,
) -> Result<HttpResponse, ApiError> {
    client.require_login()?;
    let report = find_report(db.get_ref(), path.into_inner()).await?;
    if !client.can_moderate(report.partner_id) {
        return Err(ApiError::forbidden());
    }

    let mut active: reports::ActiveModel = report.into();
    active.status = Set(form.status);
    active.updated_at = Set(Utc::now().naive_utc());
    let report = active.update(db.get_ref()).await?;

    log::info!("Report {} set to {:?}", report.id, report.status);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Report status updated successfully",
        "report": report,
    })))
}

#[delete("/api/reports/{id}")]
pub async fn delete_report(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let report = find_report(db.get_ref(), path.into_inner()).await?;
    if report.user_id != user.id && !client.can_moderate(report.partner_id) {
        return Err(ApiError::forbidden());
    }

    reports::Entity::delete_many()
        .filter(reports::Column::Id.eq(report.id))
        .exec(db.get_ref())
        .await?;

    Ok(super::message("Report deleted successfully"))
}
