//! Partner directory, applications, public sites and ratings.

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::{forum_topics, news, partner_ratings, partners, reports, subscriptions};
use crate::pagination::{page_number, paginate};
use crate::partner::{self, PartnerView};
use crate::tenant::{for_tenant, TenantScope};
use crate::user::{load_authors, Author};
use actix_web::{get, post, web, HttpResponse};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_partners)
        .service(apply)
        .service(view_partner_site)
        .service(rate_partner)
        .service(list_ratings);
}

#[derive(Deserialize)]
pub struct PartnerListQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

#[derive(Deserialize, Validate)]
pub struct ApplicationForm {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(url(message = "The website must be a valid URL."))]
    pub website: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct RatingForm {
    #[validate(range(min = 1, max = 5, message = "The rating must be between 1 and 5."))]
    pub rating: i32,
    #[validate(length(
        max = 1000,
        message = "The comment may not be greater than 1000 characters."
    ))]
    pub comment: Option<String>,
}

#[derive(Serialize)]
struct RatingView {
    id: i32,
    user_id: i32,
    partner_id: i32,
    rating: i32,
    comment: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    user: Option<Author>,
}

#[get("/api/partners")]
pub async fn list_partners(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<PartnerListQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut select = partners::Entity::find().filter(
        partners::Column::Status.is_in([partners::Status::Active, partners::Status::Approved]),
    );
    if let Some(term) = super::search_term(&query.search) {
        select = select.filter(partners::Column::Name.like(&term));
    }
    let select = select.order_by_asc(partners::Column::Name);

    let page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.partners_per_page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(page.map(|p| PartnerView::new(p, &config.site.base_url))))
}

#[post("/api/partners/apply")]
pub async fn apply(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    form: web::Json<ApplicationForm>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    form.validate()?;

    if user.partner_id.is_some() || user.is_super_admin() {
        return Err(ApiError::Unprocessable(
            "You cannot apply for a partner site.".to_string(),
        ));
    }

    let slug = match form.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug.to_owned(),
        None => partner::slugify(&form.name),
    };
    if !partner::is_valid_slug(&slug) {
        return Err(ApiError::invalid(
            "slug",
            "The slug may only contain lowercase letters, numbers, and dashes.",
        ));
    }
    if partner::find_by_slug(db.get_ref(), &slug).await?.is_some() {
        return Err(ApiError::invalid("slug", "The slug has already been taken."));
    }

    let now = Utc::now().naive_utc();
    let txn = db.begin().await?;
    let created = partners::ActiveModel {
        name: Set(form.name.trim().to_owned()),
        slug: Set(slug),
        domain: Set(None),
        logo: Set(None),
        banner: Set(None),
        website: Set(form.website.clone()),
        description: Set(form.description.clone()),
        status: Set(partners::Status::Pending),
        user_id: Set(Some(user.id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let subscription =
        partner::set_subscription_status(&txn, created.id, subscriptions::Status::Pending).await?;
    txn.commit().await?;

    log::info!("Partner {} ({}) applied for by user {}", created.id, created.slug, user.id);
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Partner application submitted successfully",
        "partner": PartnerView::new(created, &config.site.base_url)
            .with_subscription(Some(subscription)),
    })))
}

#[get("/api/partners/{slug}")]
pub async fn view_partner_site(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let site = super::public_partner(db.get_ref(), &path).await?;
    let scope = TenantScope::Partner(site.id);
    let base_url = &config.site.base_url;

    let latest_news = for_tenant::<news::Entity>(scope)
        .order_by_desc(news::Column::Id)
        .limit(3)
        .all(db.get_ref())
        .await?;
    let latest_topics = for_tenant::<forum_topics::Entity>(scope)
        .order_by_desc(forum_topics::Column::Id)
        .limit(5)
        .all(db.get_ref())
        .await?;
    let latest_reports = for_tenant::<reports::Entity>(scope)
        .order_by_desc(reports::Column::Id)
        .limit(5)
        .all(db.get_ref())
        .await?;

    let stats = partner::site_stats(db.get_ref(), site.id).await?;
    let user_rating = match client.get_id() {
        Some(user_id) => partner::find_rating(db.get_ref(), site.id, user_id).await?,
        None => None,
    };

    let news = super::news::news_views(db.get_ref(), latest_news, client.get_id(), base_url).await?;
    let topics = super::forum::topic_views(db.get_ref(), latest_topics, base_url).await?;
    let reports = super::reports::report_views(db.get_ref(), latest_reports, base_url).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "partner": PartnerView::new(site, base_url),
        "news": news,
        "topics": topics,
        "reports": reports,
        "stats": stats,
        "user_rating": user_rating,
    })))
}

#[post("/api/partners/{slug}/rate")]
pub async fn rate_partner(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    form: web::Json<RatingForm>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let site = super::public_partner(db.get_ref(), &path).await?;
    form.validate()?;

    let comment = form
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned);
    let rating = partner::rate(db.get_ref(), site.id, user.id, form.rating, comment).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Rating submitted successfully",
        "rating": rating,
    })))
}

#[get("/api/partners/{slug}/ratings")]
pub async fn list_ratings(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let site = partner::find_by_slug(db.get_ref(), &path)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner"))?;
    if !user.is_super_admin() && !user.administers(Some(site.id)) {
        return Err(ApiError::forbidden());
    }

    let select = partner_ratings::Entity::find()
        .filter(partner_ratings::Column::PartnerId.eq(site.id))
        .order_by_desc(partner_ratings::Column::Id);
    let mut page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.ratings_per_page,
    )
    .await?;

    let rows = std::mem::take(&mut page.data);
    let authors = load_authors(
        db.get_ref(),
        rows.iter().map(|r| r.user_id),
        &config.site.base_url,
    )
    .await?;
    let ratings = page.with_data(
        rows.into_iter()
            .map(|r| RatingView {
                user: authors.get(&r.user_id).cloned(),
                id: r.id,
                user_id: r.user_id,
                partner_id: r.partner_id,
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect(),
    );

    let stats = partner::rating_stats(db.get_ref(), site.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ratings": ratings,
        "stats": stats,
    })))
}
