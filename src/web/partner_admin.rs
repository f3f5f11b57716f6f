//! Partner admin area: branding settings and member moderation.

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::{partners, users};
use crate::pagination::{page_number, paginate};
use crate::partner::PartnerView;
use crate::storage::StorageBackend;
use crate::tenant::{for_tenant, TenantScope};
use crate::upload::{self, FileField};
use crate::user::{self as accounts, StatusAction, UserView};
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_settings)
        .service(update_settings)
        .service(list_users)
        .service(moderate_user);
}

#[derive(Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub page: Option<usize>,
}

async fn own_partner<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
) -> Result<partners::Model, ApiError> {
    partners::Entity::find_by_id(partner_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner"))
}

fn is_web_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}

#[get("/api/partner-admin/settings")]
pub async fn view_settings(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let (_, partner_id) = client.require_partner_admin()?;
    let partner = own_partner(db.get_ref(), partner_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "partner": PartnerView::new(partner, &config.site.base_url),
    })))
}

/// Multipart body: `name`, `description`, `website`, `logo`, `banner`.
#[post("/api/partner-admin/settings")]
pub async fn update_settings(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let (user, partner_id) = client.require_partner_admin()?;
    let partner = own_partner(db.get_ref(), partner_id).await?;

    let form = upload::read_form(
        payload,
        &[
            FileField {
                name: "logo",
                max_kb: config.limits.logo_max_kb,
            },
            FileField {
                name: "banner",
                max_kb: config.limits.banner_max_kb,
            },
        ],
    )
    .await?;

    let name = form
        .text("name")
        .ok_or_else(|| ApiError::invalid("name", "The name field is required."))?;
    if name.chars().count() > 255 {
        return Err(ApiError::invalid(
            "name",
            "The name may not be greater than 255 characters.",
        ));
    }
    let website = form.text("website");
    if let Some(website) = website {
        if website.len() > 255 || !is_web_url(website) {
            return Err(ApiError::invalid(
                "website",
                "The website must be a valid URL.",
            ));
        }
    }

    // Store new images before touching the row; replaced files are removed
    // once the row points at the new ones.
    let logo = match form.file("logo") {
        Some(file) => Some(upload::store_image(storage.get_ref(), "logos", "logo", file).await?),
        None => None,
    };
    let banner = match form.file("banner") {
        Some(file) => {
            Some(upload::store_image(storage.get_ref(), "banners", "banner", file).await?)
        }
        None => None,
    };

    let old_logo = partner.logo.clone();
    let old_banner = partner.banner.clone();

    let mut active: partners::ActiveModel = partner.into();
    active.name = Set(name.to_owned());
    active.description = Set(form.text("description").map(str::to_owned));
    active.website = Set(website.map(str::to_owned));
    if logo.is_some() {
        active.logo = Set(logo.clone());
    }
    if banner.is_some() {
        active.banner = Set(banner.clone());
    }
    active.updated_at = Set(Utc::now().naive_utc());
    let partner = active.update(db.get_ref()).await?;

    if logo.is_some() {
        upload::discard_stored(storage.get_ref(), old_logo.as_deref()).await;
    }
    if banner.is_some() {
        upload::discard_stored(storage.get_ref(), old_banner.as_deref()).await;
    }

    log::info!("Partner {} settings updated by user {}", partner.id, user.id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Settings updated successfully",
        "partner": PartnerView::new(partner, &config.site.base_url),
    })))
}

#[get("/api/partner-admin/users")]
pub async fn list_users(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (_, partner_id) = client.require_partner_admin()?;

    let mut select = for_tenant::<users::Entity>(TenantScope::Partner(partner_id));
    if let Some(term) = super::search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(users::Column::Name.like(&term))
                .add(users::Column::Email.like(&term)),
        );
    }
    if let Some(role) = super::parse_filter::<users::Role>("role", &query.role)? {
        select = select.filter(users::Column::Role.eq(role));
    }
    let select = select.order_by_desc(users::Column::Id);

    let page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.users_per_page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(page.map(|u| UserView::new(&u, &config.site.base_url))))
}

#[post("/api/partner-admin/users/{id}/{action}")]
pub async fn moderate_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, String)>,
) -> Result<HttpResponse, ApiError> {
    let (admin, partner_id) = client.require_partner_admin()?;
    let (user_id, action) = path.into_inner();
    let action = StatusAction::parse(&action).ok_or_else(|| ApiError::not_found("Action"))?;

    let target = for_tenant::<users::Entity>(TenantScope::Partner(partner_id))
        .filter(users::Column::Id.eq(user_id))
        .one(db.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if target.id == admin.id {
        return Err(ApiError::Unprocessable(
            "You cannot change your own status.".to_string(),
        ));
    }
    if target.role != users::Role::GeneralUser {
        return Err(ApiError::forbidden());
    }

    accounts::set_status(db.get_ref(), target, action).await?;
    Ok(super::message(action.message()))
}
