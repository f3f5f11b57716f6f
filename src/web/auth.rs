//! Registration, login and bearer token lifecycle.

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::users::{self, Role, Status};
use crate::partner::PartnerView;
use crate::user::UserView;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(register)
        .service(login)
        .service(logout)
        .service(current_user);
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "The password must be at least 8 characters."))]
    pub password: String,
    pub partner_slug: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    user: UserView,
    token: String,
}

#[derive(Serialize)]
struct CurrentUser {
    #[serde(flatten)]
    user: UserView,
    partner: Option<PartnerView>,
}

#[post("/api/register")]
pub async fn register(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    form: web::Json<RegisterForm>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner();
    form.validate()?;

    let email = form.email.trim().to_lowercase();
    if crate::user::find_by_email(db.get_ref(), &email).await?.is_some() {
        return Err(ApiError::invalid(
            "email",
            "The email has already been taken.",
        ));
    }

    let slug = form
        .partner_slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let partner_id = match slug {
        Some(slug) => match crate::partner::find_by_slug(db.get_ref(), slug).await? {
            Some(partner) if partner.status.is_public() => Some(partner.id),
            _ => {
                return Err(ApiError::invalid(
                    "partner_slug",
                    "The selected partner is invalid.",
                ))
            }
        },
        None => None,
    };

    let password = crate::session::hash_password(&form.password).map_err(|e| {
        log::error!("register: password hashing failed: {}", e);
        ApiError::Unprocessable("Unable to register with that password.".to_string())
    })?;

    let now = Utc::now().naive_utc();
    let txn = db.begin().await?;
    let user = users::ActiveModel {
        name: Set(form.name.trim().to_owned()),
        email: Set(email),
        password: Set(password),
        role: Set(Role::GeneralUser),
        status: Set(Status::Active),
        partner_id: Set(partner_id),
        profile_picture: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let token = crate::session::issue_token(&txn, user.id).await?;
    txn.commit().await?;

    log::info!("User {} registered", user.id);
    Ok(HttpResponse::Created().json(AuthResponse {
        user: UserView::new(&user, &config.site.base_url),
        token,
    }))
}

#[post("/api/login")]
pub async fn login(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    form.validate()?;

    let user = match crate::user::find_by_email(db.get_ref(), &form.email).await? {
        Some(user) if crate::session::verify_password(&form.password, &user.password) => user,
        _ => {
            return Err(ApiError::invalid(
                "email",
                "These credentials do not match our records.",
            ))
        }
    };

    match user.status {
        Status::Active => {}
        Status::Suspended => {
            return Err(ApiError::Forbidden(
                "Your account has been suspended.".to_string(),
            ))
        }
        Status::Banned => {
            return Err(ApiError::Forbidden(
                "Your account has been banned.".to_string(),
            ))
        }
    }

    let token = crate::session::issue_token(db.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        user: UserView::new(&user, &config.site.base_url),
        token,
    }))
}

#[post("/api/logout")]
pub async fn logout(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    client.require_login()?;
    if let Some(token) = client.get_token() {
        crate::session::revoke_token(db.get_ref(), token).await?;
    }
    Ok(super::message("Logged out successfully"))
}

#[get("/api/user")]
pub async fn current_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;

    let partner = match user.partner_id {
        Some(partner_id) => crate::orm::partners::Entity::find_by_id(partner_id)
            .one(db.get_ref())
            .await?
            .map(|p| PartnerView::new(p, &config.site.base_url)),
        None => None,
    };

    Ok(HttpResponse::Ok().json(CurrentUser {
        user: UserView::new(user, &config.site.base_url),
        partner,
    }))
}
