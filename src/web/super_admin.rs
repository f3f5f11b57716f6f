//! Super admin area: every user and every partner, across tenants.

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::{
    comment_likes, forum_comments, forum_topics, news, news_likes, partner_ratings, partners,
    reports, subscriptions, users,
};
use crate::pagination::{page_number, paginate};
use crate::partner::{self, PartnerView};
use crate::storage::StorageBackend;
use crate::tenant::{all_tenants, for_tenant, TenantScope};
use crate::user::{self as accounts, StatusAction, UserView};
use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection, DbErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_users)
        .service(moderate_user)
        .service(list_partners)
        .service(update_subscription)
        .service(moderate_partner)
        .service(delete_partner);
}

#[derive(Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub page: Option<usize>,
}

#[derive(Deserialize)]
pub struct PartnerListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
}

#[derive(Deserialize)]
pub struct SubscriptionForm {
    pub status: subscriptions::Status,
}

#[derive(Serialize)]
struct PartnerSummary {
    id: i32,
    name: String,
    slug: String,
}

#[derive(Serialize)]
struct AdminUserView {
    #[serde(flatten)]
    user: UserView,
    partner: Option<PartnerSummary>,
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<users::Model, ApiError> {
    all_tenants::<users::Entity>()
        .filter(users::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

async fn find_partner<C: ConnectionTrait>(db: &C, id: i32) -> Result<partners::Model, ApiError> {
    partners::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner"))
}

#[get("/api/super-admin/users")]
pub async fn list_users(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, ApiError> {
    client.require_super_admin()?;

    let mut select = all_tenants::<users::Entity>();
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

    let mut page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.users_per_page,
    )
    .await?;

    let rows = std::mem::take(&mut page.data);
    let partner_ids: Vec<i32> = rows.iter().filter_map(|u| u.partner_id).collect();
    let partners: HashMap<i32, partners::Model> = if partner_ids.is_empty() {
        HashMap::new()
    } else {
        partners::Entity::find()
            .filter(partners::Column::Id.is_in(partner_ids))
            .all(db.get_ref())
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let views = rows
        .iter()
        .map(|u| AdminUserView {
            user: UserView::new(u, &config.site.base_url),
            partner: u
                .partner_id
                .and_then(|id| partners.get(&id))
                .map(|p| PartnerSummary {
                    id: p.id,
                    name: p.name.clone(),
                    slug: p.slug.clone(),
                }),
        })
        .collect();
    Ok(HttpResponse::Ok().json(page.with_data(views)))
}

#[post("/api/super-admin/users/{id}/{action}")]
pub async fn moderate_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, String)>,
) -> Result<HttpResponse, ApiError> {
    let admin = client.require_super_admin()?;
    let (user_id, action) = path.into_inner();
    let target = find_user(db.get_ref(), user_id).await?;

    if action == "promote" {
        let promotion = accounts::next_promotion(target.role, target.partner_id).ok_or_else(
            || ApiError::Unprocessable("User is already a Super Admin".to_string()),
        )?;
        let promoted = accounts::apply_promotion(db.get_ref(), target, promotion).await?;
        log::info!(
            "User {} promoted to {} by user {}",
            promoted.id,
            promoted.role.as_str(),
            admin.id
        );
        return Ok(super::message(promotion.message()));
    }

    let action = StatusAction::parse(&action).ok_or_else(|| ApiError::not_found("Action"))?;
    if target.id == admin.id {
        return Err(ApiError::Unprocessable(
            "You cannot change your own status.".to_string(),
        ));
    }
    accounts::set_status(db.get_ref(), target, action).await?;
    Ok(super::message(action.message()))
}

#[get("/api/super-admin/partners")]
pub async fn list_partners(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<PartnerListQuery>,
) -> Result<HttpResponse, ApiError> {
    client.require_super_admin()?;

    let mut select = partners::Entity::find();
    if let Some(status) = super::parse_filter::<partners::Status>("status", &query.status)? {
        select = select.filter(partners::Column::Status.eq(status));
    }
    if let Some(term) = super::search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(partners::Column::Name.like(&term))
                .add(partners::Column::Slug.like(&term)),
        );
    }
    let select = select.order_by_desc(partners::Column::Id);

    let mut page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.partners_per_page,
    )
    .await?;

    let rows = std::mem::take(&mut page.data);
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let subscription = partner::latest_subscription(db.get_ref(), row.id).await?;
        views.push(PartnerView::new(row, &config.site.base_url).with_subscription(subscription));
    }
    Ok(HttpResponse::Ok().json(page.with_data(views)))
}

/// Approving activates the partner and makes its applicant the partner's
/// admin.
async fn approve<C: ConnectionTrait>(db: &C, partner: partners::Model) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();
    let applicant = partner.user_id;
    let partner_id = partner.id;

    let mut active: partners::ActiveModel = partner.into();
    active.status = Set(partners::Status::Active);
    active.updated_at = Set(now);
    active.update(db).await?;

    if let Some(user_id) = applicant {
        if let Some(user) = users::Entity::find_by_id(user_id).one(db).await? {
            // A super admin who applied keeps their global role.
            if !user.is_super_admin() {
                let mut active: users::ActiveModel = user.into();
                active.role = Set(users::Role::PartnerAdmin);
                active.partner_id = Set(Some(partner_id));
                active.updated_at = Set(now);
                active.update(db).await?;
            }
        }
    }

    partner::set_subscription_status(db, partner_id, subscriptions::Status::Active).await?;
    Ok(())
}

async fn set_partner_status<C: ConnectionTrait>(
    db: &C,
    partner: partners::Model,
    status: partners::Status,
) -> Result<partners::Model, DbErr> {
    let mut active: partners::ActiveModel = partner.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await
}

/// Removes a partner and everything it owns. Members stay as global users.
async fn purge_partner<C: ConnectionTrait>(db: &C, partner_id: i32) -> Result<(), DbErr> {
    let scope = TenantScope::Partner(partner_id);

    let topic_ids: Vec<i32> = for_tenant::<forum_topics::Entity>(scope)
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    for topic_id in topic_ids {
        super::forum::delete_topic_tree(db, topic_id).await?;
    }

    let news_ids: Vec<i32> = for_tenant::<news::Entity>(scope)
        .all(db)
        .await?
        .into_iter()
        .map(|n| n.id)
        .collect();
    if !news_ids.is_empty() {
        news_likes::Entity::delete_many()
            .filter(news_likes::Column::NewsId.is_in(news_ids))
            .exec(db)
            .await?;
    }
    news::Entity::delete_many()
        .filter(news::Column::PartnerId.eq(partner_id))
        .exec(db)
        .await?;

    // Stray comments carrying the partner id on topics elsewhere.
    let stray: Vec<i32> = for_tenant::<forum_comments::Entity>(scope)
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    if !stray.is_empty() {
        comment_likes::Entity::delete_many()
            .filter(comment_likes::Column::CommentId.is_in(stray.clone()))
            .exec(db)
            .await?;
        forum_comments::Entity::delete_many()
            .filter(forum_comments::Column::Id.is_in(stray))
            .exec(db)
            .await?;
    }

    reports::Entity::delete_many()
        .filter(reports::Column::PartnerId.eq(partner_id))
        .exec(db)
        .await?;
    partner_ratings::Entity::delete_many()
        .filter(partner_ratings::Column::PartnerId.eq(partner_id))
        .exec(db)
        .await?;
    subscriptions::Entity::delete_many()
        .filter(subscriptions::Column::PartnerId.eq(partner_id))
        .exec(db)
        .await?;

    users::Entity::update_many()
        .col_expr(users::Column::Role, Expr::value(users::Role::GeneralUser.as_str()))
        .filter(users::Column::PartnerId.eq(partner_id))
        .filter(users::Column::Role.eq(users::Role::PartnerAdmin))
        .exec(db)
        .await?;
    users::Entity::update_many()
        .col_expr(users::Column::PartnerId, Expr::value(Option::<i32>::None))
        .filter(users::Column::PartnerId.eq(partner_id))
        .exec(db)
        .await?;

    partners::Entity::delete_many()
        .filter(partners::Column::Id.eq(partner_id))
        .exec(db)
        .await?;
    Ok(())
}

#[post("/api/super-admin/partners/{id}/subscription")]
pub async fn update_subscription(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<SubscriptionForm>,
) -> Result<HttpResponse, ApiError> {
    let admin = client.require_super_admin()?;
    let target = find_partner(db.get_ref(), path.into_inner()).await?;

    let subscription =
        partner::set_subscription_status(db.get_ref(), target.id, form.status).await?;
    log::info!(
        "Partner {} subscription set to {:?} by user {}",
        target.id,
        subscription.status,
        admin.id
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Subscription updated successfully",
        "subscription": subscription,
    })))
}

#[post("/api/super-admin/partners/{id}/{action}")]
pub async fn moderate_partner(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, String)>,
) -> Result<HttpResponse, ApiError> {
    let admin = client.require_super_admin()?;
    let (partner_id, action) = path.into_inner();
    let target = find_partner(db.get_ref(), partner_id).await?;

    let message = match action.as_str() {
        "approve" => {
            if target.status != partners::Status::Pending {
                return Err(ApiError::Unprocessable(
                    "Only pending partners can be approved.".to_string(),
                ));
            }
            let txn = db.begin().await?;
            approve(&txn, target).await?;
            txn.commit().await?;
            "Partner approved successfully"
        }
        "reject" => {
            if target.status != partners::Status::Pending {
                return Err(ApiError::Unprocessable(
                    "Only pending partners can be rejected.".to_string(),
                ));
            }
            let txn = db.begin().await?;
            purge_partner(&txn, target.id).await?;
            txn.commit().await?;
            "Partner application rejected"
        }
        "suspend" => {
            set_partner_status(db.get_ref(), target, partners::Status::Inactive).await?;
            "Partner suspended successfully"
        }
        "activate" => {
            set_partner_status(db.get_ref(), target, partners::Status::Active).await?;
            "Partner activated successfully"
        }
        _ => return Err(ApiError::not_found("Action")),
    };

    log::info!("Partner {} {} by user {}", partner_id, action, admin.id);
    Ok(super::message(message))
}

#[delete("/api/super-admin/partners/{id}")]
pub async fn delete_partner(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let admin = client.require_super_admin()?;
    let target = find_partner(db.get_ref(), path.into_inner()).await?;

    let images: Vec<Option<String>> = for_tenant::<news::Entity>(TenantScope::Partner(target.id))
        .all(db.get_ref())
        .await?
        .into_iter()
        .map(|n| n.image)
        .collect();

    let txn = db.begin().await?;
    purge_partner(&txn, target.id).await?;
    txn.commit().await?;

    for stored in images
        .iter()
        .chain([&target.logo, &target.banner])
    {
        crate::upload::discard_stored(storage.get_ref(), stored.as_deref()).await;
    }

    log::info!("Partner {} deleted by user {}", target.id, admin.id);
    Ok(super::message("Partner deleted successfully"))
}
