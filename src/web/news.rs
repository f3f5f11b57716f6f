//! Partner and platform-wide news.

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::{news, news_likes, partners};
use crate::pagination::{page_number, paginate};
use crate::storage::{public_url, StorageBackend};
use crate::tenant::{all_tenants, for_tenant};
use crate::upload::{self, FileField};
use crate::user::{load_authors, Author};
use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, PaginatorTrait,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_news)
        .service(create_news)
        .service(view_news)
        .service(delete_news)
        .service(toggle_like);
}

#[derive(Deserialize)]
pub struct NewsListQuery {
    pub partner_slug: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewsView {
    pub id: i32,
    pub partner_id: Option<i32>,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub author: Option<Author>,
    pub likes_count: usize,
    pub liked: bool,
}

pub(crate) async fn news_views<C: ConnectionTrait>(
    db: &C,
    items: Vec<news::Model>,
    viewer: Option<i32>,
    base_url: &str,
) -> Result<Vec<NewsView>, DbErr> {
    let ids: Vec<i32> = items.iter().map(|n| n.id).collect();
    let mut counts: HashMap<i32, usize> = HashMap::new();
    let mut liked: HashSet<i32> = HashSet::new();
    if !ids.is_empty() {
        let likes = news_likes::Entity::find()
            .filter(news_likes::Column::NewsId.is_in(ids))
            .all(db)
            .await?;
        for like in likes {
            *counts.entry(like.news_id).or_insert(0) += 1;
            if Some(like.user_id) == viewer {
                liked.insert(like.news_id);
            }
        }
    }
    let authors = load_authors(db, items.iter().map(|n| n.user_id), base_url).await?;

    Ok(items
        .into_iter()
        .map(|n| NewsView {
            image: public_url(base_url, n.image.as_deref()),
            author: authors.get(&n.user_id).cloned(),
            likes_count: counts.get(&n.id).copied().unwrap_or(0),
            liked: liked.contains(&n.id),
            id: n.id,
            partner_id: n.partner_id,
            user_id: n.user_id,
            title: n.title,
            content: n.content,
            created_at: n.created_at,
            updated_at: n.updated_at,
        })
        .collect())
}

async fn find_news<C: ConnectionTrait>(db: &C, id: i32) -> Result<news::Model, ApiError> {
    all_tenants::<news::Entity>()
        .filter(news::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("News"))
}

#[get("/api/news")]
pub async fn list_news(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<NewsListQuery>,
) -> Result<HttpResponse, ApiError> {
    let scope = super::listing_scope(db.get_ref(), &client, &query.partner_slug).await?;

    let mut select = for_tenant::<news::Entity>(scope);
    if let Some(term) = super::search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(news::Column::Title.like(&term))
                .add(news::Column::Content.like(&term)),
        );
    }
    let select = select.order_by_desc(news::Column::Id);

    let mut page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.news_per_page,
    )
    .await?;

    let rows = std::mem::take(&mut page.data);
    let views = news_views(db.get_ref(), rows, client.get_id(), &config.site.base_url).await?;
    Ok(HttpResponse::Ok().json(page.with_data(views)))
}

#[get("/api/news/{id}")]
pub async fn view_news(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let item = find_news(db.get_ref(), path.into_inner()).await?;
    let view = news_views(
        db.get_ref(),
        vec![item],
        client.get_id(),
        &config.site.base_url,
    )
    .await?
    .pop();
    Ok(HttpResponse::Ok().json(view))
}

/// Multipart body: `title`, `content`, optional `partner_id` and `image`.
#[post("/api/news")]
pub async fn create_news(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    if !user.is_super_admin() && !user.is_partner_admin() {
        return Err(ApiError::forbidden());
    }

    let form = upload::read_form(
        payload,
        &[FileField {
            name: "image",
            max_kb: config.limits.news_image_max_kb,
        }],
    )
    .await?;

    let title = form
        .text("title")
        .ok_or_else(|| ApiError::invalid("title", "The title field is required."))?;
    if title.chars().count() > 255 {
        return Err(ApiError::invalid(
            "title",
            "The title may not be greater than 255 characters.",
        ));
    }
    let content = form
        .text("content")
        .ok_or_else(|| ApiError::invalid("content", "The content field is required."))?;

    let requested_partner = match form.text("partner_id") {
        Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
            ApiError::invalid("partner_id", "The selected partner id is invalid.")
        })?),
        None => None,
    };

    // Super admins publish anywhere; partner admins only for their partner.
    let partner_id = if user.is_super_admin() {
        if let Some(id) = requested_partner {
            partners::Entity::find_by_id(id)
                .one(db.get_ref())
                .await?
                .ok_or_else(|| {
                    ApiError::invalid("partner_id", "The selected partner id is invalid.")
                })?;
        }
        requested_partner
    } else {
        if requested_partner.is_some() && requested_partner != user.partner_id {
            return Err(ApiError::forbidden());
        }
        user.partner_id
    };

    let image = match form.file("image") {
        Some(file) => Some(upload::store_image(storage.get_ref(), "news", "image", file).await?),
        None => None,
    };

    let now = Utc::now().naive_utc();
    let item = news::ActiveModel {
        partner_id: Set(partner_id),
        user_id: Set(user.id),
        title: Set(title.to_owned()),
        content: Set(content.to_owned()),
        image: Set(image),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!("News {} published by user {}", item.id, user.id);
    let view = news_views(db.get_ref(), vec![item], Some(user.id), &config.site.base_url)
        .await?
        .pop();
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "News created successfully",
        "news": view,
    })))
}

#[delete("/api/news/{id}")]
pub async fn delete_news(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    client.require_login()?;
    let item = find_news(db.get_ref(), path.into_inner()).await?;
    if !client.can_moderate(item.partner_id) {
        return Err(ApiError::forbidden());
    }

    let txn = db.begin().await?;
    news_likes::Entity::delete_many()
        .filter(news_likes::Column::NewsId.eq(item.id))
        .exec(&txn)
        .await?;
    news::Entity::delete_many()
        .filter(news::Column::Id.eq(item.id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    upload::discard_stored(storage.get_ref(), item.image.as_deref()).await;

    log::info!("News {} deleted", item.id);
    Ok(super::message("News deleted successfully"))
}

#[post("/api/news/{id}/like")]
pub async fn toggle_like(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let item = find_news(db.get_ref(), path.into_inner()).await?;

    let existing = news_likes::Entity::find()
        .filter(news_likes::Column::NewsId.eq(item.id))
        .filter(news_likes::Column::UserId.eq(user.id))
        .one(db.get_ref())
        .await?;

    let liked = match existing {
        Some(like) => {
            news_likes::Entity::delete_many()
                .filter(news_likes::Column::Id.eq(like.id))
                .exec(db.get_ref())
                .await?;
            false
        }
        None => {
            news_likes::ActiveModel {
                news_id: Set(item.id),
                user_id: Set(user.id),
                created_at: Set(Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(db.get_ref())
            .await?;
            true
        }
    };

    let likes_count = news_likes::Entity::find()
        .filter(news_likes::Column::NewsId.eq(item.id))
        .count(db.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": if liked { "Liked" } else { "Unliked" },
        "liked": liked,
        "likes_count": likes_count,
    })))
}
