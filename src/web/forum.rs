//! Forum topics.

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::{comment_likes, forum_comments, forum_topics};
use crate::pagination::{page_number, paginate};
use crate::tenant::{all_tenants, for_tenant};
use crate::user::{load_authors, Author};
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection, DbErr,
    FromQueryResult, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_topics)
        .service(create_topic)
        .service(view_topic)
        .service(update_topic)
        .service(delete_topic);
}

#[derive(Deserialize)]
pub struct TopicListQuery {
    pub partner_slug: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Deserialize, Validate)]
pub struct TopicForm {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(
        min = 1,
        max = 255,
        message = "The title must be between 1 and 255 characters."
    ))]
    pub title: String,
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "The content field is required."))]
    pub content: String,
    #[validate(length(max = 100, message = "The category may not be greater than 100 characters."))]
    pub category: Option<String>,
}

/// Topic in lists and on partner sites.
#[derive(Serialize)]
pub(crate) struct TopicView {
    #[serde(flatten)]
    pub topic: forum_topics::Model,
    pub author: Option<Author>,
    pub comments_count: i64,
}

#[derive(FromQueryResult)]
struct CommentCountRow {
    topic_id: i32,
    count: i64,
}

async fn comment_counts<C: ConnectionTrait>(
    db: &C,
    topic_ids: Vec<i32>,
) -> Result<HashMap<i32, i64>, DbErr> {
    if topic_ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(forum_comments::Entity::find()
        .select_only()
        .column(forum_comments::Column::TopicId)
        .column_as(Expr::col(forum_comments::Column::Id).count(), "count")
        .filter(forum_comments::Column::TopicId.is_in(topic_ids))
        .group_by(forum_comments::Column::TopicId)
        .into_model::<CommentCountRow>()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.topic_id, row.count))
        .collect())
}

pub(crate) async fn topic_views<C: ConnectionTrait>(
    db: &C,
    topics: Vec<forum_topics::Model>,
    base_url: &str,
) -> Result<Vec<TopicView>, DbErr> {
    let authors = load_authors(db, topics.iter().map(|t| t.user_id), base_url).await?;
    let counts = comment_counts(db, topics.iter().map(|t| t.id).collect()).await?;

    Ok(topics
        .into_iter()
        .map(|topic| TopicView {
            author: authors.get(&topic.user_id).cloned(),
            comments_count: counts.get(&topic.id).copied().unwrap_or(0),
            topic,
        })
        .collect())
}

/// Topic by id, read across tenants.
pub(crate) async fn find_topic<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<forum_topics::Model, ApiError> {
    all_tenants::<forum_topics::Entity>()
        .filter(forum_topics::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Topic"))
}

#[get("/api/forum-topics")]
pub async fn list_topics(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<TopicListQuery>,
) -> Result<HttpResponse, ApiError> {
    let scope = super::listing_scope(db.get_ref(), &client, &query.partner_slug).await?;

    let mut select = for_tenant::<forum_topics::Entity>(scope);
    if let Some(term) = super::search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(forum_topics::Column::Title.like(&term))
                .add(forum_topics::Column::Content.like(&term)),
        );
    }
    let select = select.order_by_desc(forum_topics::Column::Id);

    let mut page = paginate(
        db.get_ref(),
        select,
        page_number(query.page),
        config.limits.topics_per_page,
    )
    .await?;

    let rows = std::mem::take(&mut page.data);
    let views = topic_views(db.get_ref(), rows, &config.site.base_url).await?;
    Ok(HttpResponse::Ok().json(page.with_data(views)))
}

#[post("/api/forum-topics")]
pub async fn create_topic(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    form: web::Json<TopicForm>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    form.validate()?;

    let now = Utc::now().naive_utc();
    let topic = forum_topics::ActiveModel {
        partner_id: Set(user.partner_id),
        user_id: Set(user.id),
        title: Set(form.title.trim().to_owned()),
        content: Set(form.content.clone()),
        category: Set(form
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    let view = topic_views(db.get_ref(), vec![topic], &config.site.base_url)
        .await?
        .pop();
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Topic created successfully",
        "topic": view,
    })))
}

#[get("/api/forum-topics/{id}")]
pub async fn view_topic(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let topic = find_topic(db.get_ref(), path.into_inner()).await?;
    let comments = super::comments::comment_tree(
        db.get_ref(),
        topic.id,
        client.get_id(),
        &config.site.base_url,
    )
    .await?;
    let topic = topic_views(db.get_ref(), vec![topic], &config.site.base_url)
        .await?
        .pop();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "topic": topic,
        "comments": comments,
    })))
}

#[put("/api/forum-topics/{id}")]
pub async fn update_topic(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<i32>,
    form: web::Json<TopicForm>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let topic = find_topic(db.get_ref(), path.into_inner()).await?;
    if topic.user_id != user.id && !client.can_moderate(topic.partner_id) {
        return Err(ApiError::forbidden());
    }
    form.validate()?;

    let mut active: forum_topics::ActiveModel = topic.into();
    active.title = Set(form.title.trim().to_owned());
    active.content = Set(form.content.clone());
    active.category = Set(form
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned));
    active.updated_at = Set(Utc::now().naive_utc());
    let topic = active.update(db.get_ref()).await?;

    let view = topic_views(db.get_ref(), vec![topic], &config.site.base_url)
        .await?
        .pop();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Topic updated successfully",
        "topic": view,
    })))
}

/// Deletes a topic with its comments and their likes.
pub(crate) async fn delete_topic_tree<C: ConnectionTrait>(
    db: &C,
    topic_id: i32,
) -> Result<(), DbErr> {
    let comment_ids: Vec<i32> = forum_comments::Entity::find()
        .filter(forum_comments::Column::TopicId.eq(topic_id))
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    if !comment_ids.is_empty() {
        comment_likes::Entity::delete_many()
            .filter(comment_likes::Column::CommentId.is_in(comment_ids))
            .exec(db)
            .await?;
    }
    forum_comments::Entity::delete_many()
        .filter(forum_comments::Column::TopicId.eq(topic_id))
        .exec(db)
        .await?;
    forum_topics::Entity::delete_many()
        .filter(forum_topics::Column::Id.eq(topic_id))
        .exec(db)
        .await?;
    Ok(())
}

#[delete("/api/forum-topics/{id}")]
pub async fn delete_topic(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let topic = find_topic(db.get_ref(), path.into_inner()).await?;
    if topic.user_id != user.id && !client.can_moderate(topic.partner_id) {
        return Err(ApiError::forbidden());
    }

    let txn = db.begin().await?;
    delete_topic_tree(&txn, topic.id).await?;
    txn.commit().await?;

    log::info!("Topic {} deleted by user {}", topic.id, user.id);
    Ok(super::message("Topic deleted successfully"))
}
