//! Forum comments, one level of replies, and comment likes.

use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::orm::{comment_likes, forum_comments};
use crate::tenant::all_tenants;
use crate::user::{load_authors, Author};
use actix_web::{delete, post, put, web, HttpResponse};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, PaginatorTrait,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(create_comment)
        .service(update_comment)
        .service(delete_comment)
        .service(toggle_like);
}

#[derive(Deserialize, Validate)]
pub struct NewCommentForm {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "The content field is required."))]
    pub content: String,
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, Validate)]
pub struct EditCommentForm {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "The content field is required."))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentView {
    #[serde(flatten)]
    pub comment: forum_comments::Model,
    pub author: Option<Author>,
    pub likes_count: usize,
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<CommentView>>,
}

/// Like counts and the caller's own likes for a set of comments.
async fn like_summary<C: ConnectionTrait>(
    db: &C,
    comment_ids: &[i32],
    viewer: Option<i32>,
) -> Result<(HashMap<i32, usize>, HashSet<i32>), DbErr> {
    let mut counts = HashMap::new();
    let mut liked = HashSet::new();
    if comment_ids.is_empty() {
        return Ok((counts, liked));
    }

    let likes = comment_likes::Entity::find()
        .filter(comment_likes::Column::CommentId.is_in(comment_ids.to_vec()))
        .all(db)
        .await?;
    for like in likes {
        *counts.entry(like.comment_id).or_insert(0) += 1;
        if Some(like.user_id) == viewer {
            liked.insert(like.comment_id);
        }
    }
    Ok((counts, liked))
}

/// Comments of a topic in display order: top-level comments oldest first,
/// each carrying its replies.
pub(crate) async fn comment_tree<C: ConnectionTrait>(
    db: &C,
    topic_id: i32,
    viewer: Option<i32>,
    base_url: &str,
) -> Result<Vec<CommentView>, DbErr> {
    let comments = all_tenants::<forum_comments::Entity>()
        .filter(forum_comments::Column::TopicId.eq(topic_id))
        .order_by_asc(forum_comments::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
    let (counts, liked) = like_summary(db, &ids, viewer).await?;
    let authors = load_authors(db, comments.iter().map(|c| c.user_id), base_url).await?;

    let view = |comment: forum_comments::Model| CommentView {
        author: authors.get(&comment.user_id).cloned(),
        likes_count: counts.get(&comment.id).copied().unwrap_or(0),
        liked: liked.contains(&comment.id),
        replies: None,
        comment,
    };

    let mut replies: HashMap<i32, Vec<CommentView>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent_id) => replies.entry(parent_id).or_default().push(view(comment)),
            None => roots.push(view(comment)),
        }
    }

    for root in roots.iter_mut() {
        root.replies = Some(replies.remove(&root.comment.id).unwrap_or_default());
    }
    Ok(roots)
}

async fn single_view<C: ConnectionTrait>(
    db: &C,
    comment: forum_comments::Model,
    viewer: Option<i32>,
    base_url: &str,
) -> Result<CommentView, DbErr> {
    let (counts, liked) = like_summary(db, &[comment.id], viewer).await?;
    let authors = load_authors(db, [comment.user_id], base_url).await?;
    Ok(CommentView {
        author: authors.get(&comment.user_id).cloned(),
        likes_count: counts.get(&comment.id).copied().unwrap_or(0),
        liked: liked.contains(&comment.id),
        replies: None,
        comment,
    })
}

async fn find_comment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<forum_comments::Model, ApiError> {
    all_tenants::<forum_comments::Entity>()
        .filter(forum_comments::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))
}

/// Comment addressed through its topic's URL.
async fn find_topic_comment<C: ConnectionTrait>(
    db: &C,
    topic_id: i32,
    comment_id: i32,
) -> Result<forum_comments::Model, ApiError> {
    let comment = find_comment(db, comment_id).await?;
    if comment.topic_id != topic_id {
        return Err(ApiError::not_found("Comment"));
    }
    Ok(comment)
}

#[post("/api/forum-topics/{topic_id}/comments")]
pub async fn create_comment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<i32>,
    form: web::Json<NewCommentForm>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let topic = super::forum::find_topic(db.get_ref(), path.into_inner()).await?;
    form.validate()?;

    // Replies attach to a top-level comment of the same topic; replying to
    // a reply attaches to that reply's parent.
    let replied_to = match form.parent_id {
        Some(parent_id) => match find_comment(db.get_ref(), parent_id).await {
            Ok(parent) if parent.topic_id == topic.id => Some(parent),
            Ok(_) | Err(ApiError::NotFound(_)) => {
                return Err(ApiError::invalid(
                    "parent_id",
                    "The selected parent id is invalid.",
                ))
            }
            Err(e) => return Err(e),
        },
        None => None,
    };
    let parent_id = replied_to
        .as_ref()
        .map(|parent| parent.parent_id.unwrap_or(parent.id));

    let now = Utc::now().naive_utc();
    let comment = forum_comments::ActiveModel {
        topic_id: Set(topic.id),
        user_id: Set(user.id),
        parent_id: Set(parent_id),
        partner_id: Set(topic.partner_id),
        content: Set(form.content.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    let notified = match &replied_to {
        Some(parent) => {
            crate::notifications::notify_reply(db.get_ref(), parent, &comment, &topic).await
        }
        None => crate::notifications::notify_topic_comment(db.get_ref(), &topic, &comment).await,
    };
    if let Err(e) = notified {
        log::error!("Unable to notify about comment {}: {}", comment.id, e);
    }

    let view = single_view(db.get_ref(), comment, Some(user.id), &config.site.base_url).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Comment added successfully",
        "comment": view,
    })))
}

#[put("/api/forum-topics/{topic_id}/comments/{comment_id}")]
pub async fn update_comment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<(i32, i32)>,
    form: web::Json<EditCommentForm>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let (topic_id, comment_id) = path.into_inner();
    let comment = find_topic_comment(db.get_ref(), topic_id, comment_id).await?;
    if comment.user_id != user.id {
        return Err(ApiError::forbidden());
    }
    form.validate()?;

    let mut active: forum_comments::ActiveModel = comment.into();
    active.content = Set(form.content.clone());
    active.updated_at = Set(Utc::now().naive_utc());
    let comment = active.update(db.get_ref()).await?;

    let view = single_view(db.get_ref(), comment, Some(user.id), &config.site.base_url).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment updated successfully",
        "comment": view,
    })))
}

#[delete("/api/forum-topics/{topic_id}/comments/{comment_id}")]
pub async fn delete_comment(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let (topic_id, comment_id) = path.into_inner();
    let comment = find_topic_comment(db.get_ref(), topic_id, comment_id).await?;
    if comment.user_id != user.id && !client.can_moderate(comment.partner_id) {
        return Err(ApiError::forbidden());
    }

    // The comment goes together with its replies and every like on them.
    let mut doomed: Vec<i32> = forum_comments::Entity::find()
        .filter(forum_comments::Column::ParentId.eq(comment.id))
        .all(db.get_ref())
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    doomed.push(comment.id);

    let txn = db.begin().await?;
    comment_likes::Entity::delete_many()
        .filter(comment_likes::Column::CommentId.is_in(doomed.clone()))
        .exec(&txn)
        .await?;
    forum_comments::Entity::delete_many()
        .filter(forum_comments::Column::Id.is_in(doomed))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    log::info!("Comment {} deleted by user {}", comment.id, user.id);
    Ok(super::message("Comment deleted successfully"))
}

#[post("/api/comments/{comment_id}/like")]
pub async fn toggle_like(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;
    let comment = find_comment(db.get_ref(), path.into_inner()).await?;

    let existing = comment_likes::Entity::find()
        .filter(comment_likes::Column::CommentId.eq(comment.id))
        .filter(comment_likes::Column::UserId.eq(user.id))
        .one(db.get_ref())
        .await?;

    let liked = match existing {
        Some(like) => {
            comment_likes::Entity::delete_many()
                .filter(comment_likes::Column::Id.eq(like.id))
                .exec(db.get_ref())
                .await?;
            false
        }
        None => {
            comment_likes::ActiveModel {
                comment_id: Set(comment.id),
                user_id: Set(user.id),
                created_at: Set(Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(db.get_ref())
            .await?;

            if let Err(e) =
                crate::notifications::notify_comment_like(db.get_ref(), user, &comment).await
            {
                log::error!("Unable to notify about like on comment {}: {}", comment.id, e);
            }
            true
        }
    };

    let likes_count = comment_likes::Entity::find()
        .filter(comment_likes::Column::CommentId.eq(comment.id))
        .count(db.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": if liked { "Liked" } else { "Unliked" },
        "liked": liked,
        "likes_count": likes_count,
    })))
}
