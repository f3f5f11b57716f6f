//! In-app notifications. Rows are only ever written to the database; there
//! is no mail or push delivery.

pub mod types;

use crate::orm::{forum_comments, forum_topics, notifications, users};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DbErr, PaginatorTrait};
use serde::Serialize;
use serde_json::json;

pub use types::NotificationType;

/// Create a notification for a user
pub async fn create_notification<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    notification_type: NotificationType,
    title: String,
    message: String,
    data: serde_json::Value,
    source_user_id: Option<i32>,
) -> Result<notifications::Model, DbErr> {
    let notification = notifications::ActiveModel {
        user_id: Set(user_id),
        type_: Set(notification_type.as_str().to_string()),
        title: Set(title),
        message: Set(message),
        data: Set(data.to_string()),
        source_user_id: Set(source_user_id),
        created_at: Set(Utc::now().naive_utc()),
        read_at: Set(None),
        ..Default::default()
    };

    let result = notification.insert(db).await?;
    log::debug!(
        "Notification {} ({}) created for user {}",
        result.id,
        notification_type.as_str(),
        user_id
    );
    Ok(result)
}

/// Tells the author of `parent` about `reply`, unless they wrote it.
pub async fn notify_reply<C: ConnectionTrait>(
    db: &C,
    parent: &forum_comments::Model,
    reply: &forum_comments::Model,
    topic: &forum_topics::Model,
) -> Result<(), DbErr> {
    if parent.user_id == reply.user_id {
        return Ok(());
    }

    create_notification(
        db,
        parent.user_id,
        NotificationType::NewReply,
        topic.title.clone(),
        format!("Someone replied to your comment on \"{}\".", topic.title),
        json!({
            "topic_id": topic.id,
            "comment_id": reply.id,
            "title": topic.title,
        }),
        Some(reply.user_id),
    )
    .await
    .map(|_| ())
}

/// Tells the author of `topic` about a new top-level `comment`, unless they
/// wrote it.
pub async fn notify_topic_comment<C: ConnectionTrait>(
    db: &C,
    topic: &forum_topics::Model,
    comment: &forum_comments::Model,
) -> Result<(), DbErr> {
    if topic.user_id == comment.user_id {
        return Ok(());
    }

    create_notification(
        db,
        topic.user_id,
        NotificationType::NewForumComment,
        topic.title.clone(),
        format!("Someone commented on your topic \"{}\".", topic.title),
        json!({
            "topic_id": topic.id,
            "comment_id": comment.id,
            "title": topic.title,
        }),
        Some(comment.user_id),
    )
    .await
    .map(|_| ())
}

/// Tells the author of `comment` that `liker` liked it, unless they liked
/// their own comment.
pub async fn notify_comment_like<C: ConnectionTrait>(
    db: &C,
    liker: &users::Model,
    comment: &forum_comments::Model,
) -> Result<(), DbErr> {
    if liker.id == comment.user_id {
        return Ok(());
    }

    create_notification(
        db,
        comment.user_id,
        NotificationType::NewLike,
        "New like".to_string(),
        format!("{} liked your comment.", liker.name),
        json!({
            "type": "comment",
            "topic_id": comment.topic_id,
            "comment_id": comment.id,
            "user_id": liker.id,
        }),
        Some(liker.id),
    )
    .await
    .map(|_| ())
}

/// Notification as rendered to its recipient.
#[derive(Clone, Debug, Serialize)]
pub struct NotificationView {
    pub id: i32,
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub source_user_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub read_at: Option<NaiveDateTime>,
}

impl From<notifications::Model> for NotificationView {
    fn from(n: notifications::Model) -> Self {
        let data = serde_json::from_str(&n.data).unwrap_or_else(|e| {
            log::warn!("Notification {} carries invalid data: {}", n.id, e);
            serde_json::Value::Null
        });
        Self {
            id: n.id,
            type_: n.type_,
            title: n.title,
            message: n.message,
            data,
            source_user_id: n.source_user_id,
            created_at: n.created_at,
            read_at: n.read_at,
        }
    }
}

/// Notifications of a user, newest first.
pub fn for_user(user_id: i32) -> Select<notifications::Entity> {
    notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .order_by_desc(notifications::Column::Id)
}

/// Count unread notifications for a user
pub async fn count_unread_notifications<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<usize, DbErr> {
    notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::ReadAt.is_null())
        .count(db)
        .await
}

/// Mark a notification as read. Returns false when the notification does
/// not exist or belongs to someone else.
pub async fn mark_notification_read<C: ConnectionTrait>(
    db: &C,
    notification_id: i32,
    user_id: i32,
) -> Result<bool, DbErr> {
    let owned = notifications::Entity::find_by_id(notification_id)
        .filter(notifications::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    let notification = match owned {
        Some(n) => n,
        None => return Ok(false),
    };

    if notification.read_at.is_none() {
        notifications::Entity::update_many()
            .col_expr(
                notifications::Column::ReadAt,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(notifications::Column::Id.eq(notification.id))
            .exec(db)
            .await?;
    }

    Ok(true)
}
