/// Notification routes
///
/// Lists the caller's notifications and marks them read.
use super::error::ApiError;
use crate::app_config::AppConfig;
use crate::middleware::ClientCtx;
use crate::notifications::{self, NotificationView};
use crate::pagination::{page_number, paginate, Page};
use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_notifications).service(mark_read);
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

#[derive(Serialize)]
struct NotificationPage {
    #[serde(flatten)]
    page: Page<NotificationView>,
    unread_count: usize,
}

#[get("/api/notifications")]
pub async fn view_notifications(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;

    let page = paginate(
        db.get_ref(),
        notifications::for_user(user.id),
        page_number(query.page),
        config.limits.notifications_per_page,
    )
    .await?;
    let unread_count = notifications::count_unread_notifications(db.get_ref(), user.id).await?;

    Ok(HttpResponse::Ok().json(NotificationPage {
        page: page.map(NotificationView::from),
        unread_count,
    }))
}

#[post("/api/notifications/{id}/read")]
pub async fn mark_read(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_login()?;

    if !notifications::mark_notification_read(db.get_ref(), path.into_inner(), user.id).await? {
        return Err(ApiError::not_found("Notification"));
    }
    Ok(super::message("Notification marked as read"))
}
