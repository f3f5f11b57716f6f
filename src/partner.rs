//! Partner sites: public payloads, subscriptions and ratings.

use crate::orm::{
    forum_comments, forum_topics, news, partner_ratings, partners, reports, subscriptions, users,
};
use crate::storage::public_url;
use chrono::{NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    entity::*, query::*, Condition, ConnectionTrait, DbErr, FromQueryResult, PaginatorTrait,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static SLUG_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// Lowercase, hyphen-separated slug derived from a display name.
pub fn slugify(name: &str) -> String {
    SLUG_SEPARATORS
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= 255 && SLUG_FORMAT.is_match(slug)
}

/// Partner as rendered to clients, with asset paths resolved.
#[derive(Clone, Debug, Serialize)]
pub struct PartnerView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub status: partners::Status,
    pub user_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_subscription: Option<Option<subscriptions::Model>>,
}

impl PartnerView {
    pub fn new(partner: partners::Model, base_url: &str) -> Self {
        Self {
            logo: public_url(base_url, partner.logo.as_deref()),
            banner: public_url(base_url, partner.banner.as_deref()),
            id: partner.id,
            name: partner.name,
            slug: partner.slug,
            domain: partner.domain,
            website: partner.website,
            description: partner.description,
            status: partner.status,
            user_id: partner.user_id,
            created_at: partner.created_at,
            updated_at: partner.updated_at,
            latest_subscription: None,
        }
    }

    /// Attaches the latest subscription; `null` in JSON when there is none.
    pub fn with_subscription(mut self, subscription: Option<subscriptions::Model>) -> Self {
        self.latest_subscription = Some(subscription);
        self
    }
}

pub async fn find_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<partners::Model>, DbErr> {
    partners::Entity::find()
        .filter(partners::Column::Slug.eq(slug))
        .one(db)
        .await
}

/// The subscription row with the highest id.
pub async fn latest_subscription<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
) -> Result<Option<subscriptions::Model>, DbErr> {
    subscriptions::Entity::find()
        .filter(subscriptions::Column::PartnerId.eq(partner_id))
        .order_by_desc(subscriptions::Column::Id)
        .one(db)
        .await
}

/// Sets the status of the latest subscription, creating one when the
/// partner has none.
pub async fn set_subscription_status<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
    status: subscriptions::Status,
) -> Result<subscriptions::Model, DbErr> {
    let now = Utc::now().naive_utc();
    match latest_subscription(db, partner_id).await? {
        Some(existing) => {
            let mut active: subscriptions::ActiveModel = existing.into();
            active.status = Set(status);
            active.updated_at = Set(now);
            active.update(db).await
        }
        None => {
            subscriptions::ActiveModel {
                partner_id: Set(partner_id),
                status: Set(status),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await
        }
    }
}

/// Counters shown on a partner's public site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SiteStats {
    pub total_users: usize,
    pub total_news: usize,
    pub total_topics: usize,
    pub total_reports: usize,
}

#[derive(FromQueryResult)]
struct UserIdRow {
    user_id: i32,
}

/// Ids of users who posted a topic, filed a report, or commented on a topic
/// belonging to `partner_id`.
async fn interacting_user_ids<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
) -> Result<BTreeSet<i32>, DbErr> {
    let mut ids = BTreeSet::new();

    let topic_authors = forum_topics::Entity::find()
        .select_only()
        .column(forum_topics::Column::UserId)
        .filter(forum_topics::Column::PartnerId.eq(partner_id))
        .into_model::<UserIdRow>()
        .all(db)
        .await?;
    ids.extend(topic_authors.into_iter().map(|r| r.user_id));

    let reporters = reports::Entity::find()
        .select_only()
        .column(reports::Column::UserId)
        .filter(reports::Column::PartnerId.eq(partner_id))
        .into_model::<UserIdRow>()
        .all(db)
        .await?;
    ids.extend(reporters.into_iter().map(|r| r.user_id));

    let commenters = forum_comments::Entity::find()
        .select_only()
        .column(forum_comments::Column::UserId)
        .inner_join(forum_topics::Entity)
        .filter(forum_topics::Column::PartnerId.eq(partner_id))
        .into_model::<UserIdRow>()
        .all(db)
        .await?;
    ids.extend(commenters.into_iter().map(|r| r.user_id));

    Ok(ids)
}

pub async fn site_stats<C: ConnectionTrait>(db: &C, partner_id: i32) -> Result<SiteStats, DbErr> {
    // Members, plus partner-less users who took part in this partner's site.
    let interacting = interacting_user_ids(db, partner_id).await?;
    let mut members = Condition::any().add(users::Column::PartnerId.eq(partner_id));
    if !interacting.is_empty() {
        members = members.add(
            Condition::all()
                .add(users::Column::PartnerId.is_null())
                .add(users::Column::Id.is_in(interacting)),
        );
    }

    let total_users = users::Entity::find().filter(members).count(db).await?;
    let total_news = news::Entity::find()
        .filter(news::Column::PartnerId.eq(partner_id))
        .count(db)
        .await?;
    let total_topics = forum_topics::Entity::find()
        .filter(forum_topics::Column::PartnerId.eq(partner_id))
        .count(db)
        .await?;
    let total_reports = reports::Entity::find()
        .filter(reports::Column::PartnerId.eq(partner_id))
        .count(db)
        .await?;

    Ok(SiteStats {
        total_users,
        total_news,
        total_topics,
        total_reports,
    })
}

/// Aggregate of a partner's ratings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingStats {
    pub average: f64,
    pub total: usize,
    /// Count per star value, 1 through 5.
    pub distribution: BTreeMap<i32, usize>,
}

impl RatingStats {
    pub fn from_values<I: IntoIterator<Item = i32>>(values: I) -> Self {
        let mut distribution: BTreeMap<i32, usize> = (1..=5).map(|star| (star, 0)).collect();
        let mut sum = 0i64;
        let mut total = 0usize;
        for value in values {
            sum += i64::from(value);
            total += 1;
            if let Some(count) = distribution.get_mut(&value) {
                *count += 1;
            }
        }

        let average = if total == 0 {
            0.0
        } else {
            (sum as f64 / total as f64 * 10.0).round() / 10.0
        };

        Self {
            average,
            total,
            distribution,
        }
    }
}

#[derive(FromQueryResult)]
struct RatingRow {
    rating: i32,
}

pub async fn rating_stats<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
) -> Result<RatingStats, DbErr> {
    let rows = partner_ratings::Entity::find()
        .select_only()
        .column(partner_ratings::Column::Rating)
        .filter(partner_ratings::Column::PartnerId.eq(partner_id))
        .into_model::<RatingRow>()
        .all(db)
        .await?;
    Ok(RatingStats::from_values(rows.into_iter().map(|r| r.rating)))
}

pub async fn find_rating<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
    user_id: i32,
) -> Result<Option<partner_ratings::Model>, DbErr> {
    partner_ratings::Entity::find()
        .filter(partner_ratings::Column::PartnerId.eq(partner_id))
        .filter(partner_ratings::Column::UserId.eq(user_id))
        .one(db)
        .await
}

async fn update_rating<C: ConnectionTrait>(
    db: &C,
    existing: partner_ratings::Model,
    rating: i32,
    comment: Option<String>,
) -> Result<partner_ratings::Model, DbErr> {
    let mut active: partner_ratings::ActiveModel = existing.into();
    active.rating = Set(rating);
    active.comment = Set(comment);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await
}

fn is_unique_violation(e: &DbErr) -> bool {
    let message = match e {
        DbErr::Exec(m) | DbErr::Query(m) => m.to_lowercase(),
        _ => return false,
    };
    message.contains("unique") || message.contains("duplicate")
}

/// Records `user_id`'s rating of `partner_id`, replacing any earlier one.
pub async fn rate<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
    user_id: i32,
    rating: i32,
    comment: Option<String>,
) -> Result<partner_ratings::Model, DbErr> {
    match find_rating(db, partner_id, user_id).await? {
        Some(existing) => update_rating(db, existing, rating, comment).await,
        None => insert_rating(db, partner_id, user_id, rating, comment).await,
    }
}

/// Inserts a rating for a pair that had none when it was looked up.
///
/// The (user_id, partner_id) unique index rejects a concurrent second
/// insert; the loser of that race retries once as an update.
pub async fn insert_rating<C: ConnectionTrait>(
    db: &C,
    partner_id: i32,
    user_id: i32,
    rating: i32,
    comment: Option<String>,
) -> Result<partner_ratings::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let inserted = partner_ratings::ActiveModel {
        user_id: Set(user_id),
        partner_id: Set(partner_id),
        rating: Set(rating),
        comment: Set(comment.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(model) => Ok(model),
        Err(e) if is_unique_violation(&e) => {
            log::debug!(
                "Rating by user {} for partner {} raced an insert; updating",
                user_id,
                partner_id
            );
            match find_rating(db, partner_id, user_id).await? {
                Some(existing) => update_rating(db, existing, rating, comment).await,
                None => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme University"), "acme-university");
        assert_eq!(slugify("  St. Mary's -- College! "), "st-mary-s-college");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_slug_format() {
        assert!(is_valid_slug("acme"));
        assert!(is_valid_slug("acme-2"));
        assert!(!is_valid_slug("Acme"));
        assert!(!is_valid_slug("-acme"));
        assert!(!is_valid_slug("acme--u"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_rating_stats_empty() {
        let stats = RatingStats::from_values(Vec::new());
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.distribution.len(), 5);
        assert!(stats.distribution.values().all(|c| *c == 0));
    }

    #[test]
    fn test_rating_stats_rounds_to_one_decimal() {
        let stats = RatingStats::from_values(vec![5, 4, 4]);
        assert_eq!(stats.average, 4.3);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.distribution[&4], 2);
        assert_eq!(stats.distribution[&5], 1);
        assert_eq!(stats.distribution[&1], 0);
    }

    #[test]
    fn test_unique_violation_detection() {
        assert!(is_unique_violation(&DbErr::Exec(
            "UNIQUE constraint failed: partner_ratings.user_id".into()
        )));
        assert!(is_unique_violation(&DbErr::Query(
            "duplicate key value violates unique constraint".into()
        )));
        assert!(!is_unique_violation(&DbErr::Exec("no such table".into())));
    }

    #[test]
    fn test_partner_view_resolves_assets() {
        let now = Utc::now().naive_utc();
        let partner = partners::Model {
            id: 1,
            name: "Acme".into(),
            slug: "acme".into(),
            domain: None,
            logo: Some("/storage/logos/a.png".into()),
            banner: None,
            website: None,
            description: None,
            status: partners::Status::Active,
            user_id: None,
            created_at: now,
            updated_at: now,
        };
        let view = PartnerView::new(partner, "http://localhost:8080");
        assert_eq!(
            view.logo.as_deref(),
            Some("http://localhost:8080/storage/logos/a.png")
        );
        assert_eq!(view.banner, None);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("latest_subscription").is_none());
        let json = serde_json::to_value(&view.with_subscription(None)).unwrap();
        assert!(json["latest_subscription"].is_null());
    }
}
