//! SeaORM entities, one module per table.

pub mod api_tokens;
pub mod comment_likes;
pub mod forum_comments;
pub mod forum_topics;
pub mod news;
pub mod news_likes;
pub mod notifications;
pub mod partner_ratings;
pub mod partners;
pub mod reports;
pub mod subscriptions;
pub mod users;
