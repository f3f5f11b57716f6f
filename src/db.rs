//! Database connection and schema bootstrap.

use crate::orm::{
    api_tokens, comment_likes, forum_comments, forum_topics, news, news_likes, notifications,
    partner_ratings, partners, reports, subscriptions, users,
};
use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

/// Opens a connection pool for `url`.
///
/// In-memory sqlite databases exist per connection, so those pools are pinned
/// to a single connection.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.sqlx_logging(false);
    if url.starts_with("sqlite::memory:") || url.contains("mode=memory") {
        opt.max_connections(1).min_connections(1);
    }

    log::info!("Connecting to database");
    Database::connect(opt).await
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    stmt
}

fn unique_pair<E, C>(name: &str, entity: E, a: C, b: C) -> IndexCreateStatement
where
    E: EntityTrait,
    C: sea_orm::sea_query::IntoIden + 'static,
{
    Index::create()
        .name(name)
        .table(entity)
        .col(a)
        .col(b)
        .unique()
        .to_owned()
}

fn is_already_exists(e: &DbErr) -> bool {
    let message = match e {
        DbErr::Exec(m) | DbErr::Query(m) | DbErr::Conn(m) => m,
        _ => return false,
    };
    message.to_lowercase().contains("already exists")
}

/// Creates every table that does not exist yet, parents before children.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        table_for(&schema, partners::Entity),
        table_for(&schema, users::Entity),
        table_for(&schema, subscriptions::Entity),
        table_for(&schema, api_tokens::Entity),
        table_for(&schema, forum_topics::Entity),
        table_for(&schema, forum_comments::Entity),
        table_for(&schema, comment_likes::Entity),
        table_for(&schema, news::Entity),
        table_for(&schema, news_likes::Entity),
        table_for(&schema, reports::Entity),
        table_for(&schema, partner_ratings::Entity),
        table_for(&schema, notifications::Entity),
    ];

    for table in tables.iter() {
        db.execute(backend.build(table)).await?;
    }

    let indexes = [
        unique_pair(
            "idx_partner_ratings_user_partner",
            partner_ratings::Entity,
            partner_ratings::Column::UserId,
            partner_ratings::Column::PartnerId,
        ),
        unique_pair(
            "idx_comment_likes_comment_user",
            comment_likes::Entity,
            comment_likes::Column::CommentId,
            comment_likes::Column::UserId,
        ),
        unique_pair(
            "idx_news_likes_news_user",
            news_likes::Entity,
            news_likes::Column::NewsId,
            news_likes::Column::UserId,
        ),
    ];

    // Index statements carry no IF NOT EXISTS.
    for index in indexes.iter() {
        match db.execute(backend.build(index)).await {
            Ok(_) => {}
            Err(e) if is_already_exists(&e) => {
                log::warn!("Skipping index creation: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
