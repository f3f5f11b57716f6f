//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use chrono::Utc;
use once_cell::sync::Lazy;
use partnerhub::orm::{forum_comments, forum_topics, news, partners, reports, users};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Plain-text password of every fixture user.
pub const PASSWORD: &str = "password123";

// Hashing is slow; every fixture user shares one hash.
static PASSWORD_HASH: Lazy<String> = Lazy::new(|| {
    partnerhub::session::hash_password(PASSWORD).expect("Failed to hash fixture password")
});

/// Test user fixture
pub struct TestUser {
    pub model: users::Model,
    /// Bearer token issued for the user.
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> i32 {
        self.model.id
    }
}

/// Create an active user with a bearer token.
pub async fn create_user(
    db: &DatabaseConnection,
    name: &str,
    role: users::Role,
    partner_id: Option<i32>,
) -> Result<TestUser, DbErr> {
    let now = Utc::now().naive_utc();
    let model = users::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@test.com", name.to_lowercase().replace(' ', "."))),
        password: Set(PASSWORD_HASH.clone()),
        role: Set(role),
        status: Set(users::Status::Active),
        partner_id: Set(partner_id),
        profile_picture: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let token = partnerhub::session::issue_token(db, model.id).await?;
    Ok(TestUser { model, token })
}

pub async fn create_general_user(
    db: &DatabaseConnection,
    name: &str,
    partner_id: Option<i32>,
) -> Result<TestUser, DbErr> {
    create_user(db, name, users::Role::GeneralUser, partner_id).await
}

pub async fn create_partner_admin(
    db: &DatabaseConnection,
    name: &str,
    partner_id: i32,
) -> Result<TestUser, DbErr> {
    create_user(db, name, users::Role::PartnerAdmin, Some(partner_id)).await
}

pub async fn create_super_admin(db: &DatabaseConnection, name: &str) -> Result<TestUser, DbErr> {
    create_user(db, name, users::Role::SuperAdmin, None).await
}

/// Create a partner with the given status.
pub async fn create_partner(
    db: &DatabaseConnection,
    name: &str,
    slug: &str,
    status: partners::Status,
) -> Result<partners::Model, DbErr> {
    let now = Utc::now().naive_utc();
    partners::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        domain: Set(None),
        logo: Set(None),
        banner: Set(None),
        website: Set(None),
        description: Set(None),
        status: Set(status),
        user_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_topic(
    db: &DatabaseConnection,
    author: &users::Model,
    title: &str,
) -> Result<forum_topics::Model, DbErr> {
    let now = Utc::now().naive_utc();
    forum_topics::ActiveModel {
        partner_id: Set(author.partner_id),
        user_id: Set(author.id),
        title: Set(title.to_string()),
        content: Set(format!("{} body", title)),
        category: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_comment(
    db: &DatabaseConnection,
    topic: &forum_topics::Model,
    author: &users::Model,
    parent_id: Option<i32>,
    content: &str,
) -> Result<forum_comments::Model, DbErr> {
    let now = Utc::now().naive_utc();
    forum_comments::ActiveModel {
        topic_id: Set(topic.id),
        user_id: Set(author.id),
        parent_id: Set(parent_id),
        partner_id: Set(topic.partner_id),
        content: Set(content.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_news(
    db: &DatabaseConnection,
    author: &users::Model,
    partner_id: Option<i32>,
    title: &str,
) -> Result<news::Model, DbErr> {
    let now = Utc::now().naive_utc();
    news::ActiveModel {
        partner_id: Set(partner_id),
        user_id: Set(author.id),
        title: Set(title.to_string()),
        content: Set(format!("{} content", title)),
        image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_report(
    db: &DatabaseConnection,
    reporter: &users::Model,
    title: &str,
    urgency: reports::Urgency,
) -> Result<reports::Model, DbErr> {
    let now = Utc::now().naive_utc();
    reports::ActiveModel {
        partner_id: Set(reporter.partner_id),
        user_id: Set(reporter.id),
        title: Set(title.to_string()),
        description: Set(format!("{} description", title)),
        category: Set(reports::Category::General),
        urgency: Set(urgency),
        status: Set(reports::Status::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Smallest valid PNG header; enough for content sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

pub const BOUNDARY: &str = "----partnerhub-test-boundary";

/// Encodes a multipart/form-data body. Returns the content type and body.
pub fn multipart_body(
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (name, filename, data) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
