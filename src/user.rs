use crate::orm::users::{self, Role, Status};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use serde::Serialize;
use std::collections::HashMap;

/// Public shape of a user. Never carries the password hash.
#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: Status,
    pub partner_id: Option<i32>,
    pub profile_picture: Option<String>,
    pub created_at: NaiveDateTime,
}

impl UserView {
    /// `base_url` resolves the stored profile picture path.
    pub fn new(user: &users::Model, base_url: &str) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            status: user.status,
            partner_id: user.partner_id,
            profile_picture: crate::storage::public_url(base_url, user.profile_picture.as_deref()),
            created_at: user.created_at,
        }
    }
}

/// Short user record embedded in topics, comments, news and ratings.
#[derive(Clone, Debug, Serialize)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub profile_picture: Option<String>,
}

impl Author {
    pub fn new(user: &users::Model, base_url: &str) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            profile_picture: crate::storage::public_url(base_url, user.profile_picture.as_deref()),
        }
    }
}

/// Loads the authors for a set of user ids in one query.
pub async fn load_authors<C, I>(
    db: &C,
    ids: I,
    base_url: &str,
) -> Result<HashMap<i32, Author>, DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i32>,
{
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .iter()
        .map(|u| (u.id, Author::new(u, base_url)))
        .collect())
}

/// Outcome of one step up the role ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Promotion {
    pub role: Role,
    pub partner_id: Option<i32>,
}

impl Promotion {
    pub fn message(&self) -> &'static str {
        match self.role {
            Role::SuperAdmin => "User promoted to Super Admin successfully",
            Role::PartnerAdmin => "User promoted to Partner Admin successfully",
            Role::GeneralUser => "User promoted successfully",
        }
    }
}

/// The promotion ladder.
///
/// - partner admins become global super admins and leave their partner;
/// - general users attached to a partner become that partner's admin;
/// - general users without a partner become super admins.
///
/// Super admins cannot be promoted further and yield `None`.
pub fn next_promotion(role: Role, partner_id: Option<i32>) -> Option<Promotion> {
    match (role, partner_id) {
        (Role::SuperAdmin, _) => None,
        (Role::PartnerAdmin, _) => Some(Promotion {
            role: Role::SuperAdmin,
            partner_id: None,
        }),
        (Role::GeneralUser, Some(id)) => Some(Promotion {
            role: Role::PartnerAdmin,
            partner_id: Some(id),
        }),
        (Role::GeneralUser, None) => Some(Promotion {
            role: Role::SuperAdmin,
            partner_id: None,
        }),
    }
}

/// Applies `promotion` to `user`.
pub async fn apply_promotion<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
    promotion: Promotion,
) -> Result<users::Model, DbErr> {
    let mut active: users::ActiveModel = user.into();
    active.role = Set(promotion.role);
    active.partner_id = Set(promotion.partner_id);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await
}

/// Moderation actions on an account's status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusAction {
    Suspend,
    Activate,
    Ban,
}

impl StatusAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "suspend" => Some(Self::Suspend),
            "activate" => Some(Self::Activate),
            "ban" => Some(Self::Ban),
            _ => None,
        }
    }

    pub fn target_status(&self) -> Status {
        match self {
            Self::Suspend => Status::Suspended,
            Self::Activate => Status::Active,
            Self::Ban => Status::Banned,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Suspend => "User suspended successfully",
            Self::Activate => "User activated successfully",
            Self::Ban => "User banned successfully",
        }
    }
}

/// Sets the account status. Leaving `active` also revokes every token.
pub async fn set_status<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
    action: StatusAction,
) -> Result<users::Model, DbErr> {
    let user_id = user.id;
    let status = action.target_status();

    let mut active: users::ActiveModel = user.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().naive_utc());
    let updated = active.update(db).await?;

    if status != Status::Active {
        crate::session::revoke_all_tokens(db, user_id).await?;
    }

    log::info!("User {} status set to {:?}", user_id, status);
    Ok(updated)
}

/// Looks up an account by e-mail, case-insensitively.
pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
}
