//! Password hashing and bearer token issuance.

use crate::orm::{api_tokens, users};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// Length of the random part of a bearer token.
const TOKEN_LENGTH: usize = 48;

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Hashes a plain-text password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a plain-text password against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Digest stored in place of a bearer token.
pub fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Creates a new bearer token for `user_id`. The plain token is only ever
/// returned here.
pub async fn issue_token<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<String, DbErr> {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let token = format!("{}|{}", user_id, random);

    api_tokens::ActiveModel {
        user_id: Set(user_id),
        token_hash: Set(hash_token(&token)),
        last_used_at: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(token)
}

/// Resolves a bearer token to its user, touching `last_used_at`.
pub async fn authenticate_token<C: ConnectionTrait>(
    db: &C,
    token: &str,
) -> Result<Option<users::Model>, DbErr> {
    let found = api_tokens::Entity::find()
        .filter(api_tokens::Column::TokenHash.eq(hash_token(token)))
        .find_also_related(users::Entity)
        .one(db)
        .await?;

    let (record, user) = match found {
        Some((record, Some(user))) => (record, user),
        _ => return Ok(None),
    };

    let mut active: api_tokens::ActiveModel = record.into();
    active.last_used_at = Set(Some(Utc::now().naive_utc()));
    active.update(db).await?;

    Ok(Some(user))
}

/// Deletes the token presented by the caller.
pub async fn revoke_token<C: ConnectionTrait>(db: &C, token: &str) -> Result<(), DbErr> {
    api_tokens::Entity::delete_many()
        .filter(api_tokens::Column::TokenHash.eq(hash_token(token)))
        .exec(db)
        .await?;
    Ok(())
}

/// Deletes every token of a user, ending all of their sessions.
pub async fn revoke_all_tokens<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<(), DbErr> {
    api_tokens::Entity::delete_many()
        .filter(api_tokens::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}
