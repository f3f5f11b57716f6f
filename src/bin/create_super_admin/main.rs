//! Creates a super admin account, or promotes an existing account with the
//! same e-mail.
//!
//! Usage: `create-super-admin <name> <email> <password>`

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use env_logger::Env;
use partnerhub::orm::users;
use partnerhub::{app_config, db, session, user};
use sea_orm::{entity::*, ActiveValue::Set};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (name, email, password) = match args.as_slice() {
        [name, email, password] => (name.trim(), email.trim().to_lowercase(), password),
        _ => bail!("usage: create-super-admin <name> <email> <password>"),
    };
    if password.len() < 8 {
        bail!("password must be at least 8 characters");
    }

    let config = app_config::get_config();
    let conn = db::connect(&config.database.url)
        .await
        .context("Unable to connect to the database")?;
    db::create_tables(&conn).await?;

    let hash = session::hash_password(password).map_err(|e| anyhow!("{}", e))?;
    let now = Utc::now().naive_utc();

    let account = match user::find_by_email(&conn, &email).await? {
        Some(existing) => {
            let mut active: users::ActiveModel = existing.into();
            active.role = Set(users::Role::SuperAdmin);
            active.status = Set(users::Status::Active);
            active.partner_id = Set(None);
            active.password = Set(hash);
            active.updated_at = Set(now);
            active.update(&conn).await?
        }
        None => {
            users::ActiveModel {
                name: Set(name.to_owned()),
                email: Set(email.clone()),
                password: Set(hash),
                role: Set(users::Role::SuperAdmin),
                status: Set(users::Status::Active),
                partner_id: Set(None),
                profile_picture: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&conn)
            .await?
        }
    };

    log::info!("Super admin {} <{}> is ready", account.id, account.email);
    Ok(())
}
