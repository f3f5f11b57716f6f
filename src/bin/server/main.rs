use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use partnerhub::app_config;
use partnerhub::middleware::ClientCtx;
use partnerhub::storage::{local::LocalStorage, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();

    let config = app_config::get_config();
    let db = partnerhub::db::connect(&config.database.url)
        .await
        .context("Unable to connect to the database")?;
    partnerhub::db::create_tables(&db)
        .await
        .context("Unable to create database tables")?;

    let storage_root = PathBuf::from(&config.storage.local_path);
    let storage: Arc<dyn StorageBackend> = Arc::new(
        LocalStorage::new(storage_root.clone()).context("Unable to open the storage directory")?,
    );

    let bind = config.server.bind.clone();
    log::info!("Listening on {}", bind);

    let db = Data::new(db);
    let storage = Data::from(storage);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(db.clone())
            .app_data(config_data.clone())
            .app_data(storage.clone())
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(ClientCtx::default())
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(partnerhub::web::configure)
            .service(actix_files::Files::new("/storage", storage_root.clone()))
    })
    .bind(&bind)
    .with_context(|| format!("Unable to bind {}", bind))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
