#![allow(dead_code)]

pub mod database;
pub mod fixtures;

/// Builds the full API service around a [`database::TestContext`].
#[macro_export]
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.db.clone())
                .app_data($ctx.config.clone())
                .app_data($ctx.storage.clone())
                .wrap(partnerhub::middleware::ClientCtx::default())
                .configure(partnerhub::web::configure),
        )
        .await
    };
}

/// `Authorization` header for a bearer token.
pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
