//! Test database and app state setup
#![allow(dead_code)]

use actix_web::web::Data;
use partnerhub::app_config::AppConfig;
use partnerhub::storage::{local::LocalStorage, StorageBackend};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use tempfile::TempDir;

/// Everything a test app needs. Each test gets its own in-memory database
/// and storage directory, so tests do not have to run serially.
pub struct TestContext {
    pub db: Data<DatabaseConnection>,
    pub config: Data<AppConfig>,
    pub storage: Data<dyn StorageBackend>,
    /// Kept alive for the length of the test.
    pub storage_dir: TempDir,
}

impl TestContext {
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.get_ref()
    }
}

/// Fresh in-memory sqlite database with every table created.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = partnerhub::db::connect("sqlite::memory:").await?;
    partnerhub::db::create_tables(&db).await?;
    Ok(db)
}

/// Database, default configuration and a temporary storage directory.
pub async fn setup_test_context() -> TestContext {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");
    let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
    let storage: Arc<dyn StorageBackend> = Arc::new(
        LocalStorage::new(storage_dir.path().to_path_buf()).expect("Failed to open storage"),
    );

    let mut config = AppConfig::default();
    config.site.base_url = "http://partners.test".to_string();
    config.storage.local_path = storage_dir.path().to_string_lossy().into_owned();

    TestContext {
        db: Data::new(db),
        config: Data::new(config),
        storage: Data::from(storage),
        storage_dir,
    }
}
