//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with PARTNERHUB_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like database passwords should be kept in environment variables,
//! not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration, read by the binaries at startup.
/// Request handlers receive their copy through `web::Data<AppConfig>`.
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Absolute origin used to resolve stored asset paths into URLs.
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "PartnerHub".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (should be in env var PARTNERHUB_DATABASE_URL or DATABASE_URL)
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://partnerhub.db?mode=rwc".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory backing the public `/storage` disk
    pub local_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: "./storage".to_string(),
        }
    }
}

/// Content limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub topics_per_page: usize,
    pub news_per_page: usize,
    pub reports_per_page: usize,
    pub users_per_page: usize,
    pub ratings_per_page: usize,
    pub partners_per_page: usize,
    pub notifications_per_page: usize,
    /// Maximum partner logo size in KB
    pub logo_max_kb: usize,
    /// Maximum partner banner size in KB
    pub banner_max_kb: usize,
    /// Maximum news image size in KB
    pub news_image_max_kb: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            topics_per_page: 10,
            news_per_page: 9,
            reports_per_page: 10,
            users_per_page: 10,
            ratings_per_page: 20,
            partners_per_page: 12,
            notifications_per_page: 20,
            logo_max_kb: 2048,
            banner_max_kb: 4096,
            news_image_max_kb: 2048,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., PARTNERHUB_SITE_NAME, PARTNERHUB_DATABASE_URL
            .add_source(
                Environment::with_prefix("PARTNERHUB")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        // The `_` separator splits field names that contain underscores, so
        // these keys are read directly.
        if let Ok(base_url) = std::env::var("PARTNERHUB_SITE_BASE_URL") {
            app_config.site.base_url = base_url;
        }
        if let Ok(local_path) = std::env::var("PARTNERHUB_STORAGE_LOCAL_PATH") {
            app_config.storage.local_path = local_path;
        }

        // Plain DATABASE_URL is honoured when the prefixed variable is absent.
        if std::env::var("PARTNERHUB_DATABASE_URL").is_err() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                app_config.database.url = url;
            }
        }

        Ok(app_config)
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let site_name = get_config().site.name;
    log::info!("Configuration loaded: site.name = {}", site_name);
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}
