//! Storage backend abstraction for uploaded images.
//!
//! Objects are addressed by a relative key such as `logos/<uuid>.png`. The
//! database stores the public path (`/storage/<key>`); [`public_url`] turns a
//! stored value into an absolute URL at read time.

pub mod local;

use async_trait::async_trait;

/// Prefix under which the public disk is served.
pub const PUBLIC_PREFIX: &str = "/storage/";

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// File not found
    NotFound(String),
    /// I/O error
    Io(std::io::Error),
    /// Key escapes the storage root
    InvalidKey(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::InvalidKey(key) => write!(f, "Invalid key: {}", key),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

/// Trait for storage backends.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `key`, replacing any previous object.
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError>;

    /// Remove the object under `key`. Missing objects are not an error.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Public path recorded in the database for an object key.
pub fn public_path(key: &str) -> String {
    format!("{}{}", PUBLIC_PREFIX, key)
}

/// Object key for a stored public path, if it points into the public disk.
pub fn key_from_public_path(path: &str) -> Option<&str> {
    path.strip_prefix(PUBLIC_PREFIX)
        .or_else(|| path.strip_prefix("storage/"))
        .filter(|key| !key.is_empty())
}

/// Resolves a stored asset value into an absolute URL.
///
/// Absolute http(s) URLs pass through untouched, public-disk paths are joined
/// onto `base_url`, and bare keys (optionally carrying a legacy `public/`
/// prefix) are placed under `/storage/`.
pub fn public_url(base_url: &str, stored: Option<&str>) -> Option<String> {
    let value = stored?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = url::Url::parse(value) {
        if matches!(parsed.scheme(), "http" | "https") {
            return Some(value.to_string());
        }
    }

    let base = base_url.trim_end_matches('/');
    if value.starts_with(PUBLIC_PREFIX) || value.starts_with("storage/") {
        return Some(format!("{}/{}", base, value.trim_start_matches('/')));
    }

    Some(format!("{}/storage/{}", base, value.replace("public/", "")))
}
