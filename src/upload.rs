//! Multipart form parsing and image uploads.

use crate::storage::{key_from_public_path, public_path, StorageBackend};
use crate::web::error::ApiError;
use actix_multipart::{Field, Multipart};
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;

/// Upper bound for non-file fields.
const TEXT_FIELD_LIMIT: usize = 64 * 1024;

/// Image formats accepted for logos, banners and news images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl ImageKind {
    /// Identifies an image by its leading bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if data.starts_with(b"BM") && data.len() > 14 {
            Some(Self::Bmp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub data: Vec<u8>,
}

/// Parsed multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    pub text: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Trimmed text value; empty strings read as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

/// File field accepted by [`read_form`] and its size cap in kilobytes.
#[derive(Clone, Copy, Debug)]
pub struct FileField {
    pub name: &'static str,
    pub max_kb: usize,
}

fn too_large(field: &str, max_kb: usize) -> ApiError {
    ApiError::invalid(
        field,
        format!("The {} must not be greater than {} kilobytes.", field, max_kb),
    )
}

async fn read_field(
    field: &mut Field,
    name: &str,
    limit: usize,
    max_kb: usize,
) -> Result<Vec<u8>, ApiError> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("read_form: multipart read error: {}", e);
            ApiError::Unprocessable("Error interpreting user input.".to_string())
        })?;
        if buf.len() + bytes.len() > limit {
            return Err(too_large(name, max_kb));
        }
        buf.extend_from_slice(&bytes);
    }
    Ok(buf)
}

/// Reads every part of a multipart body. Parts named in `files` are kept as
/// bytes (empty parts are dropped); everything else must be UTF-8 text.
pub async fn read_form(mut payload: Multipart, files: &[FileField]) -> Result<FormData, ApiError> {
    let mut form = FormData::default();

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        log::error!("read_form: malformed multipart body: {}", e);
        ApiError::Unprocessable("Error interpreting user input.".to_string())
    })? {
        let disposition = field.content_disposition();
        let name = match disposition.get_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };

        match files.iter().find(|f| f.name == name) {
            Some(limit) => {
                let data = read_field(&mut field, &name, limit.max_kb * 1024, limit.max_kb).await?;
                if !data.is_empty() {
                    form.files.insert(name, UploadedFile { data });
                }
            }
            None => {
                let data =
                    read_field(&mut field, &name, TEXT_FIELD_LIMIT, TEXT_FIELD_LIMIT / 1024).await?;
                let value = String::from_utf8(data).map_err(|_| {
                    ApiError::invalid(&name, format!("The {} field must be a string.", name))
                })?;
                form.text.insert(name, value);
            }
        }
    }

    Ok(form)
}

/// Validates `file` as an image and stores it under `dir`. Returns the
/// public path to record in the database.
pub async fn store_image(
    storage: &dyn StorageBackend,
    dir: &str,
    field: &str,
    file: &UploadedFile,
) -> Result<String, ApiError> {
    let kind = ImageKind::sniff(&file.data)
        .ok_or_else(|| ApiError::invalid(field, format!("The {} must be an image.", field)))?;

    let key = format!("{}/{}.{}", dir, uuid::Uuid::new_v4(), kind.extension());
    storage.put_object(file.data.clone(), &key).await?;

    log::debug!("Stored {} upload as {}", field, key);
    Ok(public_path(&key))
}

/// Removes a previously stored upload. Failures are logged, not returned,
/// since the new value is already saved.
pub async fn discard_stored(storage: &dyn StorageBackend, stored: Option<&str>) {
    if let Some(key) = stored.and_then(key_from_public_path) {
        if let Err(e) = storage.delete_object(key).await {
            log::warn!("Unable to delete replaced upload {}: {}", key, e);
        }
    }
}
