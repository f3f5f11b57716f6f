//! JSON error responses shared by every endpoint.

use crate::storage::StorageError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use derive_more::Display;
use sea_orm::DbErr;
use serde::Serialize;
use std::collections::BTreeMap;
use validator::ValidationErrors;

/// Field name to list of messages, as rendered in 422 bodies.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Unauthenticated.")]
    Unauthenticated,
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    /// Request rejected with a top-level message only.
    #[display(fmt = "{}", _0)]
    Unprocessable(String),
    #[display(fmt = "{}", message)]
    Validation { message: String, errors: FieldErrors },
    #[display(fmt = "Database error: {}", _0)]
    Database(DbErr),
    #[display(fmt = "Storage error: {}", _0)]
    Storage(StorageError),
}

impl ApiError {
    pub fn forbidden() -> Self {
        Self::Forbidden("Unauthorized".to_string())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found.", what))
    }

    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.clone()]);
        Self::Validation { message, errors }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) | Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Database(e) => {
                log::error!("Database error: {}", e);
                ErrorBody {
                    message: "Server Error".to_string(),
                    errors: None,
                }
            }
            Self::Storage(e) => {
                log::error!("Storage error: {}", e);
                ErrorBody {
                    message: "Server Error".to_string(),
                    errors: None,
                }
            }
            Self::Validation { message, errors } => ErrorBody {
                message: message.clone(),
                errors: Some(errors),
            },
            other => ErrorBody {
                message: other.to_string(),
                errors: None,
            },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        for (field, field_errors) in e.field_errors() {
            let messages = field_errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("The {} field is invalid.", field),
                })
                .collect();
            errors.insert(field.to_string(), messages);
        }
        let message = errors
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());
        Self::Validation { message, errors }
    }
}

/// Malformed JSON bodies are reported as 422 like other validation failures.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _: &HttpRequest,
) -> actix_web::Error {
    ApiError::Unprocessable(format!("The given data was invalid: {}", err)).into()
}

/// Malformed query strings are reported as 422.
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _: &HttpRequest,
) -> actix_web::Error {
    ApiError::Unprocessable(format!("The given data was invalid: {}", err)).into()
}

/// Malformed path segments (non-numeric ids) read as missing rows.
pub fn path_error_handler(_: actix_web::error::PathError, _: &HttpRequest) -> actix_web::Error {
    ApiError::NotFound("Not found.".to_string()).into()
}
