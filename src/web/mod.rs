pub mod auth;
pub mod comments;
pub mod error;
pub mod forum;
pub mod news;
pub mod notifications;
pub mod partner_admin;
pub mod partners;
pub mod reports;
pub mod super_admin;

use crate::middleware::ClientCtx;
use crate::orm::partners as partner_orm;
use crate::tenant::TenantScope;
use actix_web::HttpResponse;
use error::ApiError;
use sea_orm::ConnectionTrait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.app_data(actix_web::web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(actix_web::web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(actix_web::web::PathConfig::default().error_handler(error::path_error_handler));

    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    auth::configure(conf);
    forum::configure(conf);
    comments::configure(conf);
    news::configure(conf);
    reports::configure(conf);
    partners::configure(conf);
    partner_admin::configure(conf);
    super_admin::configure(conf);
    notifications::configure(conf);
}

/// `{"message": ...}` with status 200.
pub(crate) fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": text }))
}

/// Deserializes a string with surrounding whitespace removed.
pub(crate) fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_owned())
}

/// Trimmed, non-empty search term.
pub(crate) fn search_term(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s))
}

/// Parses an enum list filter. Absent, empty and `all` mean no filter.
pub(crate) fn parse_filter<T: DeserializeOwned>(
    field: &str,
    value: &Option<String>,
) -> Result<Option<T>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => serde_json::from_value(serde_json::Value::String(raw.to_owned()))
            .map(Some)
            .map_err(|_| ApiError::invalid(field, format!("The selected {} is invalid.", field))),
    }
}

/// A partner whose public site is reachable.
pub(crate) async fn public_partner<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<partner_orm::Model, ApiError> {
    match crate::partner::find_by_slug(db, slug).await? {
        Some(partner) if partner.status.is_public() => Ok(partner),
        _ => Err(ApiError::NotFound(
            "Partner not found or inactive".to_string(),
        )),
    }
}

/// Scope for a list endpoint: the named partner's site when a slug is
/// given, otherwise the caller's own tenant.
pub(crate) async fn listing_scope<C: ConnectionTrait>(
    db: &C,
    client: &ClientCtx,
    partner_slug: &Option<String>,
) -> Result<TenantScope, ApiError> {
    match partner_slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => Ok(TenantScope::Partner(public_partner(db, slug).await?.id)),
        None => Ok(client.scope()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::reports::Urgency;

    #[test]
    fn test_search_term() {
        assert_eq!(search_term(&None), None);
        assert_eq!(search_term(&Some("   ".into())), None);
        assert_eq!(search_term(&Some(" flood ".into())).as_deref(), Some("%flood%"));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter::<Urgency>("urgency", &None).unwrap(), None);
        assert_eq!(
            parse_filter::<Urgency>("urgency", &Some("all".into())).unwrap(),
            None
        );
        assert_eq!(
            parse_filter::<Urgency>("urgency", &Some("High".into())).unwrap(),
            Some(Urgency::High)
        );
        assert!(parse_filter::<Urgency>("urgency", &Some("Extreme".into())).is_err());
    }
}
