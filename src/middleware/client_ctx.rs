use crate::orm::users::{self, Status};
use crate::tenant::TenantScope;
use crate::web::error::ApiError;
use actix_web::dev::{
    self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone, Debug, Default)]
pub struct ClientCtxInner {
    /// User data. Optional. None is a guest user.
    pub client: Option<users::Model>,
    /// Bearer token presented with the request, if it resolved to a user.
    pub token: Option<String>,
}

impl ClientCtxInner {
    /// Resolves a bearer token. Unknown tokens and accounts that are not
    /// active leave the request as a guest.
    pub async fn from_bearer(db: &DatabaseConnection, token: Option<String>) -> Self {
        let token = match token {
            Some(token) => token,
            None => return Self::default(),
        };

        match crate::session::authenticate_token(db, &token).await {
            Ok(Some(user)) if user.status == Status::Active => ClientCtxInner {
                client: Some(user),
                token: Some(token),
                ..Default::default()
            },
            Ok(Some(user)) => {
                log::debug!(
                    "Token for user {} ignored; account is {:?}",
                    user.id,
                    user.status
                );
                Self::default()
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::error!("Unable to authenticate bearer token: {}", e);
                Self::default()
            }
        }
    }
}

/// Value of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            // Existing record in extensions; pull it and return clone.
            Some(cbox) => Self(cbox.clone()),
            // No existing record; create and insert it.
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    pub fn get_user(&self) -> Option<&users::Model> {
        self.0.client.as_ref()
    }

    pub fn get_token(&self) -> Option<&str> {
        self.0.token.as_deref()
    }

    pub fn is_super_admin(&self) -> bool {
        self.get_user().map_or(false, |u| u.is_super_admin())
    }

    /// Tenant the caller reads by default.
    pub fn scope(&self) -> TenantScope {
        TenantScope::for_user(self.get_user())
    }

    /// Whether the caller may moderate rows belonging to `partner_id`.
    pub fn can_moderate(&self, partner_id: Option<i32>) -> bool {
        match self.get_user() {
            Some(user) => user.is_super_admin() || user.administers(partner_id),
            None => false,
        }
    }

    /// Require user to be logged in.
    pub fn require_login(&self) -> Result<&users::Model, ApiError> {
        self.get_user().ok_or(ApiError::Unauthenticated)
    }

    pub fn require_super_admin(&self) -> Result<&users::Model, ApiError> {
        let user = self.require_login()?;
        if !user.is_super_admin() {
            return Err(ApiError::forbidden());
        }
        Ok(user)
    }

    /// Require a partner admin. Returns the user and the partner they run.
    pub fn require_partner_admin(&self) -> Result<(&users::Model, i32), ApiError> {
        let user = self.require_login()?;
        if !user.is_partner_admin() {
            return Err(ApiError::forbidden());
        }
        match user.partner_id {
            Some(partner_id) => Ok((user, partner_id)),
            None => Err(ApiError::Forbidden(
                "User does not belong to a partner.".to_string(),
            )),
        }
    }
}

/// Provides the `client: ClientCtx` parameter of route functions.
impl FromRequest for ClientCtx {
    /// The associated error which can be returned.
    type Error = Error;
    /// Future that resolves to a Self.
    type Future = Ready<Result<Self, Self::Error>>;

    /// Create a Self from request parts asynchronously.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let token = bearer_token(req.request());

        // Without a database there is no client to resolve; the request
        // continues as a guest.
        Box::pin(async move {
            if let Some(db) = req.app_data::<Data<DatabaseConnection>>() {
                let db = db.clone();
                let inner = ClientCtxInner::from_bearer(&db, token).await;
                req.extensions_mut().insert(Data::new(inner));
            } else {
                log::error!("ClientCtx: database connection is not registered as app data.");
            }

            svc.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer 3|abcdef"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("3|abcdef"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "bearer   7|xyz  "))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("7|xyz"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_guest_context() {
        let client = ClientCtx::default();
        assert!(client.get_user().is_none());
        assert_eq!(client.scope(), TenantScope::Global);
        assert!(matches!(client.require_login(), Err(ApiError::Unauthenticated)));
        assert!(!client.can_moderate(Some(1)));
    }
}
