/// HTTP middleware for post-service
///
/// `CredentialAuthMiddleware` resolves request credentials through the
/// configured `Authenticator` and stores the resulting `AuthorIdentity` in
/// request extensions. Handlers pull it back out with the `AuthorIdentity`
/// extractor (required) or `Option<AuthorIdentity>` (optional).
use crate::auth::{Authenticator, AuthorIdentity, Credentials};
use crate::error::AppError;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{http::header, web, Error, FromRequest, HttpMessage, HttpRequest};
use base64::{engine::general_purpose, Engine as _};
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

// =====================================================================
// Credential extraction
// =====================================================================

/// Legacy `?username=...&password=...` credentials
#[derive(Debug, Deserialize)]
struct CredentialParams {
    username: Option<String>,
    password: Option<String>,
}

/// Pull credentials from `Authorization: Basic`, falling back to query params.
///
/// `Ok(None)` means the request carried no credentials at all; a malformed
/// header is an error rather than an anonymous request.
pub fn extract_credentials(req: &HttpRequest) -> Result<Option<Credentials>, AppError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;
        return parse_basic_auth(value).map(Some);
    }

    let params = web::Query::<CredentialParams>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or(CredentialParams {
            username: None,
            password: None,
        });

    match (params.username, params.password) {
        (Some(username), Some(password)) => Ok(Some(Credentials { username, password })),
        (None, None) => Ok(None),
        _ => Err(AppError::Unauthorized(
            "username and password are both required".into(),
        )),
    }
}

fn parse_basic_auth(value: &str) -> Result<Credentials, AppError> {
    // Auth schemes are case-insensitive (RFC 7235).
    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
    }

    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::Unauthorized("Invalid Basic credentials".into()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AppError::Unauthorized("Invalid Basic credentials".into()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| AppError::Unauthorized("Invalid Basic credentials".into()))?;

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

// =====================================================================
// Authentication middleware
// =====================================================================

/// Actix middleware that authenticates requests carrying credentials.
///
/// Requests without credentials pass through anonymously; requests with
/// bad credentials are rejected with 401 before reaching a handler.
#[derive(Clone)]
pub struct CredentialAuthMiddleware {
    authenticator: Arc<dyn Authenticator>,
}

impl CredentialAuthMiddleware {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CredentialAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CredentialAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CredentialAuthMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct CredentialAuthMiddlewareService<S> {
    service: Rc<S>,
    authenticator: Arc<dyn Authenticator>,
}

impl<S, B> Service<ServiceRequest> for CredentialAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            match resolve_identity(&req, authenticator.as_ref()).await {
                Ok(Some(identity)) => {
                    tracing::debug!(author_id = identity.author_id, "request authenticated");
                    req.extensions_mut().insert(identity);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(error = %e, path = req.path(), "credentials rejected");
                    return Ok(req.error_response(e).map_into_right_body());
                }
            }

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

async fn resolve_identity(
    req: &ServiceRequest,
    authenticator: &dyn Authenticator,
) -> Result<Option<AuthorIdentity>, AppError> {
    match extract_credentials(req.request())? {
        Some(credentials) => authenticator.authenticate(&credentials).await.map(Some),
        None => Ok(None),
    }
}

impl FromRequest for AuthorIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthorIdentity>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("identity required".into()).into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn basic_header_is_preferred() {
        let encoded = general_purpose::STANDARD.encode("foo:foobar");
        let req = TestRequest::default()
            .uri("/api/v1/posts/recent?username=bar&password=barbar")
            .insert_header((header::AUTHORIZATION, format!("Basic {}", encoded)))
            .to_http_request();

        let credentials = extract_credentials(&req).unwrap().unwrap();
        assert_eq!(credentials.username, "foo");
        assert_eq!(credentials.password, "foobar");
    }

    #[test]
    fn query_params_are_accepted() {
        let req = TestRequest::default()
            .uri("/api/v1/posts/recent?username=foo&password=foobar")
            .to_http_request();

        let credentials = extract_credentials(&req).unwrap().unwrap();
        assert_eq!(credentials.username, "foo");
    }

    #[test]
    fn anonymous_request_has_no_credentials() {
        let req = TestRequest::default()
            .uri("/api/v1/posts/search?q=second")
            .to_http_request();

        assert!(extract_credentials(&req).unwrap().is_none());
    }

    #[test]
    fn partial_or_malformed_credentials_are_rejected() {
        let req = TestRequest::default()
            .uri("/api/v1/posts/recent?username=foo")
            .to_http_request();
        assert!(extract_credentials(&req).is_err());

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc"))
            .to_http_request();
        assert!(extract_credentials(&req).is_err());

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic !!!"))
            .to_http_request();
        assert!(extract_credentials(&req).is_err());
    }

    #[test]
    fn basic_scheme_is_case_insensitive() {
        let encoded = general_purpose::STANDARD.encode("foo:foobar");
        for scheme in ["basic", "BASIC", "bAsIc"] {
            let credentials = parse_basic_auth(&format!("{} {}", scheme, encoded)).unwrap();
            assert_eq!(credentials.username, "foo");
            assert_eq!(credentials.password, "foobar");
        }

        assert!(parse_basic_auth("Basicfoo").is_err());
        assert!(parse_basic_auth(&format!("Bearer {}", encoded)).is_err());
    }

    #[test]
    fn password_may_contain_colons() {
        let credentials = parse_basic_auth(&format!(
            "Basic {}",
            general_purpose::STANDARD.encode("foo:a:b")
        ))
        .unwrap();
        assert_eq!(credentials.password, "a:b");
    }
}
