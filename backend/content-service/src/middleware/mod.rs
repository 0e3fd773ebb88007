/// HTTP middleware for content-service
///
/// Every `/api/v1` route except health runs behind [`IdentityAuth`], which
/// resolves the caller's credential through the identity service before any
/// handler (and therefore any store access) runs.
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::clients::{ClientError, IdentityVerifier};
use crate::error::AppError;

/// Query string accepted in place of the Authorization header. Browsers
/// cannot set headers on a WebSocket handshake.
#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

// =====================================================================
// Identity authentication
// =====================================================================

/// Verified caller identity stored in request extensions after auth.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

/// Actix middleware that resolves a bearer credential to an identity.
#[derive(Clone)]
pub struct IdentityAuth {
    verifier: Arc<dyn IdentityVerifier>,
}

impl IdentityAuth {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityAuthService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct IdentityAuthService<S> {
    service: Rc<S>,
    verifier: Arc<dyn IdentityVerifier>,
}

fn bearer_credential(req: &ServiceRequest) -> Option<String> {
    if let Some(header) = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        return header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }

    query_credential(req.query_string())
}

/// Percent-decoded `access_token` from a raw query string.
fn query_credential(query: &str) -> Option<String> {
    web::Query::<TokenQuery>::from_query(query)
        .ok()?
        .into_inner()
        .access_token
        .filter(|t| !t.is_empty())
}

impl<S, B> Service<ServiceRequest> for IdentityAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let Some(credential) = bearer_credential(&req) else {
                return Ok(req.error_response(AppError::Unauthorized(
                    "Missing bearer credential".to_string(),
                )));
            };

            let started = Instant::now();
            let identity = match verifier.verify(&credential).await {
                Ok(identity) => identity,
                Err(ClientError::Rejected) => {
                    return Ok(req.error_response(AppError::Unauthorized(
                        "Invalid or expired token".to_string(),
                    )))
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Identity verification failed"
                    );
                    return Ok(req.error_response(AppError::Unauthorized(
                        "Credential could not be verified".to_string(),
                    )));
                }
            };

            req.extensions_mut().insert(UserId(identity));
            let res = service.call(req).await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| AppError::Unauthorized("User ID missing".to_string()).into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_credential_is_percent_decoded() {
        assert_eq!(
            query_credential("access_token=abc%2Bdef%2Fghi%3D%3D").as_deref(),
            Some("abc+def/ghi==")
        );
    }

    #[test]
    fn test_query_credential_among_other_params() {
        assert_eq!(
            query_credential("since=10&access_token=tok&limit=5").as_deref(),
            Some("tok")
        );
    }

    #[test]
    fn test_query_credential_missing_or_empty() {
        assert_eq!(query_credential(""), None);
        assert_eq!(query_credential("access_token="), None);
        assert_eq!(query_credential("other=1"), None);
    }
}
