//! Dispatch to the router serving the negotiated API version.
//!
//! A request without a negotiated version in its extensions goes to the
//! fallback router. A negotiated version with no matching router is an
//! internal consistency failure and answers 500; it must never silently
//! fall back to a different API contract.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use thiserror::Error;
use tower::util::ServiceExt;
use tower::Service;

use flightctl_api::ApiStatus;

use super::negotiate::NegotiatedVersion;

/// Construction error: the designated fallback version has no router.
/// Detected at startup rather than at request time.
#[derive(Debug, Error)]
#[error("no router registered for fallback API version {0}")]
pub struct MissingFallbackRouter(pub String);

/// Routes requests to version-specific routers.
#[derive(Clone, Debug)]
pub struct VersionDispatcher {
    routers: Arc<HashMap<String, Router>>,
    fallback: String,
}

impl VersionDispatcher {
    /// Build a dispatcher over the given version routers.
    ///
    /// # Errors
    ///
    /// Returns [`MissingFallbackRouter`] when no router is registered for
    /// the fallback version.
    pub fn new(
        fallback: impl Into<String>,
        routers: HashMap<String, Router>,
    ) -> Result<Self, MissingFallbackRouter> {
        let fallback = fallback.into();
        if !routers.contains_key(&fallback) {
            return Err(MissingFallbackRouter(fallback));
        }
        Ok(Self {
            routers: Arc::new(routers),
            fallback,
        })
    }
}

impl Service<Request> for VersionDispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let version = request
            .extensions()
            .get::<NegotiatedVersion>()
            .map_or_else(|| self.fallback.clone(), |v| v.version.clone());

        match self.routers.get(&version).cloned() {
            Some(router) => Box::pin(async move {
                match router.oneshot(request).await {
                    Ok(response) => Ok(response),
                    Err(never) => match never {},
                }
            }),
            None => {
                tracing::error!(version, "negotiated API version has no registered router");
                let response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiStatus::failure(format!(
                        "no router registered for API version {version}"
                    ))),
                )
                    .into_response();
                Box::pin(std::future::ready(Ok(response)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::routing::get;

    use super::*;

    fn dispatcher() -> VersionDispatcher {
        let mut routers = HashMap::new();
        routers.insert(
            "v1beta1".to_string(),
            Router::new().route("/ping", get(|| async { "beta" })),
        );
        routers.insert(
            "v1".to_string(),
            Router::new().route("/ping", get(|| async { "v1" })),
        );
        VersionDispatcher::new("v1beta1", routers).unwrap()
    }

    fn request(version: Option<&str>) -> Request {
        let mut request = axum::http::Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .unwrap();
        if let Some(version) = version {
            request.extensions_mut().insert(NegotiatedVersion {
                version: version.to_string(),
                deprecated_at: None,
            });
        }
        request
    }

    #[tokio::test]
    async fn no_negotiated_version_uses_fallback_router() {
        let response = dispatcher().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn negotiated_version_routes_to_its_router() {
        let response = dispatcher().oneshot(request(Some("v1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_router_fails_loudly() {
        let response = dispatcher().oneshot(request(Some("v9"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_fallback_router_is_a_construction_error() {
        let mut routers = HashMap::new();
        routers.insert("v1".to_string(), Router::new());
        let err = VersionDispatcher::new("v1beta1", routers).unwrap_err();
        assert_eq!(err.0, "v1beta1");
    }
}
