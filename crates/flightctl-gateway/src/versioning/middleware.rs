//! HTTP middleware running version negotiation.
//!
//! On acceptance the negotiated version travels in the request extensions
//! for the dispatcher, and the response carries the version, a `Vary`
//! marker and, for deprecated versions, an RFC 8594 `Deprecation` header.
//! On rejection the response is a 406 listing the endpoint's supported
//! versions. The supported-versions header appears only on rejection.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use flightctl_api::ApiStatus;

use super::negotiate::VersionRegistry;
use super::{API_VERSION_HEADER, DEPRECATION_HEADER, SUPPORTED_VERSIONS_HEADER};

/// The display casing of the version header, used as the `Vary` value.
const API_VERSION_HEADER_NAME: &str = "Flightctl-API-Version";

/// Negotiate the API version for a request.
pub async fn negotiate_api_version(
    State(registry): State<Arc<VersionRegistry>>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = request
        .headers()
        .get(&API_VERSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string);
    let path = request.uri().path().to_string();

    match registry.negotiate(requested.as_deref(), &path) {
        Ok(negotiated) => {
            request.extensions_mut().insert(negotiated.clone());
            let mut response = next.run(request).await;

            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&negotiated.version) {
                headers.insert(API_VERSION_HEADER, value);
            }
            headers.append(
                header::VARY,
                HeaderValue::from_static(API_VERSION_HEADER_NAME),
            );
            if let Some(at) = negotiated.deprecated_at {
                if let Ok(value) = HeaderValue::from_str(&format!("@{}", at.timestamp())) {
                    headers.insert(DEPRECATION_HEADER, value);
                }
            }
            response
        }
        Err(rejection) => {
            let supported = rejection.supported.join(", ");
            tracing::debug!(
                requested = requested.as_deref().unwrap_or(""),
                path,
                supported,
                "rejecting unsupported API version"
            );

            let mut response = (
                StatusCode::NOT_ACCEPTABLE,
                Json(ApiStatus::failure(format!(
                    "requested API version is not supported; supported versions: {supported}"
                ))),
            )
                .into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&supported) {
                headers.insert(SUPPORTED_VERSIONS_HEADER, value);
            }
            headers.append(
                header::VARY,
                HeaderValue::from_static(API_VERSION_HEADER_NAME),
            );
            response
        }
    }
}
