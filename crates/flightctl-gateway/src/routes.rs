//! Router assembly.
//!
//! The version-negotiation middleware wraps a [`VersionDispatcher`] over
//! one router per API version: `v1beta1` serves the full surface and `v1`
//! serves the device endpoints only, with a deprecation date announced to
//! clients that negotiate it. The health route sits outside negotiation.

use std::collections::HashMap;
use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use chrono::DateTime;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::handlers::{
    authproviders, catalogs, certificatesigningrequests, devices, enrollmentrequests, events,
    fleets, health, organizations, repositories, resourcesyncs, templateversions,
};
use crate::state::AppState;
use crate::versioning::{
    negotiate_api_version, EndpointVersions, MissingFallbackRouter, SupportedVersion,
    VersionDispatcher, VersionRegistry,
};

/// The fallback (and newest) API version.
pub const V1BETA1: &str = "v1beta1";
/// The older API version, kept alive for the device endpoints while
/// clients migrate.
pub const V1: &str = "v1";

/// When the `v1` device endpoints were deprecated (2026-03-01T00:00:00Z).
const V1_SUNSET_EPOCH: i64 = 1_772_323_200;

/// Endpoint version metadata matching the routers built by
/// [`build_router`].
#[must_use]
pub fn default_registry() -> VersionRegistry {
    let mut registry = VersionRegistry::new(V1BETA1);

    let mut device_versions = vec![SupportedVersion::new(V1BETA1)];
    let mut v1 = SupportedVersion::new(V1);
    if let Some(sunset) = DateTime::from_timestamp(V1_SUNSET_EPOCH, 0) {
        v1 = v1.deprecated_at(sunset);
    }
    device_versions.push(v1);

    for pattern in [
        "/api/v1/devices",
        "/api/v1/devices/{name}",
        "/api/v1/devices/{name}/status",
    ] {
        registry.register(pattern, EndpointVersions::new(device_versions.clone()));
    }
    registry
}

/// Create the full application router with all middleware.
///
/// # Errors
///
/// Returns [`MissingFallbackRouter`] if the version routers do not cover
/// the fallback version; this is a startup-time configuration error.
pub fn build_router(
    state: AppState,
    config: &GatewayConfig,
) -> Result<Router, MissingFallbackRouter> {
    let registry = Arc::new(default_registry());

    let mut routers = HashMap::new();
    routers.insert(V1BETA1.to_string(), api_routes(state.clone()));
    routers.insert(V1.to_string(), device_routes(state));
    let dispatcher = VersionDispatcher::new(V1BETA1, routers)?;

    let versioned = ServiceBuilder::new()
        .layer(from_fn_with_state(registry, negotiate_api_version))
        .service(dispatcher);

    Ok(Router::new()
        .route("/health", get(health::health))
        .fallback_service(versioned)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.cors_origins))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout())))
}

/// The device endpoints, served by both API versions.
fn device_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route(
            "/api/v1/devices/{name}",
            get(devices::get_device)
                .put(devices::replace_device)
                .delete(devices::delete_device),
        )
        .route(
            "/api/v1/devices/{name}/status",
            axum::routing::put(devices::replace_device_status),
        )
        .with_state(state)
}

/// The full `v1beta1` surface.
fn api_routes(state: AppState) -> Router {
    device_routes(state.clone()).merge(
        Router::new()
            .route(
                "/api/v1/fleets",
                get(fleets::list_fleets).post(fleets::create_fleet),
            )
            .route(
                "/api/v1/fleets/{name}",
                get(fleets::get_fleet)
                    .put(fleets::replace_fleet)
                    .delete(fleets::delete_fleet),
            )
            .route(
                "/api/v1/fleets/{name}/status",
                axum::routing::put(fleets::replace_fleet_status),
            )
            .route(
                "/api/v1/enrollmentrequests",
                get(enrollmentrequests::list_enrollment_requests)
                    .post(enrollmentrequests::create_enrollment_request),
            )
            .route(
                "/api/v1/enrollmentrequests/{name}",
                get(enrollmentrequests::get_enrollment_request)
                    .put(enrollmentrequests::replace_enrollment_request)
                    .delete(enrollmentrequests::delete_enrollment_request),
            )
            .route(
                "/api/v1/enrollmentrequests/{name}/status",
                axum::routing::put(enrollmentrequests::replace_enrollment_request_status),
            )
            .route(
                "/api/v1/repositories",
                get(repositories::list_repositories).post(repositories::create_repository),
            )
            .route(
                "/api/v1/repositories/{name}",
                get(repositories::get_repository)
                    .put(repositories::replace_repository)
                    .delete(repositories::delete_repository),
            )
            .route(
                "/api/v1/repositories/{name}/status",
                axum::routing::put(repositories::replace_repository_status),
            )
            .route(
                "/api/v1/resourcesyncs",
                get(resourcesyncs::list_resource_syncs).post(resourcesyncs::create_resource_sync),
            )
            .route(
                "/api/v1/resourcesyncs/{name}",
                get(resourcesyncs::get_resource_sync)
                    .put(resourcesyncs::replace_resource_sync)
                    .delete(resourcesyncs::delete_resource_sync),
            )
            .route(
                "/api/v1/resourcesyncs/{name}/status",
                axum::routing::put(resourcesyncs::replace_resource_sync_status),
            )
            .route(
                "/api/v1/templateversions",
                get(templateversions::list_template_versions),
            )
            .route(
                "/api/v1/templateversions/{name}",
                get(templateversions::get_template_version)
                    .delete(templateversions::delete_template_version),
            )
            .route(
                "/api/v1/authproviders",
                get(authproviders::list_auth_providers).post(authproviders::create_auth_provider),
            )
            .route(
                "/api/v1/authproviders/{name}",
                get(authproviders::get_auth_provider)
                    .put(authproviders::replace_auth_provider)
                    .delete(authproviders::delete_auth_provider),
            )
            .route(
                "/api/v1/authproviders/{name}/status",
                axum::routing::put(authproviders::replace_auth_provider_status),
            )
            .route(
                "/api/v1/certificatesigningrequests",
                get(certificatesigningrequests::list_certificate_signing_requests)
                    .post(certificatesigningrequests::create_certificate_signing_request),
            )
            .route(
                "/api/v1/certificatesigningrequests/{name}",
                get(certificatesigningrequests::get_certificate_signing_request)
                    .put(certificatesigningrequests::replace_certificate_signing_request)
                    .delete(certificatesigningrequests::delete_certificate_signing_request),
            )
            .route(
                "/api/v1/certificatesigningrequests/{name}/status",
                axum::routing::put(
                    certificatesigningrequests::replace_certificate_signing_request_status,
                ),
            )
            .route(
                "/api/v1/catalogs",
                get(catalogs::list_catalogs).post(catalogs::create_catalog),
            )
            .route(
                "/api/v1/catalogs/{name}",
                get(catalogs::get_catalog)
                    .put(catalogs::replace_catalog)
                    .delete(catalogs::delete_catalog),
            )
            .route(
                "/api/v1/catalogs/{name}/status",
                axum::routing::put(catalogs::replace_catalog_status),
            )
            .route("/api/v1/events", get(events::list_events))
            .route(
                "/api/v1/organizations",
                get(organizations::list_organizations),
            )
            .route(
                "/api/v1/organizations/{id}",
                get(organizations::get_organization),
            )
            .with_state(state),
    )
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_device_endpoints_only() {
        let registry = default_registry();
        assert!(registry.endpoint("/api/v1/devices").is_some());
        assert!(registry.endpoint("/api/v1/devices/dev-1").is_some());
        assert!(registry.endpoint("/api/v1/devices/dev-1/status").is_some());
        assert!(registry.endpoint("/api/v1/fleets").is_none());
    }

    #[test]
    fn v1beta1_is_most_preferred_for_devices() {
        let registry = default_registry();
        let negotiated = registry.negotiate(None, "/api/v1/devices").unwrap();
        assert_eq!(negotiated.version, V1BETA1);
        assert_eq!(negotiated.deprecated_at, None);

        let negotiated = registry.negotiate(Some(V1), "/api/v1/devices").unwrap();
        assert!(negotiated.deprecated_at.is_some());
    }
}
