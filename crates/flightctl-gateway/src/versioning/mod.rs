//! Per-endpoint API version negotiation.
//!
//! Incoming requests are matched against a registry of endpoint version
//! metadata, negotiated to a concrete API version (or rejected with a 406),
//! and then dispatched to the router serving that version. The three pieces
//! are deliberately separate: [`VersionRegistry::negotiate`] is a pure
//! function, [`negotiate_api_version`] is the HTTP middleware around it,
//! and [`VersionDispatcher`] routes by the negotiated result.

pub mod dispatch;
pub mod middleware;
pub mod negotiate;

pub use dispatch::{MissingFallbackRouter, VersionDispatcher};
pub use middleware::negotiate_api_version;
pub use negotiate::{
    EndpointVersions, NegotiatedVersion, NotAcceptable, SupportedVersion, VersionRegistry,
};

use axum::http::HeaderName;

/// Request and success-response header carrying the API version. The wire
/// form is `Flightctl-API-Version` (header names are matched
/// case-insensitively).
pub const API_VERSION_HEADER: HeaderName = HeaderName::from_static("flightctl-api-version");

/// Rejection-response header listing every version the endpoint supports.
/// Never present on a successful response.
pub const SUPPORTED_VERSIONS_HEADER: HeaderName =
    HeaderName::from_static("flightctl-api-versions-supported");

/// RFC 8594 deprecation header, emitted as `@<unix-epoch-seconds>`.
pub const DEPRECATION_HEADER: HeaderName = HeaderName::from_static("deprecation");
