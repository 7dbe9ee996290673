//! HTTP API server for the flightctl control plane.
//!
//! Exposes the resource store over a Kubernetes-style REST API with
//! per-endpoint API-version negotiation:
//!
//! - [`versioning`]: version registry, negotiation middleware and the
//!   version dispatcher
//! - [`handlers`]: one REST handler module per resource kind
//! - [`routes`]: router assembly and the default version registry

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod versioning;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::{build_router, default_registry, V1, V1BETA1};
pub use state::AppState;
