//! Health endpoint, outside version negotiation.

use axum::Json;
use serde::Serialize;

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
}

/// Report process liveness.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
