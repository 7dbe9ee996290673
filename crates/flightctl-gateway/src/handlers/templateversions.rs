//! Template version endpoints.
//!
//! Template versions are rendered by the system, so the public surface is
//! read and delete only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{TemplateVersion, TemplateVersionList};

use crate::error::ApiError;
use crate::handlers::common::{ListQuery, OrgId};
use crate::state::AppState;

/// List template versions.
pub async fn list_template_versions(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<TemplateVersionList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.template_versions.list(org.0, &params)?))
}

/// Get a template version by name.
pub async fn get_template_version(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<TemplateVersion>, ApiError> {
    Ok(Json(state.store.template_versions.get(org.0, &name)?))
}

/// Delete a template version. Deleting one that does not exist succeeds.
pub async fn delete_template_version(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.template_versions.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}
