//! Organization endpoints. Organizations are provisioned out of band; the
//! public surface is read-only.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use flightctl_api::{Organization, OrganizationList};

use crate::error::ApiError;
use crate::state::AppState;

/// List organizations.
pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<OrganizationList>, ApiError> {
    Ok(Json(state.store.organizations.list()?))
}

/// Get an organization by id.
pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Organization>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid organization id: {id}")))?;
    Ok(Json(state.store.organizations.get(id)?))
}
