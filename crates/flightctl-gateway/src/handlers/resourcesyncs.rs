//! Resource sync endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{ResourceSync, ResourceSyncList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List resource syncs.
pub async fn list_resource_syncs(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<ResourceSyncList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.resource_syncs.list(org.0, &params)?))
}

/// Create a resource sync.
pub async fn create_resource_sync(
    State(state): State<AppState>,
    org: OrgId,
    Json(sync): Json<ResourceSync>,
) -> Result<(StatusCode, Json<ResourceSync>), ApiError> {
    let created = state.store.resource_syncs.create(org.0, &sync)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a resource sync by name.
pub async fn get_resource_sync(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<ResourceSync>, ApiError> {
    Ok(Json(state.store.resource_syncs.get(org.0, &name)?))
}

/// Replace a resource sync, creating it when absent.
pub async fn replace_resource_sync(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut sync): Json<ResourceSync>,
) -> Result<(StatusCode, Json<ResourceSync>), ApiError> {
    reconcile_name(&mut sync.metadata, &name)?;
    let (sync, created) =
        state
            .store
            .resource_syncs
            .create_or_update(org.0, &sync, &UpdateOptions::api())?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(sync)))
}

/// Delete a resource sync, releasing every resource it owns. Deleting one
/// that does not exist succeeds.
pub async fn delete_resource_sync(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_resource_sync(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of a resource sync.
pub async fn replace_resource_sync_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut sync): Json<ResourceSync>,
) -> Result<Json<ResourceSync>, ApiError> {
    reconcile_name(&mut sync.metadata, &name)?;
    Ok(Json(state.store.resource_syncs.update_status(org.0, &sync)?))
}
