//! Fleet endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{Fleet, FleetList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List fleets.
pub async fn list_fleets(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<FleetList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.fleets.list(org.0, &params)?))
}

/// Create a fleet.
pub async fn create_fleet(
    State(state): State<AppState>,
    org: OrgId,
    Json(fleet): Json<Fleet>,
) -> Result<(StatusCode, Json<Fleet>), ApiError> {
    let created = state.store.fleets.create(org.0, &fleet)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a fleet by name.
pub async fn get_fleet(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<Fleet>, ApiError> {
    Ok(Json(state.store.fleets.get(org.0, &name)?))
}

/// Replace a fleet, creating it when absent.
pub async fn replace_fleet(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut fleet): Json<Fleet>,
) -> Result<(StatusCode, Json<Fleet>), ApiError> {
    reconcile_name(&mut fleet.metadata, &name)?;
    let (fleet, created) =
        state
            .store
            .fleets
            .create_or_update(org.0, &fleet, &UpdateOptions::api(), None)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(fleet)))
}

/// Delete a fleet. Deleting a fleet that does not exist succeeds.
pub async fn delete_fleet(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.fleets.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of a fleet, refreshing its device count.
pub async fn replace_fleet_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut fleet): Json<Fleet>,
) -> Result<Json<Fleet>, ApiError> {
    reconcile_name(&mut fleet.metadata, &name)?;
    if let Some(status) = fleet.status.as_mut() {
        status.device_count = Some(state.store.fleets.device_count(org.0, &name)?);
    }
    Ok(Json(state.store.fleets.update_status(org.0, &fleet)?))
}
