//! Device endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{Device, DeviceList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List devices.
pub async fn list_devices(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<DeviceList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.devices.list(org.0, &params)?))
}

/// Create a device.
pub async fn create_device(
    State(state): State<AppState>,
    org: OrgId,
    Json(device): Json<Device>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let created = state.store.devices.create(org.0, &device)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a device by name.
pub async fn get_device(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.store.devices.get(org.0, &name)?))
}

/// Replace a device, creating it when absent.
pub async fn replace_device(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut device): Json<Device>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    reconcile_name(&mut device.metadata, &name)?;
    let (device, created) =
        state
            .store
            .devices
            .create_or_update(org.0, &device, &UpdateOptions::api())?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(device)))
}

/// Delete a device. Deleting a device that does not exist succeeds.
pub async fn delete_device(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.devices.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of a device.
pub async fn replace_device_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut device): Json<Device>,
) -> Result<Json<Device>, ApiError> {
    reconcile_name(&mut device.metadata, &name)?;
    Ok(Json(state.store.devices.update_status(org.0, &device)?))
}
