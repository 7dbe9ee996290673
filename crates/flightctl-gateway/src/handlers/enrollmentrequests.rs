//! Enrollment request endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{EnrollmentRequest, EnrollmentRequestList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List enrollment requests.
pub async fn list_enrollment_requests(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<EnrollmentRequestList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.enrollment_requests.list(org.0, &params)?))
}

/// Create an enrollment request.
pub async fn create_enrollment_request(
    State(state): State<AppState>,
    org: OrgId,
    Json(request): Json<EnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentRequest>), ApiError> {
    let created = state.store.enrollment_requests.create(org.0, &request)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get an enrollment request by name.
pub async fn get_enrollment_request(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<EnrollmentRequest>, ApiError> {
    Ok(Json(state.store.enrollment_requests.get(org.0, &name)?))
}

/// Replace an enrollment request, creating it when absent.
pub async fn replace_enrollment_request(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut request): Json<EnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentRequest>), ApiError> {
    reconcile_name(&mut request.metadata, &name)?;
    let (request, created) = state.store.enrollment_requests.create_or_update(
        org.0,
        &request,
        &UpdateOptions::api(),
    )?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(request)))
}

/// Delete an enrollment request. Deleting one that does not exist
/// succeeds.
pub async fn delete_enrollment_request(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.enrollment_requests.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of an enrollment request.
pub async fn replace_enrollment_request_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut request): Json<EnrollmentRequest>,
) -> Result<Json<EnrollmentRequest>, ApiError> {
    reconcile_name(&mut request.metadata, &name)?;
    Ok(Json(
        state.store.enrollment_requests.update_status(org.0, &request)?,
    ))
}
