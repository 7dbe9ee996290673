//! Certificate signing request endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{CertificateSigningRequest, CertificateSigningRequestList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List certificate signing requests.
pub async fn list_certificate_signing_requests(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<CertificateSigningRequestList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(
        state
            .store
            .certificate_signing_requests
            .list(org.0, &params)?,
    ))
}

/// Create a certificate signing request.
pub async fn create_certificate_signing_request(
    State(state): State<AppState>,
    org: OrgId,
    Json(csr): Json<CertificateSigningRequest>,
) -> Result<(StatusCode, Json<CertificateSigningRequest>), ApiError> {
    let created = state.store.certificate_signing_requests.create(org.0, &csr)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a certificate signing request by name.
pub async fn get_certificate_signing_request(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<CertificateSigningRequest>, ApiError> {
    Ok(Json(
        state.store.certificate_signing_requests.get(org.0, &name)?,
    ))
}

/// Replace a certificate signing request, creating it when absent.
pub async fn replace_certificate_signing_request(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut csr): Json<CertificateSigningRequest>,
) -> Result<(StatusCode, Json<CertificateSigningRequest>), ApiError> {
    reconcile_name(&mut csr.metadata, &name)?;
    let (csr, created) = state.store.certificate_signing_requests.create_or_update(
        org.0,
        &csr,
        &UpdateOptions::api(),
    )?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(csr)))
}

/// Delete a certificate signing request. Deleting one that does not exist
/// succeeds.
pub async fn delete_certificate_signing_request(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.certificate_signing_requests.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of a certificate signing request.
pub async fn replace_certificate_signing_request_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut csr): Json<CertificateSigningRequest>,
) -> Result<Json<CertificateSigningRequest>, ApiError> {
    reconcile_name(&mut csr.metadata, &name)?;
    Ok(Json(
        state
            .store
            .certificate_signing_requests
            .update_status(org.0, &csr)?,
    ))
}
