//! Auth provider endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{AuthProvider, AuthProviderList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List auth providers.
pub async fn list_auth_providers(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<AuthProviderList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.auth_providers.list(org.0, &params)?))
}

/// Create an auth provider.
pub async fn create_auth_provider(
    State(state): State<AppState>,
    org: OrgId,
    Json(provider): Json<AuthProvider>,
) -> Result<(StatusCode, Json<AuthProvider>), ApiError> {
    let created = state.store.auth_providers.create(org.0, &provider)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get an auth provider by name.
pub async fn get_auth_provider(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<AuthProvider>, ApiError> {
    Ok(Json(state.store.auth_providers.get(org.0, &name)?))
}

/// Replace an auth provider, creating it when absent.
pub async fn replace_auth_provider(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut provider): Json<AuthProvider>,
) -> Result<(StatusCode, Json<AuthProvider>), ApiError> {
    reconcile_name(&mut provider.metadata, &name)?;
    let (provider, created) =
        state
            .store
            .auth_providers
            .create_or_update(org.0, &provider, &UpdateOptions::api())?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(provider)))
}

/// Delete an auth provider. Deleting one that does not exist succeeds.
pub async fn delete_auth_provider(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.auth_providers.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of an auth provider.
pub async fn replace_auth_provider_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut provider): Json<AuthProvider>,
) -> Result<Json<AuthProvider>, ApiError> {
    reconcile_name(&mut provider.metadata, &name)?;
    Ok(Json(
        state.store.auth_providers.update_status(org.0, &provider)?,
    ))
}
