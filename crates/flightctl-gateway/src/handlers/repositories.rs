//! Repository endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{Repository, RepositoryList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List repositories.
pub async fn list_repositories(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<RepositoryList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.repositories.list(org.0, &params)?))
}

/// Create a repository.
pub async fn create_repository(
    State(state): State<AppState>,
    org: OrgId,
    Json(repository): Json<Repository>,
) -> Result<(StatusCode, Json<Repository>), ApiError> {
    let created = state.store.repositories.create(org.0, &repository)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a repository by name.
pub async fn get_repository(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<Repository>, ApiError> {
    Ok(Json(state.store.repositories.get(org.0, &name)?))
}

/// Replace a repository, creating it when absent.
pub async fn replace_repository(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut repository): Json<Repository>,
) -> Result<(StatusCode, Json<Repository>), ApiError> {
    reconcile_name(&mut repository.metadata, &name)?;
    let (repository, created) =
        state
            .store
            .repositories
            .create_or_update(org.0, &repository, &UpdateOptions::api())?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(repository)))
}

/// Delete a repository. Deleting one that does not exist succeeds.
pub async fn delete_repository(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.repositories.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of a repository.
pub async fn replace_repository_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut repository): Json<Repository>,
) -> Result<Json<Repository>, ApiError> {
    reconcile_name(&mut repository.metadata, &name)?;
    Ok(Json(
        state.store.repositories.update_status(org.0, &repository)?,
    ))
}
