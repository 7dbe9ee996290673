//! Catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use flightctl_api::{Catalog, CatalogList};
use flightctl_store::UpdateOptions;

use crate::error::ApiError;
use crate::handlers::common::{reconcile_name, ListQuery, OrgId};
use crate::state::AppState;

/// List catalogs.
pub async fn list_catalogs(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<CatalogList>, ApiError> {
    let params = query.into_list_params()?;
    Ok(Json(state.store.catalogs.list(org.0, &params)?))
}

/// Create a catalog.
pub async fn create_catalog(
    State(state): State<AppState>,
    org: OrgId,
    Json(catalog): Json<Catalog>,
) -> Result<(StatusCode, Json<Catalog>), ApiError> {
    let created = state.store.catalogs.create(org.0, &catalog)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a catalog by name.
pub async fn get_catalog(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<Json<Catalog>, ApiError> {
    Ok(Json(state.store.catalogs.get(org.0, &name)?))
}

/// Replace a catalog, creating it when absent.
pub async fn replace_catalog(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut catalog): Json<Catalog>,
) -> Result<(StatusCode, Json<Catalog>), ApiError> {
    reconcile_name(&mut catalog.metadata, &name)?;
    let (catalog, created) =
        state
            .store
            .catalogs
            .create_or_update(org.0, &catalog, &UpdateOptions::api())?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(catalog)))
}

/// Delete a catalog. Deleting one that does not exist succeeds.
pub async fn delete_catalog(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.catalogs.delete(org.0, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the reported status of a catalog.
pub async fn replace_catalog_status(
    State(state): State<AppState>,
    org: OrgId,
    Path(name): Path<String>,
    Json(mut catalog): Json<Catalog>,
) -> Result<Json<Catalog>, ApiError> {
    reconcile_name(&mut catalog.metadata, &name)?;
    Ok(Json(state.store.catalogs.update_status(org.0, &catalog)?))
}
