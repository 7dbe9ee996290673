//! Event endpoints. Events are produced by the system; the public surface
//! lists them in creation order.

use axum::extract::{Query, State};
use axum::Json;

use flightctl_api::EventList;
use flightctl_store::EventStore;

use crate::error::ApiError;
use crate::handlers::common::{ListQuery, OrgId};
use crate::state::AppState;

/// List events in creation order.
pub async fn list_events(
    State(state): State<AppState>,
    org: OrgId,
    Query(query): Query<ListQuery>,
) -> Result<Json<EventList>, ApiError> {
    let params = query.into_list_params()?;
    let params = EventStore::list_params(params.limit, params.cont);
    Ok(Json(state.store.events.list(org.0, &params)?))
}
