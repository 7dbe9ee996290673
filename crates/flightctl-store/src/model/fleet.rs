//! Fleet storage model.

use flightctl_api::{Fleet, FleetList, FleetSpec, FleetStatus, ListMeta};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `fleets` table.
pub enum FleetKind {}

impl KindDef for FleetKind {
    const KIND: Kind = Kind::Fleet;
    const TABLE: &'static str = "fleets";
    type Spec = FleetSpec;
    type Status = FleetStatus;
}

/// A stored fleet row.
pub type FleetRecord = Record<FleetKind>;

/// Convert an API fleet into its storage record.
pub fn from_api(resource: &Fleet) -> Result<FleetRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API fleet.
pub fn to_api(record: FleetRecord) -> Result<Fleet> {
    Ok(Fleet {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<FleetRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<FleetList> {
    Ok(FleetList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
