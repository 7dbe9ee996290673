//! Resource sync storage model.

use flightctl_api::{
    ListMeta, ResourceSync, ResourceSyncList, ResourceSyncSpec, ResourceSyncStatus,
};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `resource_syncs` table.
pub enum ResourceSyncKind {}

impl KindDef for ResourceSyncKind {
    const KIND: Kind = Kind::ResourceSync;
    const TABLE: &'static str = "resource_syncs";
    type Spec = ResourceSyncSpec;
    type Status = ResourceSyncStatus;
}

/// A stored resource sync row.
pub type ResourceSyncRecord = Record<ResourceSyncKind>;

/// Convert an API resource sync into its storage record.
pub fn from_api(resource: &ResourceSync) -> Result<ResourceSyncRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API resource sync.
pub fn to_api(record: ResourceSyncRecord) -> Result<ResourceSync> {
    Ok(ResourceSync {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<ResourceSyncRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<ResourceSyncList> {
    Ok(ResourceSyncList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
