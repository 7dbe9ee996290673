//! Device storage model.

use flightctl_api::{Device, DeviceList, DeviceSpec, DeviceStatus, ListMeta};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `devices` table.
pub enum DeviceKind {}

impl KindDef for DeviceKind {
    const KIND: Kind = Kind::Device;
    const TABLE: &'static str = "devices";
    type Spec = DeviceSpec;
    type Status = DeviceStatus;
}

/// A stored device row.
pub type DeviceRecord = Record<DeviceKind>;

/// Convert an API device into its storage record.
pub fn from_api(resource: &Device) -> Result<DeviceRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API device.
pub fn to_api(record: DeviceRecord) -> Result<Device> {
    Ok(Device {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<DeviceRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<DeviceList> {
    Ok(DeviceList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
