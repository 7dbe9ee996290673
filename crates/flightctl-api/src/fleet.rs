//! Fleet resource types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::device::DeviceSpec;
use crate::meta::{Condition, ListMeta, ObjectMeta};

/// A group of devices managed through a shared template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    /// Common resource metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<FleetSpec>,
    /// Observed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FleetStatus>,
}

/// Desired state of a fleet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSpec {
    /// Label selector matching the devices belonging to this fleet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
    /// Template applied to every matching device.
    pub template: DeviceTemplate,
}

/// Equality-based label selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Labels a device must carry to match.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// The device template a fleet stamps onto its members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTemplate {
    /// Labels applied to rendered devices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    /// The device spec rendered for each member.
    pub spec: DeviceSpec,
}

/// Observed state of a fleet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStatus {
    /// Conditions reported for the fleet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Number of devices currently owned by the fleet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_count: Option<i64>,
}

/// A page of fleets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetList {
    /// Fleets in this page.
    pub items: Vec<Fleet>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
