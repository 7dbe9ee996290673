//! Device resource types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meta::{Condition, ListMeta, ObjectMeta};

/// A managed edge device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Common resource metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<DeviceSpec>,
    /// Observed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
}

/// Desired state of a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSpec {
    /// Boot image reference the device should run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_image: Option<String>,
    /// Configuration files projected onto the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Vec<ConfigItem>>,
}

/// A single configuration file entry in a device spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigItem {
    /// Name identifying the config entry.
    pub name: String,
    /// Target path on the device.
    pub path: String,
    /// Inline file content.
    pub content: String,
}

/// Observed state of a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// Conditions reported for the device.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Boot image the device currently runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_image: Option<String>,
    /// When the device last reported in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// A page of devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceList {
    /// Devices in this page.
    pub items: Vec<Device>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
