//! Template version resource types.

use serde::{Deserialize, Serialize};

use crate::device::DeviceSpec;
use crate::meta::{Condition, ListMeta, ObjectMeta};

/// An immutable snapshot of a fleet's template.
///
/// Template versions may briefly exist as placeholder rows (no spec) while
/// referenced ahead of being rendered; placeholders are invisible to reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    /// Common resource metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<TemplateVersionSpec>,
    /// Observed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TemplateVersionStatus>,
}

/// Desired state of a template version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVersionSpec {
    /// The fleet this version was snapshotted from.
    pub fleet: String,
    /// The rendered device spec at snapshot time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_spec: Option<DeviceSpec>,
}

/// Observed state of a template version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVersionStatus {
    /// Conditions reported for the version.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A page of template versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersionList {
    /// Template versions in this page.
    pub items: Vec<TemplateVersion>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
