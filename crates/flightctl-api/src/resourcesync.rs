//! Resource sync resource types.

use serde::{Deserialize, Serialize};

use crate::meta::{Condition, ListMeta, ObjectMeta};

/// A declarative sync importing repository contents as resources.
///
/// Resources created by a sync carry an owner reference back to it, which
/// shields them from direct API mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSync {
    /// Common resource metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<ResourceSyncSpec>,
    /// Observed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceSyncStatus>,
}

/// Desired state of a resource sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSyncSpec {
    /// Name of the repository to sync from.
    pub repository: String,
    /// Path within the repository.
    pub path: String,
    /// Revision to track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_revision: Option<String>,
}

/// Observed state of a resource sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSyncStatus {
    /// Conditions reported for the sync.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Commit hash most recently applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_commit: Option<String>,
}

/// A page of resource syncs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSyncList {
    /// Resource syncs in this page.
    pub items: Vec<ResourceSync>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
