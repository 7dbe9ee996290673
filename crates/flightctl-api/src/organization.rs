//! Organization resource types.
//!
//! Organizations partition every other resource; they are global rather
//! than org-scoped themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::meta::ListMeta;

/// A tenant organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Stable unique identifier; every other resource is scoped by it.
    pub id: Uuid,
    /// Short machine name.
    pub name: String,
    /// Human-readable display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// When the organization was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A page of organizations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationList {
    /// Organizations in this page.
    pub items: Vec<Organization>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
