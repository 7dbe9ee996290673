//! Event resource types.
//!
//! Events are append-only audit records; they have no desired state and are
//! never updated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meta::{ListMeta, ObjectMeta};

/// A record of something happening to a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Common resource metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Machine-readable reason, e.g. `ResourceCreated`.
    pub reason: String,
    /// `Normal` or `Warning`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Human-readable description.
    pub message: String,
    /// The resource this event is about.
    pub involved_object: ObjectReference,
    /// When the event occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Reference to the resource an event concerns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// Kind of the referenced resource.
    pub kind: String,
    /// Name of the referenced resource.
    pub name: String,
}

/// A page of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    /// Events in this page.
    pub items: Vec<Event>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
