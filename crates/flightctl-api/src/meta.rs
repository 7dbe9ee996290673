//! Metadata types shared by every API resource.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata common to all API resources.
///
/// `resource_version` is carried as an opaque string on the wire; the store
/// parses it into its numeric optimistic-concurrency token at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name, unique within an organization and kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Owner reference (`<Kind>/<name>`) when this resource is managed by
    /// another resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Counter incremented only when the spec changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,

    /// Optimistic-concurrency token incremented on every successful write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    /// Free-form labels used for selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    /// Free-form annotations; wiped on API-originated writes unless
    /// explicitly supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    /// When the resource was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Metadata carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Pagination metadata carried by list responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// Opaque continuation token resuming the listing after the last
    /// returned item.
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_token: Option<String>,

    /// Estimated number of items remaining after this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_item_count: Option<i64>,
}

/// A condition reported in a resource status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, e.g. `Ready`.
    #[serde(rename = "type")]
    pub condition_type: String,
    /// `True`, `False` or `Unknown`.
    pub status: String,
    /// Machine-readable reason for the last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the condition last changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Structured outcome body returned for errors and rejections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    /// `Success` or `Failure`.
    pub status: String,
    /// Human-readable description of the outcome.
    pub message: String,
}

impl ApiStatus {
    /// A failure outcome with the given message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "Failure".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_meta_omits_empty_fields() {
        let meta = ObjectMeta::named("dev-1");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({"name": "dev-1"}));
    }

    #[test]
    fn list_meta_serializes_continue_keyword() {
        let meta = ListMeta {
            continue_token: Some("abc".to_string()),
            remaining_item_count: Some(7),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["continue"], "abc");
        assert_eq!(json["remainingItemCount"], 7);
    }
}
