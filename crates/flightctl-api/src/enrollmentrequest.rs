//! Enrollment request resource types.

use serde::{Deserialize, Serialize};

use crate::meta::{Condition, ListMeta, ObjectMeta};

/// A device's request to join the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// Common resource metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<EnrollmentRequestSpec>,
    /// Observed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnrollmentRequestStatus>,
}

/// Desired state of an enrollment request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequestSpec {
    /// PEM-encoded certificate signing request presented by the device.
    pub csr: String,
}

/// Observed state of an enrollment request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequestStatus {
    /// Conditions reported for the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Signed certificate, present once approved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

/// A page of enrollment requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRequestList {
    /// Enrollment requests in this page.
    pub items: Vec<EnrollmentRequest>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
