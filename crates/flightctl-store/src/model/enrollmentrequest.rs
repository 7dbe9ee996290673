//! Enrollment request storage model.

use flightctl_api::{
    EnrollmentRequest, EnrollmentRequestList, EnrollmentRequestSpec, EnrollmentRequestStatus,
    ListMeta,
};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `enrollment_requests` table.
pub enum EnrollmentRequestKind {}

impl KindDef for EnrollmentRequestKind {
    const KIND: Kind = Kind::EnrollmentRequest;
    const TABLE: &'static str = "enrollment_requests";
    type Spec = EnrollmentRequestSpec;
    type Status = EnrollmentRequestStatus;
}

/// A stored enrollment request row.
pub type EnrollmentRequestRecord = Record<EnrollmentRequestKind>;

/// Convert an API enrollment request into its storage record.
pub fn from_api(resource: &EnrollmentRequest) -> Result<EnrollmentRequestRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API enrollment request.
pub fn to_api(record: EnrollmentRequestRecord) -> Result<EnrollmentRequest> {
    Ok(EnrollmentRequest {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<EnrollmentRequestRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<EnrollmentRequestList> {
    Ok(EnrollmentRequestList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
